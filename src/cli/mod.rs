pub mod config;
pub mod summarize;
pub mod thread;
pub mod tickets;

use std::path::Path;

use anyhow::{Context, Result};
use case_digest::processing::extractor::{self, Extraction};
use case_digest::ticket::Ticket;

/// Read an export, reporting rejected rows on stderr.
pub fn load_export(path: &Path) -> Result<Extraction> {
    let extraction = extractor::extract_file(path)
        .with_context(|| format!("Failed to extract tickets from {}", path.display()))?;

    for row in &extraction.rejected {
        eprintln!(
            "Skipped row {} (ticket {}): {}",
            row.index, row.ticket_id, row.reason
        );
    }
    Ok(extraction)
}

/// Look up a ticket or fail with a readable message.
pub fn require_ticket<'a>(extraction: &'a Extraction, ticket_id: &str) -> Result<&'a Ticket> {
    extraction
        .find(ticket_id)
        .with_context(|| format!("Ticket not found: {}", ticket_id))
}
