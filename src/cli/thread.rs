use std::path::Path;

use anyhow::Result;
use case_digest::config::DigestConfig;
use case_digest::processing::{pipeline, reconstructor};
use case_digest::time_utils;

use super::{load_export, require_ticket};

/// `thread <export> <ticket>` — timeline entries, then the merged messages.
pub fn run(export: &Path, ticket_id: &str, config: &DigestConfig) -> Result<()> {
    let extraction = load_export(export)?;
    let ticket = require_ticket(&extraction, ticket_id)?;
    let (entries, messages) = pipeline::thread_for(ticket, config);

    println!("Ticket {}: {}", ticket.id, ticket.title);
    println!("\nTimeline ({} entries)", entries.len());
    println!("{}", "-".repeat(60));
    for e in &entries {
        println!(
            "{}  {:<9} {}",
            time_utils::to_display(&e.timestamp),
            e.action.as_str(),
            e.actor
        );
    }

    if messages.is_empty() {
        println!("\nNo messages.");
        return Ok(());
    }

    println!("\nThread ({} messages)", messages.len());
    println!("{}", "-".repeat(60));
    print!("{}", reconstructor::render_thread(&messages));
    if let Some(range) = reconstructor::date_range(&messages) {
        println!("\nRange: {}", range);
    }
    Ok(())
}
