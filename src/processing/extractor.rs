//! Extraction — export table to `Ticket` records.
//!
//! The export holds one data table. Each body row carries at least 10 cells in
//! fixed order: id, title, area, opened, closed, priority, type, importance,
//! linked-to, detail markup. Structural problems fail the whole document; a bad
//! timestamp only rejects its row.

use std::path::Path;

use scraper::ElementRef;
use serde::Serialize;

use super::{cleaner, markup};
use crate::constants::MIN_ROW_CELLS;
use crate::ticket::Ticket;
use crate::time_utils::parse_export_timestamp;
use crate::{DigestError, DigestResult};

/// A body row that could not become a ticket.
#[derive(Debug, Serialize)]
pub struct RejectedRow {
    /// Zero-based index among the body rows.
    pub index: usize,
    pub ticket_id: String,
    pub reason: String,
}

/// Result of reading one export document.
#[derive(Debug, Default)]
pub struct Extraction {
    pub tickets: Vec<Ticket>,
    pub rejected: Vec<RejectedRow>,
}

impl Extraction {
    pub fn find(&self, ticket_id: &str) -> Option<&Ticket> {
        find_ticket(&self.tickets, ticket_id)
    }
}

pub fn find_ticket<'a>(tickets: &'a [Ticket], ticket_id: &str) -> Option<&'a Ticket> {
    let wanted = ticket_id.trim();
    tickets.iter().find(|t| t.id == wanted)
}

/// Read and extract an export file.
pub fn extract_file(path: &Path) -> DigestResult<Extraction> {
    let html = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "Export loaded");
    extract_tickets(&html)
}

/// Extract every ticket from an export document.
pub fn extract_tickets(html: &str) -> DigestResult<Extraction> {
    let document = markup::parse_document(html);
    let table = markup::find_first(document.root_element(), "table")
        .ok_or_else(|| DigestError::MalformedDocument("No table found in document".into()))?;
    let tbody = markup::child_elements(table, "tbody")
        .next()
        .ok_or_else(|| DigestError::MalformedDocument("No body found in table".into()))?;

    let mut extraction = Extraction::default();

    for (index, row) in markup::child_elements(tbody, "tr").enumerate() {
        let cells: Vec<ElementRef<'_>> = markup::child_elements(row, "td").collect();

        // Header rows are made of <th> only
        if cells.is_empty() && markup::child_elements(row, "th").next().is_some() {
            tracing::debug!(row = index, "Skipping header row");
            continue;
        }

        if cells.len() < MIN_ROW_CELLS {
            return Err(DigestError::MalformedDocument(format!(
                "Unexpected row structure at row {}: {} cells found, {} required",
                index,
                cells.len(),
                MIN_ROW_CELLS
            )));
        }

        match parse_row(&cells) {
            Ok(ticket) => extraction.tickets.push(ticket),
            Err(e) => {
                let ticket_id = markup::stripped_text(cells[0]);
                tracing::warn!(row = index, ticket = %ticket_id, error = %e, "Row rejected");
                extraction.rejected.push(RejectedRow {
                    index,
                    ticket_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        tickets = extraction.tickets.len(),
        rejected = extraction.rejected.len(),
        "Export extracted"
    );
    Ok(extraction)
}

/// Build a ticket from the ordered cells of one row.
fn parse_row(cells: &[ElementRef<'_>]) -> DigestResult<Ticket> {
    let text = |i: usize| markup::stripped_text(cells[i]);

    let opened = parse_export_timestamp(&text(3))?;
    let closed_raw = text(4);
    let closed = if closed_raw.is_empty() {
        None
    } else {
        Some(parse_export_timestamp(&closed_raw)?)
    };

    let detail_markup = cells[9].inner_html();
    let detail_text = cleaner::clean_detail_markup(&detail_markup);

    Ok(Ticket {
        id: text(0),
        title: text(1),
        area: text(2),
        opened,
        closed,
        priority: text(5),
        ticket_type: text(6),
        importance: text(7),
        linked_to: text(8),
        detail_markup,
        detail_text,
    })
}
