use std::path::Path;

use anyhow::Result;
use case_digest::constants::{truncate_safe, DETAIL_PREVIEW_CHARS};
use case_digest::time_utils;

use super::{load_export, require_ticket};

/// `tickets <export>` — one line per ticket.
pub fn list(export: &Path) -> Result<()> {
    let extraction = load_export(export)?;

    if extraction.tickets.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }

    println!(
        "{:<10}  {:<40}  {:<16}  {}",
        "ID", "TITLE", "OPENED", "CLOSED"
    );
    println!("{}", "-".repeat(88));

    for t in &extraction.tickets {
        let title = if t.title.chars().count() > 39 {
            format!("{}...", truncate_safe(&t.title, 36))
        } else {
            t.title.clone()
        };
        let closed = t
            .closed
            .as_ref()
            .map(time_utils::to_display)
            .unwrap_or_else(|| "Open".to_string());

        println!(
            "{:<10}  {:<40}  {:<16}  {}",
            t.id,
            title,
            time_utils::to_display(&t.opened),
            closed,
        );
    }

    println!("\nTotal: {} tickets", extraction.tickets.len());
    Ok(())
}

/// `show <export> <ticket>` — ticket fields as JSON, detail truncated.
pub fn show(export: &Path, ticket_id: &str) -> Result<()> {
    let extraction = load_export(export)?;
    let t = require_ticket(&extraction, ticket_id)?;

    let view = serde_json::json!({
        "id": t.id,
        "title": t.title,
        "area": t.area,
        "opened": time_utils::to_display(&t.opened),
        "closed": t.closed.as_ref().map(time_utils::to_display),
        "priority": t.priority,
        "type": t.ticket_type,
        "importance": t.importance,
        "linked_to": t.linked_to,
        "detail_preview": truncate_safe(&t.detail_text, DETAIL_PREVIEW_CHARS),
        "detail_chars": t.detail_text.chars().count(),
    });

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
