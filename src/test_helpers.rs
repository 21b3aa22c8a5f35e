//! Shared test utilities — entry builder, export fixtures, scripted model.
//!
//! Available only under `#[cfg(test)]`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::processing::llm_client::{CallFailure, GenerativeModel};
use crate::ticket::{ActionKind, TimelineEntry};
use crate::time_utils::parse_export_timestamp;

// ============================================================================
// EntryBuilder
// ============================================================================

pub struct EntryBuilder {
    date: String,
    time: String,
    action: ActionKind,
    actor: String,
    content: String,
}

impl EntryBuilder {
    /// Entry at `time` (HH:MM) on 2025/01/07 unless `on` says otherwise.
    pub fn new(time: &str, action: ActionKind, actor: &str) -> Self {
        Self {
            date: "2025/01/07".to_string(),
            time: time.to_string(),
            action,
            actor: actor.to_string(),
            content: String::new(),
        }
    }

    pub fn on(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn content(mut self, c: &str) -> Self {
        self.content = c.to_string();
        self
    }

    pub fn build(self) -> TimelineEntry {
        TimelineEntry {
            timestamp: parse_export_timestamp(&format!("{} {}", self.date, self.time)).unwrap(),
            action: self.action,
            actor: self.actor,
            content: self.content,
        }
    }
}

// ============================================================================
// Export fixtures
// ============================================================================

/// Detail cell with four chronological actions across both sides.
pub const SAMPLE_DETAIL: &str = "\
<b>2025/01/07 17:45 OPENED by Megumi Hashimoto</b><br>\
Messages over 28KB fail to send to Teams.<br>\
<b>2025/01/07 18:02 ASSIGNED by CData Japan Support</b><br>\
<b>2025/01/08 10:15 EDITED by CData Japan Support to Megumi Hashimoto</b><br>\
This is a Teams service limit.\
<pre>ERR-413 Payload Too Large</pre>\
<b>2025/01/08 14:44 RESOLVED by Megumi Hashimoto</b><br>\
Understood, please close.";

/// One export row; only id, dates and detail vary.
pub fn export_row(id: &str, opened: &str, closed: &str, detail: &str) -> String {
    format!(
        "<tr><td>{id}</td><td>Teams message size limit</td><td>Drivers/Teams</td>\
         <td>{opened}</td><td>{closed}</td><td>Middle</td><td>Defect</td><td>High</td>\
         <td>850001</td><td>{detail}</td></tr>"
    )
}

pub fn export_document(rows: &[String]) -> String {
    format!(
        "<html><head><title>Ticket export</title></head><body>\
         <table><tbody>{}</tbody></table></body></html>",
        rows.concat()
    )
}

// ============================================================================
// ScriptedModel
// ============================================================================

/// Model that replays a fixed script of outcomes and records its prompts.
pub struct ScriptedModel {
    script: RefCell<VecDeque<Result<String, CallFailure>>>,
    prompts: RefCell<Vec<String>>,
    calls: Cell<usize>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<String, CallFailure>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            prompts: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String, CallFailure> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(CallFailure::fatal("script exhausted")))
    }
}
