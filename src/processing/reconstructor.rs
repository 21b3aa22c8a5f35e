//! Thread reconstruction — timeline entries to direction-aware messages.
//!
//! Consecutive entries from the same side merge into one message; a direction
//! change starts a new one. Entries are taken in document order, never re-sorted.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::config::ParticipantsConfig;
use crate::thread::{Direction, Message};
use crate::ticket::TimelineEntry;
use crate::time_utils;

static ROUTING_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+to\s+.+$").expect("static routing suffix pattern"));

/// Strip a trailing `to <other party>` routing annotation from an actor.
pub fn normalize_actor(actor: &str) -> String {
    ROUTING_SUFFIX.replace(actor.trim(), "").into_owned()
}

/// Known actor names on each side of the conversation.
#[derive(Debug, Clone)]
pub struct ParticipantDirectory {
    customer: HashSet<String>,
    support: HashSet<String>,
    customer_label: String,
    support_label: String,
}

impl ParticipantDirectory {
    pub fn new<I, J>(customer: I, support: J) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        let defaults = ParticipantsConfig::default();
        Self {
            customer: customer.into_iter().map(Into::into).collect(),
            support: support.into_iter().map(Into::into).collect(),
            customer_label: defaults.customer_label,
            support_label: defaults.support_label,
        }
    }

    pub fn from_config(cfg: &ParticipantsConfig) -> Self {
        Self {
            customer: cfg.customer.iter().cloned().collect(),
            support: cfg.support.iter().cloned().collect(),
            customer_label: cfg.customer_label.clone(),
            support_label: cfg.support_label.clone(),
        }
    }

    /// Customer-side names are incoming; support-side and unknown names are outgoing.
    pub fn classify(&self, actor: &str) -> Direction {
        let name = normalize_actor(actor);
        if self.customer.contains(&name) {
            Direction::Incoming
        } else if self.support.contains(&name) {
            Direction::Outgoing
        } else {
            tracing::trace!(actor = %name, "Unknown actor, treated as support note");
            Direction::Outgoing
        }
    }

    /// `(from, to)` addressing for a message in the given direction.
    fn addressing(&self, direction: Direction, actor: &str) -> (String, String) {
        match direction {
            Direction::Incoming => (actor.to_string(), self.support_label.clone()),
            Direction::Outgoing => (self.support_label.clone(), self.customer_label.clone()),
        }
    }
}

impl Default for ParticipantDirectory {
    fn default() -> Self {
        Self::from_config(&ParticipantsConfig::default())
    }
}

/// Message run being accumulated.
struct Run<'e> {
    direction: Direction,
    first: &'e TimelineEntry,
    lines: Vec<String>,
}

/// Merge timeline entries into conversation messages.
///
/// Pure: the same entries and directory always give the same messages.
pub fn reconstruct(
    ticket_id: &str,
    entries: &[TimelineEntry],
    directory: &ParticipantDirectory,
) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut current: Option<Run<'_>> = None;

    for entry in entries {
        let direction = directory.classify(&entry.actor);

        let continues = matches!(&current, Some(run) if run.direction == direction);
        if !continues {
            if let Some(run) = current.take() {
                messages.push(finish(ticket_id, run, directory));
            }
            current = Some(Run {
                direction,
                first: entry,
                lines: Vec::new(),
            });
        }

        if let Some(run) = current.as_mut() {
            run.lines.push(entry.tagged_line());
        }
    }

    if let Some(run) = current {
        messages.push(finish(ticket_id, run, directory));
    }

    messages
}

fn finish(ticket_id: &str, run: Run<'_>, directory: &ParticipantDirectory) -> Message {
    let actor = run.first.actor.clone();
    let (from, to) = directory.addressing(run.direction, &normalize_actor(&actor));
    Message {
        id: message_id(ticket_id, &run.first.timestamp, &actor),
        direction: run.direction,
        timestamp: run.first.timestamp,
        actor,
        from,
        to,
        body: run.lines.join("\n"),
    }
}

/// `{ticket}_{iso timestamp}_{actor with underscores}`
pub fn message_id(ticket_id: &str, timestamp: &NaiveDateTime, actor: &str) -> String {
    format!(
        "{}_{}_{}",
        ticket_id,
        timestamp.format("%Y-%m-%dT%H:%M:%S"),
        normalize_actor(actor).replace(' ', "_")
    )
}

/// Render messages as the plain-text thread handed to the model.
pub fn render_thread(messages: &[Message]) -> String {
    let mut parts = Vec::with_capacity(messages.len() * 3);
    for msg in messages {
        parts.push(format!(
            "{} {} {}",
            msg.direction.label(),
            time_utils::to_display(&msg.timestamp),
            normalize_actor(&msg.actor)
        ));
        parts.push(msg.body.clone());
        parts.push(String::new());
    }
    parts.join("\n")
}

/// `YYYY-MM-DD - YYYY-MM-DD` from the first to the last message.
pub fn date_range(messages: &[Message]) -> Option<String> {
    let first = messages.first()?;
    let last = messages.last()?;
    Some(format!(
        "{} - {}",
        first.timestamp.format("%Y-%m-%d"),
        last.timestamp.format("%Y-%m-%d")
    ))
}
