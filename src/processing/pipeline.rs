//! Case pipeline — one ticket in, one `CaseRecord` out.
//!
//! timeline → messages → thread text → model call → parsed summary, with a
//! non-generative fallback when the model is unavailable or disabled.
//! Batches isolate per-ticket failures and never abort.

use serde::Serialize;
use serde_json::{Map, Value};

use super::llm_client::{GeminiModel, GenerativeModel, SummarizationClient};
use super::prompt::SummaryRequest;
use super::{reconstructor, summary_parser, timeline};
use crate::config::DigestConfig;
use crate::constants::DETAIL_PREVIEW_CHARS;
use crate::summary::{CaseRecord, OutcomeLabel, StructuredSummary, SummaryMode};
use crate::thread::Message;
use crate::ticket::{Ticket, TimelineEntry};
use crate::time_utils;
use crate::{DigestError, DigestResult};

/// Counted outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<CaseRecord>,
}

pub struct CaseDigester<M: GenerativeModel = GeminiModel> {
    config: DigestConfig,
    directory: reconstructor::ParticipantDirectory,
    client: Option<SummarizationClient<M>>,
}

impl<M: GenerativeModel> CaseDigester<M> {
    pub fn new(config: DigestConfig, client: SummarizationClient<M>) -> Self {
        let directory = reconstructor::ParticipantDirectory::from_config(&config.participants);
        Self {
            config,
            directory,
            client: Some(client),
        }
    }

    /// No model calls: every record gets the fallback summary.
    pub fn offline(config: DigestConfig) -> Self {
        let directory = reconstructor::ParticipantDirectory::from_config(&config.participants);
        Self {
            config,
            directory,
            client: None,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    pub fn case_number(&self, ticket_id: &str) -> String {
        format!("{}{}", self.config.batch.case_prefix, ticket_id)
    }

    /// Summarize one ticket into an output record.
    pub fn process_ticket(&mut self, ticket: &Ticket) -> DigestResult<CaseRecord> {
        let entries = timeline::extract_timeline(ticket);
        if entries.is_empty() {
            return Err(DigestError::NoTimelineEntries(ticket.id.clone()));
        }

        let messages = reconstructor::reconstruct(&ticket.id, &entries, &self.directory);
        if messages.is_empty() {
            return Err(DigestError::NoMessages(ticket.id.clone()));
        }

        let thread_text = reconstructor::render_thread(&messages);
        let date_range = reconstructor::date_range(&messages).unwrap_or_default();
        let case_number = self.case_number(&ticket.id);

        let generated = match self.client.as_mut() {
            Some(client) => {
                let request = SummaryRequest {
                    ticket_id: ticket.id.clone(),
                    area: ticket.area.clone(),
                    priority: ticket.priority.clone(),
                    importance: ticket.importance.clone(),
                    thread_text,
                    message_count: messages.len(),
                    date_range: date_range.clone(),
                    keywords: String::new(),
                };
                match client.summarize(&request) {
                    Ok(raw) => Some(summary_parser::parse_response(&raw.text)),
                    Err(DigestError::ExternalServiceFatal(failure)) if self.config.batch.fallback_on_fatal => {
                        tracing::warn!(
                            ticket = %ticket.id,
                            error = %failure,
                            "Model call failed, using fallback summary"
                        );
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        let (summary, summary_text, outcome_label, mode) = match generated {
            Some(summary) => {
                tracing::debug!(
                    ticket = %ticket.id,
                    category = summary.category().unwrap_or("-"),
                    confidence = ?summary.confidence(),
                    keywords = ?summary.keywords(),
                    error_codes = ?summary.error_code_list(),
                    "Summary metadata"
                );
                let text = summary_parser::build_summary_text(&case_number, &summary);
                let label = summary_parser::derive_outcome(&summary);
                (summary, text, label, SummaryMode::Generative)
            }
            None => {
                let text = build_fallback_summary(&case_number, ticket);
                let label = fallback_outcome(ticket, &entries);
                (StructuredSummary::default(), text, label, SummaryMode::Fallback)
            }
        };

        let metadata = self.enrich_metadata(summary.metadata.clone(), ticket);

        Ok(CaseRecord {
            case_number,
            summary_text,
            symptoms: summary.symptoms,
            environment: summary.environment,
            error_codes: summary.error_codes,
            customer_ask: summary.customer_ask,
            our_actions: summary.our_actions,
            outcome: summary.outcome,
            next_step: summary.next_step,
            metadata,
            outcome_label,
            mode,
            message_count: messages.len(),
            date_range,
            created_at: time_utils::now(),
        })
    }

    fn enrich_metadata(&self, mut metadata: Map<String, Value>, ticket: &Ticket) -> Map<String, Value> {
        metadata.insert("source".into(), Value::String(self.config.batch.source_tag.clone()));
        metadata.insert("area".into(), Value::String(ticket.area.clone()));
        metadata.insert("priority".into(), Value::String(ticket.priority.clone()));
        metadata.insert("importance".into(), Value::String(ticket.importance.clone()));
        metadata.insert("ticket_id".into(), Value::String(ticket.id.clone()));
        metadata
    }

    /// Process tickets in order, up to `limit` (0 means no limit).
    /// Failures are counted, never raised.
    pub fn process_all(&mut self, tickets: &[Ticket], limit: Option<usize>) -> BatchReport {
        let limit = limit.filter(|&n| n > 0).unwrap_or(tickets.len());
        let selected = &tickets[..limit.min(tickets.len())];
        let mut report = BatchReport {
            total: selected.len(),
            ..Default::default()
        };

        tracing::info!(total = report.total, offline = self.is_offline(), "Batch started");

        for (i, ticket) in selected.iter().enumerate() {
            let case = self.case_number(&ticket.id);
            match self.process_ticket(ticket) {
                Ok(record) => {
                    tracing::info!(
                        case = %case,
                        status = "success",
                        mode = record.mode.as_str(),
                        outcome = %record.outcome_label,
                        index = i + 1,
                        total = report.total,
                        "Case summarized"
                    );
                    report.success += 1;
                    report.records.push(record);
                }
                Err(e) if e.is_skippable() => {
                    tracing::info!(case = %case, status = "skipped", reason = %e, "Case skipped");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(case = %case, status = "failed", error = %e, "Case failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            skipped = report.skipped,
            "Batch finished"
        );
        report
    }
}

/// Summary text built from ticket fields alone.
pub fn build_fallback_summary(case_number: &str, ticket: &Ticket) -> String {
    let closed = ticket
        .closed
        .as_ref()
        .map(time_utils::to_display)
        .unwrap_or_else(|| "Open".to_string());
    let preview = crate::constants::truncate_safe(&ticket.detail_text, DETAIL_PREVIEW_CHARS);

    format!(
        "## AI Summary\n\n### Case: {case}\n\n\
         ## Title\n{title}\n\n\
         ## Details\n\
         - Area: {area}\n\
         - Type: {kind}\n\
         - Priority: {priority}\n\
         - Importance: {importance}\n\
         - Opened: {opened}\n\
         - Closed: {closed}\n\n\
         ## Detail\n{preview}\n",
        case = case_number,
        title = ticket.title,
        area = ticket.area,
        kind = ticket.ticket_type,
        priority = ticket.priority,
        importance = ticket.importance,
        opened = time_utils::to_display(&ticket.opened),
        closed = closed,
        preview = preview,
    )
}

/// Closed ticket or a terminal timeline action means resolved; anything else is still open.
pub fn fallback_outcome(ticket: &Ticket, entries: &[TimelineEntry]) -> OutcomeLabel {
    if ticket.is_closed() || entries.iter().any(|e| e.action.is_terminal()) {
        OutcomeLabel::Resolved
    } else {
        OutcomeLabel::Open
    }
}

/// Thread text for a ticket, without calling the model.
pub fn thread_for(ticket: &Ticket, config: &DigestConfig) -> (Vec<TimelineEntry>, Vec<Message>) {
    let directory = reconstructor::ParticipantDirectory::from_config(&config.participants);
    let entries = timeline::extract_timeline(ticket);
    let messages = reconstructor::reconstruct(&ticket.id, &entries, &directory);
    (entries, messages)
}
