use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use case_digest::config::DigestConfig;
use case_digest::processing::llm_client::{GeminiModel, SummarizationClient};
use case_digest::ticket::Ticket;
use case_digest::{BatchReport, CaseDigester};

use super::{load_export, require_ticket};

pub struct SummarizeOptions {
    pub ticket: Option<String>,
    pub limit: Option<usize>,
    pub output: Option<PathBuf>,
    pub offline: bool,
}

/// `summarize <export>` — run the pipeline and report counts.
pub fn run(export: &Path, opts: &SummarizeOptions, config: DigestConfig) -> Result<()> {
    let extraction = load_export(export)?;

    let tickets: Vec<Ticket> = match &opts.ticket {
        Some(id) => vec![require_ticket(&extraction, id)?.clone()],
        None => extraction.tickets.clone(),
    };

    let report = if opts.offline {
        CaseDigester::<GeminiModel>::offline(config).process_all(&tickets, opts.limit)
    } else {
        let model = GeminiModel::from_config(&config.summarizer)
            .context("Summarization model unavailable (use --offline to skip it)")?;
        let client = SummarizationClient::new(model, &config.summarizer);
        println!("Model: {}", client.model_name());
        CaseDigester::new(config, client).process_all(&tickets, opts.limit)
    };

    print_report(&report);

    if let Some(path) = &opts.output {
        write_report(&report, path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    for r in &report.records {
        println!(
            "{:<14}  {:<10}  {:<10}  {} messages  {}",
            r.case_number,
            r.outcome_label.as_str(),
            r.mode.as_str(),
            r.message_count,
            r.date_range,
        );
    }
    println!(
        "\nTotal: {}  Success: {}  Failed: {}  Skipped: {}",
        report.total, report.success, report.failed, report.skipped
    );
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
