use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The seven fixed summary sections, in canonical order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Symptoms,
    Environment,
    ErrorCodes,
    CustomerAsk,
    OurActions,
    Outcome,
    NextStep,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Self::Symptoms,
        Self::Environment,
        Self::ErrorCodes,
        Self::CustomerAsk,
        Self::OurActions,
        Self::Outcome,
        Self::NextStep,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Symptoms => "symptoms",
            Self::Environment => "environment",
            Self::ErrorCodes => "error_codes",
            Self::CustomerAsk => "customer_ask",
            Self::OurActions => "our_actions",
            Self::Outcome => "outcome",
            Self::NextStep => "next_step",
        }
    }

    /// Normalized heading written into the canonical summary text.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Symptoms => "Symptoms",
            Self::Environment => "Environment",
            Self::ErrorCodes => "Error Codes",
            Self::CustomerAsk => "Customer Ask",
            Self::OurActions => "Our Actions",
            Self::Outcome => "Outcome",
            Self::NextStep => "Next Step",
        }
    }
}

/// Case outcome, as judged by the model or derived from the ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeLabel {
    Resolved,
    Unresolved,
    Open,
    Unknown,
}

impl OutcomeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "RESOLVED",
            Self::Unresolved => "UNRESOLVED",
            Self::Open => "OPEN",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse the model's RESOLVED/UNRESOLVED verdict (case-insensitive).
    pub fn from_verdict(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESOLVED" => Some(Self::Resolved),
            "UNRESOLVED" => Some(Self::Unresolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed model response: seven optional sections plus free-form metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructuredSummary {
    pub symptoms: Option<String>,
    pub environment: Option<String>,
    pub error_codes: Option<String>,
    pub customer_ask: Option<String>,
    pub our_actions: Option<String>,
    pub outcome: Option<String>,
    pub next_step: Option<String>,
    pub metadata: Map<String, Value>,
}

impl StructuredSummary {
    pub fn section(&self, section: Section) -> Option<&str> {
        match section {
            Section::Symptoms => self.symptoms.as_deref(),
            Section::Environment => self.environment.as_deref(),
            Section::ErrorCodes => self.error_codes.as_deref(),
            Section::CustomerAsk => self.customer_ask.as_deref(),
            Section::OurActions => self.our_actions.as_deref(),
            Section::Outcome => self.outcome.as_deref(),
            Section::NextStep => self.next_step.as_deref(),
        }
    }

    pub(crate) fn set_section(&mut self, section: Section, value: Option<String>) {
        let slot = match section {
            Section::Symptoms => &mut self.symptoms,
            Section::Environment => &mut self.environment,
            Section::ErrorCodes => &mut self.error_codes,
            Section::CustomerAsk => &mut self.customer_ask,
            Section::OurActions => &mut self.our_actions,
            Section::Outcome => &mut self.outcome,
            Section::NextStep => &mut self.next_step,
        };
        *slot = value;
    }

    pub fn present_sections(&self) -> usize {
        Section::ALL.iter().filter(|s| self.section(**s).is_some()).count()
    }

    // Typed views over the well-known metadata keys.

    pub fn category(&self) -> Option<&str> {
        self.metadata.get("category").and_then(Value::as_str)
    }

    pub fn resolved(&self) -> Option<bool> {
        self.metadata.get("resolved").and_then(Value::as_bool)
    }

    pub fn from_manager(&self) -> Option<OutcomeLabel> {
        self.metadata
            .get("from_manager")
            .and_then(Value::as_str)
            .and_then(OutcomeLabel::from_verdict)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.metadata
            .get("from_manager_confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0))
    }

    pub fn keywords(&self) -> Vec<String> {
        string_list(self.metadata.get("keywords"))
    }

    pub fn error_code_list(&self) -> Vec<String> {
        string_list(self.metadata.get("error_codes"))
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// How the summary text of a record was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Generative,
    Fallback,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generative => "generative",
            Self::Fallback => "fallback",
        }
    }
}

/// Output record handed to the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_number: String,
    pub summary_text: String,
    pub symptoms: Option<String>,
    pub environment: Option<String>,
    pub error_codes: Option<String>,
    pub customer_ask: Option<String>,
    pub our_actions: Option<String>,
    pub outcome: Option<String>,
    pub next_step: Option<String>,
    pub metadata: Map<String, Value>,
    pub outcome_label: OutcomeLabel,
    pub mode: SummaryMode,
    pub message_count: usize,
    pub date_range: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_order_and_keys() {
        let keys: Vec<&str> = Section::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            ["symptoms", "environment", "error_codes", "customer_ask", "our_actions", "outcome", "next_step"]
        );
    }

    #[test]
    fn test_metadata_views() {
        let mut summary = StructuredSummary::default();
        let json = json!({
            "category": "Bug",
            "resolved": true,
            "from_manager": "unresolved",
            "from_manager_confidence": 1.7,
            "keywords": ["Teams", 3, "size limit"],
        });
        summary.metadata = json.as_object().unwrap().clone();

        assert_eq!(summary.category(), Some("Bug"));
        assert_eq!(summary.resolved(), Some(true));
        assert_eq!(summary.from_manager(), Some(OutcomeLabel::Unresolved));
        assert_eq!(summary.confidence(), Some(1.0));
        assert_eq!(summary.keywords(), vec!["Teams".to_string(), "size limit".to_string()]);
        assert!(summary.error_code_list().is_empty());
    }

    #[test]
    fn test_set_and_count_sections() {
        let mut summary = StructuredSummary::default();
        summary.set_section(Section::NextStep, Some("Done".into()));
        summary.set_section(Section::Symptoms, Some("Crash".into()));
        assert_eq!(summary.present_sections(), 2);
        assert_eq!(summary.section(Section::NextStep), Some("Done"));
        assert_eq!(summary.section(Section::Outcome), None);
    }
}
