//! Summary parser — tolerant extraction of the seven summary sections and the
//! trailing JSON metadata block from a model response.
//!
//! Missing sections are absent, never errors. Broken metadata degrades to an
//! empty map.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::summary::{OutcomeLabel, Section, StructuredSummary};
use crate::{DigestError, DigestResult};

/// `(section, English heading pattern, Japanese heading)`
const HEADINGS: [(Section, &str, &str); 7] = [
    (Section::Symptoms, r"symptoms?", "現象"),
    (Section::Environment, r"environment", "環境"),
    (Section::ErrorCodes, r"error\s+codes?", "エラーコード"),
    (Section::CustomerAsk, r"customer\s+ask", "顧客要望"),
    (Section::OurActions, r"our\s+actions?", "対応内容"),
    (Section::Outcome, r"outcome", "結果"),
    (Section::NextStep, r"next\s+steps?", "次のステップ"),
];

static HEADING_PATTERNS: LazyLock<Vec<(Section, Regex)>> = LazyLock::new(|| {
    HEADINGS
        .iter()
        .map(|(section, en, ja)| {
            let ja = regex::escape(ja);
            let pattern = format!(
                r"(?im)^[ \t]*#{{2,}}[ \t]*(?:{en}(?:[ \t]*[（(]?[ \t]*{ja}[ \t]*[）)]?)?|{ja})[ \t]*$"
            );
            (*section, Regex::new(&pattern).expect("static section heading pattern"))
        })
        .collect()
});

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json[ \t]*\n(.*?)```").expect("static json fence pattern"));

static VERDICT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)FromManager:\s*\**\s*(RESOLVED|UNRESOLVED)").expect("static verdict pattern")
});

/// Parse a raw model response. CRLF line endings are accepted.
pub fn parse_response(text: &str) -> StructuredSummary {
    let text = text.replace("\r\n", "\n");
    let mut summary = StructuredSummary::default();

    for (section, heading) in HEADING_PATTERNS.iter() {
        let body = section_body(&text, heading);
        if body.is_none() {
            tracing::trace!(section = section.key(), "Section absent from response");
        }
        summary.set_section(*section, body);
    }

    summary.metadata = match parse_metadata_block(&text) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "Summary metadata unavailable, using empty map");
            Map::new()
        }
    };

    tracing::debug!(
        sections = summary.present_sections(),
        metadata_keys = summary.metadata.len(),
        "Summary parsed"
    );
    summary
}

/// Body under the first matching heading, up to the next heading, rule or fence.
fn section_body(text: &str, heading: &Regex) -> Option<String> {
    let found = heading.find(text)?;
    let rest = &text[found.end()..];

    let mut body = Vec::new();
    for line in rest.lines() {
        let lead = line.trim_start();
        if lead.starts_with("##") || lead.starts_with("---") || lead.starts_with("```") {
            break;
        }
        body.push(line);
    }

    let body = body.join("\n");
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

/// Decode the last ```json fenced block into a JSON object.
pub fn parse_metadata_block(text: &str) -> DigestResult<Map<String, Value>> {
    let raw = JSON_FENCE
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| DigestError::MetadataParse("no ```json block in response".into()))?;

    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DigestError::MetadataParse(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(DigestError::MetadataParse(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome from the metadata verdict, else the outcome section's marker,
/// else the `resolved` flag.
pub fn derive_outcome(summary: &StructuredSummary) -> OutcomeLabel {
    if let Some(label) = summary.from_manager() {
        return label;
    }
    let marker = summary
        .outcome
        .as_deref()
        .and_then(|text| VERDICT_MARKER.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| OutcomeLabel::from_verdict(m.as_str()));
    if let Some(label) = marker {
        return label;
    }
    match summary.resolved() {
        Some(true) => OutcomeLabel::Resolved,
        Some(false) => OutcomeLabel::Unresolved,
        None => OutcomeLabel::Unknown,
    }
}

/// Canonical summary text: present sections in fixed order under normalized headings.
pub fn build_summary_text(case_number: &str, summary: &StructuredSummary) -> String {
    let mut text = format!("## AI Summary\n\n### Case: {}\n\n", case_number);
    for section in Section::ALL {
        if let Some(body) = summary.section(section) {
            text.push_str(&format!("## {}\n{}\n\n", section.title(), body));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FULL_RESPONSE: &str = "\
## Symptoms（現象）
Messages over 28KB fail to send to Teams.

## Environment (環境)
- Area: Drivers/Teams
- Version: 24.0.9000

## Error codes
ERR-413 Payload Too Large

## Customer ask（顧客要望）
Send large messages without errors.

## Our actions（対応内容）
- Reproduced the failure
- Confirmed the service limit

## Outcome（結果）
Explained the platform limit.
**FromManager: RESOLVED**

## Next step
done

---
Meta: messages=3

```json
{
  \"category\": \"Configuration Issue\",
  \"error_codes\": [\"ERR-413\"],
  \"resolved\": true,
  \"from_manager\": \"RESOLVED\",
  \"keywords\": [\"Teams\", \"28KB\"]
}
```
";

    #[test]
    fn test_full_response_round_trip() {
        let summary = parse_response(FULL_RESPONSE);
        assert_eq!(summary.present_sections(), 7);
        assert_eq!(summary.symptoms.as_deref(), Some("Messages over 28KB fail to send to Teams."));
        assert_eq!(
            summary.environment.as_deref(),
            Some("- Area: Drivers/Teams\n- Version: 24.0.9000")
        );
        assert_eq!(summary.error_codes.as_deref(), Some("ERR-413 Payload Too Large"));
        assert_eq!(
            summary.our_actions.as_deref(),
            Some("- Reproduced the failure\n- Confirmed the service limit")
        );
        assert_eq!(
            summary.outcome.as_deref(),
            Some("Explained the platform limit.\n**FromManager: RESOLVED**")
        );
        assert_eq!(summary.customer_ask.as_deref(), Some("Send large messages without errors."));
        assert_eq!(summary.next_step.as_deref(), Some("done"));

        let expected = json!({
            "category": "Configuration Issue",
            "error_codes": ["ERR-413"],
            "resolved": true,
            "from_manager": "RESOLVED",
            "keywords": ["Teams", "28KB"]
        });
        assert_eq!(Value::Object(summary.metadata.clone()), expected);
        assert_eq!(summary.error_code_list(), vec!["ERR-413".to_string()]);
        assert_eq!(derive_outcome(&summary), OutcomeLabel::Resolved);
    }

    #[test]
    fn test_missing_sections_are_absent() {
        let summary = parse_response("## Symptoms\nCrash on start\n\n## Outcome\n\n## Next step\nwait");
        assert_eq!(summary.symptoms.as_deref(), Some("Crash on start"));
        assert_eq!(summary.outcome, None);
        assert_eq!(summary.environment, None);
        assert_eq!(summary.next_step.as_deref(), Some("wait"));
        assert!(summary.metadata.is_empty());

        let empty = parse_response("");
        assert_eq!(empty, StructuredSummary::default());
    }

    #[test]
    fn test_japanese_only_and_case_insensitive_headings() {
        let summary = parse_response("##現象\n接続エラー\n## ERROR CODE\nE1\n## next steps\nretry");
        assert_eq!(summary.symptoms.as_deref(), Some("接続エラー"));
        assert_eq!(summary.error_codes.as_deref(), Some("E1"));
        assert_eq!(summary.next_step.as_deref(), Some("retry"));
    }

    #[test]
    fn test_heading_must_be_whole_line() {
        let summary = parse_response("## Symptoms and more\nx\n#Symptoms\ny");
        assert_eq!(summary.symptoms, None);
    }

    #[test]
    fn test_deeper_headings_and_bare_japanese_suffix() {
        let summary = parse_response("### Symptoms（現象）\nCrash\n\n## Outcome結果\nFixed\n#### Next Step (次のステップ)\ndone");
        assert_eq!(summary.symptoms.as_deref(), Some("Crash"));
        assert_eq!(summary.outcome.as_deref(), Some("Fixed"));
        assert_eq!(summary.next_step.as_deref(), Some("done"));
    }

    #[test]
    fn test_crlf_response() {
        let text = "## Symptoms（現象）\r\nCrash\r\non start\r\n\r\n## Outcome\r\nOpen\r\n\r\n```json\r\n{\"resolved\": false}\r\n```\r\n";
        let summary = parse_response(text);
        assert_eq!(summary.symptoms.as_deref(), Some("Crash\non start"));
        assert_eq!(summary.outcome.as_deref(), Some("Open"));
        assert_eq!(summary.resolved(), Some(false));
    }

    #[test]
    fn test_body_stops_at_fence() {
        let summary = parse_response("## Outcome\nPending\n```json\n{\"resolved\": false}\n```");
        assert_eq!(summary.outcome.as_deref(), Some("Pending"));
        assert_eq!(summary.resolved(), Some(false));
        assert_eq!(derive_outcome(&summary), OutcomeLabel::Unresolved);
    }

    #[test]
    fn test_malformed_metadata_is_empty() {
        let summary = parse_response("## Symptoms\nx\n```json\n{\"category\": \n```");
        assert_eq!(summary.symptoms.as_deref(), Some("x"));
        assert!(summary.metadata.is_empty());

        assert!(matches!(
            parse_metadata_block("```json\n[1, 2]\n```"),
            Err(DigestError::MetadataParse(ref m)) if m.contains("array")
        ));
        assert!(matches!(parse_metadata_block("no fence"), Err(DigestError::MetadataParse(_))));
    }

    #[test]
    fn test_last_json_block_wins() {
        let text = "```json\n{\"category\": \"Bug\"}\n```\n\n```json\n{\"category\": \"How-to\"}\n```";
        let map = parse_metadata_block(text).unwrap();
        assert_eq!(map.get("category"), Some(&json!("How-to")));
    }

    #[test]
    fn test_outcome_precedence() {
        let mut summary = parse_response("## Outcome\nStill broken. FromManager: **UNRESOLVED**");
        assert_eq!(derive_outcome(&summary), OutcomeLabel::Unresolved);

        summary.metadata = json!({"from_manager": "RESOLVED", "resolved": false})
            .as_object()
            .unwrap()
            .clone();
        assert_eq!(derive_outcome(&summary), OutcomeLabel::Resolved);

        assert_eq!(derive_outcome(&StructuredSummary::default()), OutcomeLabel::Unknown);
    }

    #[test]
    fn test_canonical_text_order_and_reparse() {
        let mut summary = StructuredSummary::default();
        summary.next_step = Some("done".into());
        summary.symptoms = Some("Crash".into());
        summary.error_codes = Some("E1".into());

        let text = build_summary_text("AST-853689", &summary);
        assert_eq!(
            text,
            "## AI Summary\n\n### Case: AST-853689\n\n## Symptoms\nCrash\n\n## Error Codes\nE1\n\n## Next Step\ndone\n\n"
        );

        let reparsed = parse_response(&text);
        assert_eq!(reparsed.symptoms, summary.symptoms);
        assert_eq!(reparsed.error_codes, summary.error_codes);
        assert_eq!(reparsed.next_step, summary.next_step);
        assert_eq!(reparsed.present_sections(), 3);
    }
}
