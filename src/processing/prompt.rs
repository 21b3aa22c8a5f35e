use chrono::{DateTime, Utc};

/// Everything the model needs to summarize one ticket.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub ticket_id: String,
    pub area: String,
    pub priority: String,
    pub importance: String,
    pub thread_text: String,
    pub message_count: usize,
    pub date_range: String,
    pub keywords: String,
}

/// Fill the case summary template for one ticket.
pub fn build_prompt(request: &SummaryRequest, model_name: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        r#"You are an assistant that writes summaries of technical support cases.

Analyze the following OEM support case and produce a structured summary.

## Input
Ticket: {ticket_id}
Product area: {area}
Priority: {priority}
Importance: {importance}
Messages: {message_count}

Thread:
{thread}

## Output format

Write the summary with exactly these headings. Keep each section short and factual.

## Symptoms（現象）
[The problem the customer reported, 1-3 sentences]

## Environment（環境）
- Area: {area}
- Product: [product name, "Drivers/XXX" form]
- Version: [version, or "unknown"]
- Data source: [connected data source]
- OS/runtime: [only if relevant]

## Error codes
[Error codes and messages as a list, or "none"]

## Customer ask（顧客要望）
[What the customer ultimately wants, 1-2 sentences]

## Our actions（対応内容）
[Main support actions as a list, in chronological order]

## Outcome（結果）
[Resolved / unresolved / in progress, with a short description]
**FromManager: [RESOLVED|UNRESOLVED]**

## Next step
[Next action, or "done" when complete]

---
Meta: messages={message_count}, range={date_range}
Keywords: {keywords}
Summary generated: {generated_at} ({model_name})

## Rules

1. Facts only, no speculation.
2. Keep error codes, product names and setting names verbatim.
3. At most about three sentences per section.
4. Include the keywords someone would search for.
5. Leave out customer names, company names and personal data.

## FromManager verdict

RESOLVED when the customer confirmed the fix or agreed to close, thanked support
for a solution, the proposal removed the problem, or the case ended RESOLVED/CLOSED.
UNRESOLVED when a product limitation blocked it, a bug fix is pending with no
workaround, the customer never replied before closing, or the customer closed it unresolved.

## Metadata

After the summary, output this JSON block:

```json
{{
  "category": "[Bug|Configuration Issue|How-to|Feature Request|Performance|Other]",
  "product": "[product name]",
  "area": "{area}",
  "data_source": "[connected data source]",
  "error_codes": ["error codes"],
  "resolution_type": "[configuration change|awaiting bug fix|workaround|behavior explained|unresolved]",
  "resolved": true,
  "from_manager": "[RESOLVED|UNRESOLVED]",
  "from_manager_confidence": 0.0,
  "temperature": "[calm|normal|frustrated|urgent]",
  "faq_candidate": false,
  "keywords": ["search keywords"]
}}
```
"#,
        ticket_id = request.ticket_id,
        area = request.area,
        priority = request.priority,
        importance = request.importance,
        message_count = request.message_count,
        thread = request.thread_text,
        date_range = request.date_range,
        keywords = request.keywords,
        generated_at = generated_at.format("%Y-%m-%d %H:%M:%S"),
        model_name = model_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_substitutes_ticket_context() {
        let request = SummaryRequest {
            ticket_id: "853689".into(),
            area: "Drivers/Teams".into(),
            priority: "Middle".into(),
            importance: "High".into(),
            thread_text: "[Customer -> Support] 2025-01-07 17:45 Alice\n[OPENED] broken\n".into(),
            message_count: 3,
            date_range: "2025-01-07 - 2025-01-08".into(),
            keywords: String::new(),
        };
        let prompt = build_prompt(&request, "test-model", Utc::now());
        assert!(prompt.contains("Ticket: 853689"));
        assert!(prompt.contains("- Area: Drivers/Teams"));
        assert!(prompt.contains("\"area\": \"Drivers/Teams\""));
        assert!(prompt.contains("Messages: 3"));
        assert!(prompt.contains("[OPENED] broken"));
        assert!(prompt.contains("range=2025-01-07 - 2025-01-08"));
        assert!(prompt.contains("(test-model)"));
        assert!(!prompt.contains("{ticket_id}"));
    }
}
