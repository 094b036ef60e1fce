// Repair of reports produced outside the engine, typically a language
// model reply that wraps its JSON in a markdown fence.

use crate::error::Result;
use crate::report::Report;
use crate::sanitize;
use tracing::debug;

/// Remove a surrounding ```json / ``` fence, if present
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline
        body = match rest.find('\n') {
            Some(pos) if rest[..pos].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[pos + 1..],
            _ => rest.strip_prefix("json").unwrap_or(rest),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

pub fn parse_report_text(text: &str) -> Result<Report> {
    let report: Report = serde_json::from_str(strip_code_fence(text))?;
    Ok(report)
}

/// Parse an external report and run the same repair passes the engine
/// applies to its own output.
pub fn repair_report_text(text: &str) -> Result<Report> {
    let mut report = parse_report_text(text)?;
    debug!(charts = report.visualization_data.len(), "repairing external report");
    sanitize::repair(&mut report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::report::{ChartKind, ReportStatus};
    use serde_json::json;

    #[test]
    fn test_strip_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_repair_fenced_reply() {
        let text = r#"```json
{
  "sheet_name": "销售数据",
  "summary": "ok",
  "visualization_data": [
    {"type": "bar_chart", "title": "t", "data": [{"月份": "1月", "销售额": "1,200元"}]},
    {"type": "pie_chart", "title": "p", "data": [{"category": "A", "value": 3}]}
  ]
}
```"#;
        let report = repair_report_text(text).unwrap();
        assert_eq!(report.status, ReportStatus::Success);
        assert!(report.insights.is_empty());
        let bar = &report.visualization_data[0];
        assert_eq!(bar.y_axis.as_deref(), Some("销售额"));
        assert_eq!(bar.data[0]["销售额"], json!(1200.0));
        let pie = &report.visualization_data[1];
        assert_eq!(pie.kind, ChartKind::Pie);
        assert_eq!(pie.data[0], json!({"name": "A", "value": 3}));
    }

    #[test]
    fn test_unknown_fields_survive_repair() {
        let report = repair_report_text(r#"{"summary": "s", "confidence": 0.9}"#).unwrap();
        assert_eq!(report.extra["confidence"], json!(0.9));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = repair_report_text("```json\nnot json\n```").unwrap_err();
        assert!(matches!(err, AnalysisError::Json(_)));
    }
}
