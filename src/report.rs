// Report and chart payloads returned to callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_SHEET_NAME: &str = "未知工作表";

/// Chart type tag. Unknown tags from externally produced reports are kept
/// verbatim so a repair pass never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    Line,
    MultiLine,
    Bar,
    Pie,
    Other(String),
}

impl ChartKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Line => "line_chart",
            ChartKind::MultiLine => "multi_line_chart",
            ChartKind::Bar => "bar_chart",
            ChartKind::Pie => "pie_chart",
            ChartKind::Other(s) => s,
        }
    }

    /// Charts drawn on x/y axes whose axis keys can be inferred
    pub fn is_cartesian(&self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::Bar)
    }
}

impl Default for ChartKind {
    fn default() -> Self {
        ChartKind::Other(String::new())
    }
}

impl From<String> for ChartKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "line_chart" => ChartKind::Line,
            "multi_line_chart" => ChartKind::MultiLine,
            "bar_chart" => ChartKind::Bar,
            "pie_chart" => ChartKind::Pie,
            _ => ChartKind::Other(s),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One visualization. `data` holds records keyed by field name; key order
/// matters for axis inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type", default)]
    pub kind: ChartKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chart {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            kind,
            title: title.into(),
            data,
            x_axis: None,
            y_axis: None,
            extra: Map::new(),
        }
    }

    pub fn with_axes(mut self, x_axis: &str, y_axis: &str) -> Self {
        self.x_axis = Some(x_axis.to_string());
        self.y_axis = Some(y_axis.to_string());
        self
    }

    /// First record as an object, if any
    pub fn first_record(&self) -> Option<&Map<String, Value>> {
        self.data.first().and_then(Value::as_object)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub sheet_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub anomalies: Vec<String>,
    #[serde(default)]
    pub visualization_data: Vec<Chart>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    /// Successful report with empty lists
    pub fn success(sheet_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Success,
            sheet_name: sheet_name.into(),
            summary: summary.into(),
            message: None,
            insights: Vec::new(),
            trends: Vec::new(),
            anomalies: Vec::new(),
            visualization_data: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn error(sheet_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Error,
            message: Some(message.into()),
            ..Self::success(sheet_name, "无法生成报告。")
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }
}
