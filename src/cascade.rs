// Chart selection: an ordered list of strategies, first success wins.

use crate::classify::{Classification, ColumnRole};
use crate::coerce::{coerce, CoercionMode};
use crate::config::AnalysisConfig;
use crate::data::{cell_at, TableContent};
use crate::report::{Chart, ChartKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

pub const OVERVIEW_TITLE: &str = "数据基础概览";
pub const OVERVIEW_COLUMNS_LABEL: &str = "总字段数 (列)";
pub const OVERVIEW_ROWS_LABEL: &str = "总记录数 (行)";

/// Everything a strategy may look at. Borrowed, never mutated.
pub struct Context<'a> {
    pub table: &'a TableContent,
    pub headers: &'a [String],
    pub classification: &'a Classification,
    pub config: &'a AnalysisConfig,
}

/// Outcome of a strategy: the primary chart plus the sentences it implies
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub strategy: &'static str,
    pub chart: Chart,
    pub insights: Vec<String>,
    pub trends: Vec<String>,
    /// Column the chart aggregates by, if any
    pub grouped_by: Option<usize>,
}

pub type Strategy = fn(&Context) -> Option<Selection>;

/// Tried in order. The overview is not listed: it is the terminal case.
pub const CASCADE: &[(&str, Strategy)] = &[
    ("time_series", time_series),
    ("category_aggregation", category_aggregation),
];

pub fn select_chart(ctx: &Context) -> Selection {
    for (name, strategy) in CASCADE {
        match strategy(ctx) {
            Some(selection) => {
                debug!(strategy = name, points = selection.chart.data.len(), "chart strategy selected");
                return selection;
            }
            None => debug!(strategy = name, "strategy produced no chart"),
        }
    }
    debug!("falling back to overview chart");
    overview(ctx)
}

/// Line chart of the first metric column over the first time column
pub fn time_series(ctx: &Context) -> Option<Selection> {
    let time = ctx.classification.first(ColumnRole::Time)?;
    let metric = ctx.classification.first(ColumnRole::Metric)?;

    let data: Vec<Value> = ctx
        .table
        .rows()
        .iter()
        .filter_map(|row| {
            let label = cell_at(row, time.index).to_text()?;
            let value = coerce(cell_at(row, metric.index), CoercionMode::Lenient)?;
            Some(json!({ "time": label, "value": value }))
        })
        .collect();

    if data.is_empty() {
        return None;
    }

    let chart = Chart::new(
        ChartKind::Line,
        format!("{}随'{}'的变化趋势", metric.name, time.name),
        data,
    )
    .with_axes("time", "value");

    Some(Selection {
        strategy: "time_series",
        chart,
        insights: Vec::new(),
        trends: vec![format!(
            "数据显示了'{}'随'{}'变化的明显趋势。",
            metric.name, time.name
        )],
        grouped_by: None,
    })
}

/// Sum the first metric column per value of the first category column.
/// Pie chart for a handful of groups, bar chart otherwise.
pub fn category_aggregation(ctx: &Context) -> Option<Selection> {
    let category = ctx.classification.first(ColumnRole::Category)?;
    let metric = ctx.classification.first(ColumnRole::Metric)?;

    // First-appearance order keeps the output deterministic
    let mut groups: Vec<(String, f64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in ctx.table.rows() {
        let Some(key) = cell_at(row, category.index).to_text() else {
            continue;
        };
        let Some(value) = coerce(cell_at(row, metric.index), CoercionMode::Lenient) else {
            continue;
        };
        match positions.get(&key) {
            Some(&pos) => groups[pos].1 += value,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, value));
            }
        }
    }

    let k = groups.len();
    if k == 0 {
        return None;
    }

    let chart = if k > 1 && k < ctx.config.pie_max_groups {
        Chart::new(
            ChartKind::Pie,
            format!("按'{}'划分的'{}'分布", category.name, metric.name),
            groups
                .into_iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect(),
        )
    } else {
        Chart::new(
            ChartKind::Bar,
            format!("各'{}'的'{}'对比", category.name, metric.name),
            groups
                .into_iter()
                .map(|(name, value)| json!({ "category": name, "value": value }))
                .collect(),
        )
        .with_axes("category", "value")
    };

    Some(Selection {
        strategy: "category_aggregation",
        chart,
        insights: vec![format!(
            "数据中'{}'和'{}'存在显著关联，建议关注其分布情况。",
            category.name, metric.name
        )],
        trends: Vec::new(),
        grouped_by: Some(category.index),
    })
}

/// Column and row counts. Always succeeds.
pub fn overview(ctx: &Context) -> Selection {
    let chart = Chart::new(
        ChartKind::Bar,
        OVERVIEW_TITLE,
        vec![
            json!({ "name": OVERVIEW_COLUMNS_LABEL, "value": ctx.headers.len() }),
            json!({ "name": OVERVIEW_ROWS_LABEL, "value": ctx.table.rows().len() }),
        ],
    )
    .with_axes("name", "value");

    Selection {
        strategy: "overview",
        chart,
        insights: Vec::new(),
        trends: Vec::new(),
        grouped_by: None,
    }
}
