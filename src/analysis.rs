// Report assembly: classification, chart cascade, sentences, repair.

use crate::cascade::{self, Context};
use crate::classify::{classify, ColumnRole, IdentityKind};
use crate::coerce::{coerce, CoercionMode};
use crate::config::AnalysisConfig;
use crate::data::{cell_at, TableContent};
use crate::error::{AnalysisError, Result};
use crate::report::{Chart, ChartKind, Report, UNKNOWN_SHEET_NAME};
use crate::sanitize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const INSUFFICIENT_DATA_SUMMARY: &str = "数据行数不足，无法进行有意义的分析。";
pub const DEFAULT_INSIGHT: &str = "数据结构完整，适合进行初步分析。";
pub const DEFAULT_TREND: &str = "数据中未发现明显的时间或类别趋势。";
pub const DEFAULT_ANOMALY: &str = "未发现明显的数据异常。";
pub const SMALL_SAMPLE_ANOMALY: &str = "数据量较少，可能影响分析结果的可靠性。";

const AGE_BUCKETS: [(f64, &str); 6] = [
    (18.0, "0-18岁"),
    (30.0, "19-30岁"),
    (40.0, "31-40岁"),
    (50.0, "41-50岁"),
    (60.0, "51-60岁"),
    (f64::INFINITY, "60岁以上"),
];

/// Rule-based report generator. Stateless apart from its configuration, so
/// one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Never fails: internal faults come back as a report with `status: "error"`
    pub fn analyze(&self, table: &TableContent) -> Report {
        match self.assemble(table) {
            Ok(report) => report,
            Err(e) => {
                warn!(sheet = %table.sheet_name, error = %e, "analysis failed");
                error_report(&table.sheet_name, &e)
            }
        }
    }

    /// Analyze a raw `{sheet_name, data}` JSON value
    pub fn analyze_json(&self, value: &Value) -> Report {
        match TableContent::from_json(value) {
            Ok(table) => self.analyze(&table),
            Err(e) => {
                let sheet_name = value
                    .get("sheet_name")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_SHEET_NAME);
                warn!(sheet = sheet_name, error = %e, "rejected malformed table");
                error_report(sheet_name, &e)
            }
        }
    }

    fn assemble(&self, table: &TableContent) -> Result<Report> {
        self.config.validate()?;

        if table.data.len() < 2 {
            debug!(sheet = %table.sheet_name, "not enough rows to analyze");
            return Ok(Report::success(&table.sheet_name, INSUFFICIENT_DATA_SUMMARY));
        }

        let headers = table.header_names();
        let rows = table.rows();

        let mut report = Report::success(
            &table.sheet_name,
            format!("该工作表包含{}个字段和{}条数据记录。", headers.len(), rows.len()),
        );
        report.insights.push(DEFAULT_INSIGHT.to_string());
        report.trends.push(DEFAULT_TREND.to_string());
        report.anomalies.push(DEFAULT_ANOMALY.to_string());

        let classification = classify(&headers, &self.config.keywords);
        let ctx = Context {
            table,
            headers: &headers,
            classification: &classification,
            config: &self.config,
        };

        let selection = cascade::select_chart(&ctx);
        if !selection.trends.is_empty() {
            report.trends = selection.trends;
        }
        report.insights.extend(selection.insights);
        report.visualization_data.push(selection.chart);

        if self.config.identity_breakdowns {
            add_identity_breakdowns(&ctx, selection.grouped_by, &mut report);
        }
        if self.config.numeric_statistics {
            report.insights.extend(numeric_statistics(&ctx));
        }

        let anomalies = detect_anomalies(&ctx);
        if !anomalies.is_empty() {
            report.anomalies = anomalies;
        }
        if rows.len() > self.config.large_sample_rows {
            report.insights.push(format!(
                "数据量较大（超过{}条记录），建议使用数据透视表进行深入分析。",
                self.config.large_sample_rows
            ));
        }

        sanitize::repair(&mut report);
        Ok(report)
    }
}

/// Analyze with the default configuration
pub fn generate_analysis_report(table: &TableContent) -> Report {
    Analyzer::new().analyze(table)
}

fn error_report(sheet_name: &str, error: &AnalysisError) -> Report {
    Report::error(sheet_name, format!("生成模拟报告时发生错误: {}", error))
}

/// Count values in first-appearance order
fn tally<I: IntoIterator<Item = String>>(values: I) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for value in values {
        match positions.get(&value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

fn text_values(table: &TableContent, index: usize) -> impl Iterator<Item = String> + '_ {
    table.rows().iter().filter_map(move |row| {
        cell_at(row, index)
            .to_text()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn normalize_gender(raw: String) -> String {
    match raw.as_str() {
        "男" | "male" | "Male" | "M" | "m" => "男".to_string(),
        "女" | "female" | "Female" | "F" | "f" => "女".to_string(),
        _ => raw,
    }
}

fn add_identity_breakdowns(ctx: &Context, grouped_by: Option<usize>, report: &mut Report) {
    let classification = ctx.classification;

    if let Some(column) = classification.first_identity(IdentityKind::Gender) {
        let counts = tally(text_values(ctx.table, column.index).map(normalize_gender));
        if !counts.is_empty() {
            let total: usize = counts.iter().map(|(_, n)| n).sum();
            report.insights.push("数据包含性别信息，已生成性别分布分析。".to_string());
            for (gender, count) in &counts {
                let share = *count as f64 / total as f64 * 100.0;
                report
                    .insights
                    .push(format!("{}性占比: {:.1}% ({}人)", gender, share, count));
            }
            report.visualization_data.push(Chart::new(
                ChartKind::Pie,
                "性别分布 - 比例图",
                counts
                    .iter()
                    .map(|(g, n)| json!({ "name": g, "value": n }))
                    .collect(),
            ));
            report.visualization_data.push(
                Chart::new(
                    ChartKind::Bar,
                    "性别分布 - 数量比较",
                    counts
                        .iter()
                        .map(|(g, n)| json!({ "gender": g, "count": n }))
                        .collect(),
                )
                .with_axes("gender", "count"),
            );
        }
    }

    if let Some(column) = classification.first_identity(IdentityKind::Age) {
        let ages: Vec<f64> = ctx
            .table
            .rows()
            .iter()
            .filter_map(|row| coerce(cell_at(row, column.index), CoercionMode::Lenient))
            .filter(|age| *age > 0.0 && *age < 150.0)
            .collect();
        if !ages.is_empty() {
            let min = ages.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = ages.iter().sum::<f64>() / ages.len() as f64;
            report.insights.push("数据包含年龄信息，已生成年龄统计分析。".to_string());
            report.insights.push(format!("年龄范围: {:.0} - {:.0}岁", min, max));
            report.insights.push(format!("平均年龄: {:.1}岁", mean));

            let mut buckets = [0usize; AGE_BUCKETS.len()];
            for age in &ages {
                if let Some(idx) = AGE_BUCKETS.iter().position(|(upper, _)| age <= upper) {
                    buckets[idx] += 1;
                }
            }
            let data: Vec<Value> = AGE_BUCKETS
                .iter()
                .zip(buckets.iter())
                .filter(|(_, n)| **n > 0)
                .map(|((_, label), n)| json!({ "name": label, "value": n }))
                .collect();
            report
                .visualization_data
                .push(Chart::new(ChartKind::Pie, "年龄分布", data));
        }
    }

    if let Some(column) = classification.first_identity(IdentityKind::Department) {
        if grouped_by == Some(column.index) {
            return;
        }
        let counts = tally(text_values(ctx.table, column.index));
        if !counts.is_empty() {
            report.insights.push(format!("部门数量: {}", counts.len()));
            report.visualization_data.push(Chart::new(
                ChartKind::Pie,
                "部门人员分布",
                counts
                    .iter()
                    .map(|(d, n)| json!({ "name": d, "value": n }))
                    .collect(),
            ));
        }
    }
}

/// min/max/mean sentences for every statistics column with numeric values
fn numeric_statistics(ctx: &Context) -> Vec<String> {
    ctx.classification
        .statistic_columns()
        .filter_map(|column| {
            let values: Vec<f64> = ctx
                .table
                .rows()
                .iter()
                .filter_map(|row| coerce(cell_at(row, column.index), CoercionMode::Lenient))
                .collect();
            if values.is_empty() {
                return None;
            }
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(format!(
                "{}统计: 最小值={:.2}, 最大值={:.2}, 平均值={:.2}",
                column.name, min, max, mean
            ))
        })
        .collect()
}

fn detect_anomalies(ctx: &Context) -> Vec<String> {
    let mut anomalies = Vec::new();
    if ctx.table.rows().len() < ctx.config.small_sample_rows {
        anomalies.push(SMALL_SAMPLE_ANOMALY.to_string());
    }
    for column in ctx.classification.with_role(ColumnRole::Metric) {
        let unparseable = ctx
            .table
            .rows()
            .iter()
            .map(|row| cell_at(row, column.index))
            .filter(|cell| !cell.is_empty() && coerce(cell, CoercionMode::Lenient).is_none())
            .count();
        if unparseable > 0 {
            anomalies.push(format!(
                "'{}'列中有{}个值无法解析为数值。",
                column.name, unparseable
            ));
        }
    }
    anomalies
}
