// Post-passes applied to every report before it leaves the crate, whether
// the engine built it or it came from elsewhere.

use crate::coerce::{parse_decorated, CoercionMode};
use crate::report::{Chart, ChartKind, Report};
use serde_json::{Map, Number, Value};

/// Fill in missing chart metadata, then force numeric fields to numbers
pub fn repair(report: &mut Report) {
    ensure_chart_metadata(report);
    sanitize_visualization_data(report);
}

pub fn ensure_chart_metadata(report: &mut Report) {
    for chart in &mut report.visualization_data {
        ensure_metadata(chart);
    }
}

pub fn sanitize_visualization_data(report: &mut Report) {
    for chart in &mut report.visualization_data {
        sanitize_chart(chart);
    }
}

/// Pie records keyed `category` are renamed to `name`; cartesian charts get
/// `x_axis`/`y_axis` from the first and second key of the first record.
pub fn ensure_metadata(chart: &mut Chart) {
    let Some(first) = chart.first_record() else {
        return;
    };

    // Rename before inferring so axis keys see the final names
    if chart.kind == ChartKind::Pie && !first.contains_key("name") && first.contains_key("category") {
        for record in &mut chart.data {
            if let Some(obj) = record.as_object_mut() {
                rename_key(obj, "category", "name");
            }
        }
    }

    if chart.kind.is_cartesian() {
        let keys: Vec<String> = chart
            .first_record()
            .map(|first| first.keys().take(2).cloned().collect())
            .unwrap_or_default();
        if chart.x_axis.is_none() {
            chart.x_axis = keys.first().cloned();
        }
        if chart.y_axis.is_none() {
            chart.y_axis = keys.get(1).cloned();
        }
    }
}

/// Coerce every field named by `y_axis` (and, for multi-line charts, every
/// key except `x_axis`) to a number; unparseable values become 0.
pub fn sanitize_chart(chart: &mut Chart) {
    let keys = numeric_keys(chart);
    if keys.is_empty() {
        return;
    }

    for record in &mut chart.data {
        let Some(obj) = record.as_object_mut() else {
            continue;
        };
        for key in &keys {
            if let Some(value) = obj.get_mut(key) {
                *value = numeric_or_zero(value);
            }
        }
    }
}

pub fn numeric_keys(chart: &Chart) -> Vec<String> {
    let mut keys: Vec<String> = chart.y_axis.iter().cloned().collect();
    if chart.kind == ChartKind::MultiLine {
        if let Some(first) = chart.first_record() {
            for key in first.keys() {
                if Some(key) != chart.x_axis.as_ref() && !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
    }
    keys
}

fn numeric_or_zero(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => parse_decorated(s, CoercionMode::Strict)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0)),
        _ => Value::from(0),
    }
}

/// Rename a key in place, keeping its position
fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if !obj.contains_key(from) {
        return;
    }
    let old = std::mem::take(obj);
    for (key, value) in old {
        if key == from {
            obj.insert(to.to_string(), value);
        } else {
            obj.insert(key, value);
        }
    }
}
