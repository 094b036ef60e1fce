use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run sheet-insight with arguments and optional stdin
fn run_sheet_insight(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sheet-insight"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn process");

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .expect("Failed to write to stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for process")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}\nstderr: {}",
            e,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_analyze_time_series_csv() {
    let output = run_sheet_insight(&["analyze", "test/sales.csv"], None);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);

    assert_eq!(report["status"], "success");
    assert_eq!(report["sheet_name"], "sales");
    assert_eq!(report["summary"], "该工作表包含3个字段和5条数据记录。");

    let chart = &report["visualization_data"][0];
    assert_eq!(chart["type"], "line_chart");
    assert_eq!(chart["x_axis"], "time");
    assert_eq!(chart["y_axis"], "value");
    assert_eq!(chart["data"].as_array().unwrap().len(), 4);
    assert_eq!(chart["data"][0]["value"], 125000.0);
    assert_eq!(chart["data"][2]["value"], 145000.0);

    assert_eq!(
        strings(&report["trends"]),
        vec!["数据显示了'销售额'随'月份'变化的明显趋势。"]
    );
    let anomalies = strings(&report["anomalies"]);
    assert!(anomalies.contains(&"数据量较少，可能影响分析结果的可靠性。".to_string()));
    assert!(anomalies.contains(&"'销售额'列中有1个值无法解析为数值。".to_string()));
}

#[test]
fn test_analyze_category_pie() {
    let output = run_sheet_insight(&["analyze", "test/categories.csv", "--sheet-name", "区域"], None);
    assert!(output.status.success());
    let report = stdout_json(&output);

    assert_eq!(report["sheet_name"], "区域");
    let chart = &report["visualization_data"][0];
    assert_eq!(chart["type"], "pie_chart");
    assert_eq!(chart["title"], "按'地区'划分的'销售额'分布");
    assert_eq!(chart["data"][0]["name"], "华东");
    assert_eq!(chart["data"][0]["value"], 125.0);
    assert!(chart.get("x_axis").is_none());
}

#[test]
fn test_config_changes_pie_bound() {
    let output = run_sheet_insight(
        &["analyze", "test/categories.csv", "--config", "test/config.json"],
        None,
    );
    assert!(output.status.success());
    let report = stdout_json(&output);
    let chart = &report["visualization_data"][0];
    assert_eq!(chart["type"], "bar_chart");
    assert_eq!(chart["data"][1], serde_json::json!({"category": "华北", "value": 50.0}));
}

#[test]
fn test_overview_fallback() {
    let output = run_sheet_insight(&["analyze", "test/plain.csv"], None);
    assert!(output.status.success());
    let report = stdout_json(&output);
    let charts = report["visualization_data"].as_array().unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0]["title"], "数据基础概览");
    assert_eq!(charts[0]["data"][0]["value"], 3);
    assert_eq!(charts[0]["data"][1]["value"], 2);
    assert_eq!(strings(&report["trends"]), vec!["数据中未发现明显的时间或类别趋势。"]);
}

#[test]
fn test_identity_breakdowns_from_json() {
    let output = run_sheet_insight(&["analyze", "test/staff.json"], None);
    assert!(output.status.success());
    let report = stdout_json(&output);

    assert_eq!(report["sheet_name"], "员工");
    let titles: Vec<String> = report["visualization_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        titles,
        vec!["数据基础概览", "性别分布 - 比例图", "性别分布 - 数量比较", "年龄分布"]
    );

    let insights = strings(&report["insights"]);
    assert!(insights.contains(&"男性占比: 50.0% (2人)".to_string()));
    assert!(insights.contains(&"平均年龄: 40.0岁".to_string()));
    assert!(insights.contains(
        &"薪资统计: 最小值=10000.00, 最大值=15000.00, 平均值=12333.33".to_string()
    ));
}

#[test]
fn test_analyze_json_from_stdin() {
    let input = r#"{"sheet_name": "季度", "data": [["季度", "利润"], ["Q1", "1,000"], ["Q2", 1500]]}"#;
    let output = run_sheet_insight(&["analyze"], Some(input));
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["visualization_data"][0]["data"][0]["value"], 1000.0);
}

#[test]
fn test_header_only_table() {
    let output = run_sheet_insight(&["analyze", "--input-format", "csv"], Some("月份,销售额\n"));
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["summary"], "数据行数不足，无法进行有意义的分析。");
    assert_eq!(report["visualization_data"], serde_json::json!([]));
    assert_eq!(report["sheet_name"], "Sheet1");
}

#[test]
fn test_malformed_table_yields_error_report() {
    let output = run_sheet_insight(&["analyze", "test/malformed.json"], None);
    assert!(!output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["status"], "error");
    assert_eq!(report["sheet_name"], "坏表");
    assert_eq!(report["summary"], "无法生成报告。");
    assert!(report["message"]
        .as_str()
        .unwrap()
        .starts_with("生成模拟报告时发生错误"));
}

#[test]
fn test_invalid_json_input_fails() {
    let output = run_sheet_insight(&["analyze"], Some("not json"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse JSON input"));
}

#[test]
fn test_repair_fenced_reply() {
    let output = run_sheet_insight(&["repair", "test/llm_reply.txt"], None);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);

    assert_eq!(report["status"], "success");
    assert_eq!(strings(&report["insights"]), vec!["3月增长最快"]);

    let line = &report["visualization_data"][0];
    assert_eq!(line["x_axis"], "月份");
    assert_eq!(line["y_axis"], "销售额");
    let values: Vec<f64> = line["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["销售额"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![125000.0, 132000.0, 0.0]);

    let pie = &report["visualization_data"][1];
    assert_eq!(pie["data"][0], serde_json::json!({"name": "华东", "value": 3}));
}

#[test]
fn test_repair_rejects_garbage() {
    let output = run_sheet_insight(&["repair"], Some("```json\nnope\n```"));
    assert!(!output.status.success());
}

#[test]
fn test_sample_then_analyze() {
    let sample = run_sheet_insight(&["sample", "销售报表"], None);
    assert!(sample.status.success());
    let table = stdout_json(&sample);
    assert_eq!(table["sheet_name"], "销售数据");
    assert_eq!(
        table["data"][0],
        serde_json::json!(["月份", "销售额", "目标", "达成率"])
    );

    let output = run_sheet_insight(
        &["analyze"],
        Some(&String::from_utf8_lossy(&sample.stdout)),
    );
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["visualization_data"][0]["type"], "line_chart");
}

#[test]
fn test_chart_out_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.png");
    let output = run_sheet_insight(
        &["analyze", "test/categories.csv", "--chart-out", path.to_str().unwrap()],
        None,
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let bytes = std::fs::read(&path).unwrap();
    assert!(is_valid_png(&bytes), "Output is not a valid PNG");
}

#[test]
fn test_sheet_name_override_on_malformed_json() {
    let output = run_sheet_insight(
        &["analyze", "test/malformed.json", "--sheet-name", "改名"],
        None,
    );
    assert!(!output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["status"], "error");
    assert_eq!(report["sheet_name"], "改名");
}

#[test]
fn test_oversized_chart_is_rejected() {
    let output = run_sheet_insight(
        &["analyze", "test/categories.csv", "--chart-out", "unused.png", "--width", "40000"],
        None,
    );
    assert!(!output.status.success());
    assert!(!std::path::Path::new("unused.png").exists());
}
