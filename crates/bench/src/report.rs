//! Plain-text tables and JSON/CSV export for benchmark results.

use crate::cost::{CostAggregate, CostComparison, pct_diff};
use crate::perf::PerfComparison;
use crate::BenchError;
use chrono::{DateTime, Local};
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Both,
}

impl ExportFormat {
    pub fn includes_json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn includes_csv(&self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

impl FromStr for ExportFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            _ => Err(BenchError::InvalidExport(s.to_string())),
        }
    }
}

/// `YYYYmmdd_HHMMSS`, used in export file names.
pub fn file_stamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Integer with thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn rule(c: char, width: usize) -> String {
    std::iter::repeat_n(c, width).collect()
}

// --- Cost tables ---

pub fn cost_summary_table(results: &[CostComparison]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', 100));
    let _ = writeln!(
        out,
        "{:<30} {:<10} {:<8} {:<10} {:<12} {:<12} {:<10}",
        "Pattern", "Framework", "Iters", "API Calls", "Tokens", "Cost ($)", "$/Iter"
    );
    let _ = writeln!(out, "{}", rule('=', 100));

    for r in results {
        for m in r.metrics() {
            let _ = writeln!(
                out,
                "{:<30} {:<10} {:<8} {:<10} {:<12} {:<12.6} {:<10.6}",
                m.pattern_name,
                m.framework.as_str().to_uppercase(),
                m.iterations,
                m.api_calls,
                thousands(m.tokens.total_tokens),
                m.estimated_cost_usd,
                m.cost_per_iteration
            );
        }
        let _ = writeln!(out, "{}", rule('-', 100));
    }
    out
}

pub fn cost_aggregate_table(agg: &CostAggregate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', 80));
    let _ = writeln!(out, "AGGREGATE STATISTICS");
    let _ = writeln!(out, "{}", rule('=', 80));
    let _ = writeln!(out, "{:<30} {:<20} {:<20} {:<10}", "Metric", "ADK", "CrewAI", "Diff");
    let _ = writeln!(out, "{}", rule('-', 80));

    let (a, c) = (&agg.adk, &agg.crewai);
    let _ = writeln!(
        out,
        "{:<30} {:<20.6} {:<20.6} {:+.2}%",
        "Total Cost ($)",
        a.total_cost,
        c.total_cost,
        pct_diff(a.total_cost, c.total_cost)
    );
    let _ = writeln!(
        out,
        "{:<30} {:<20} {:<20} {:+.2}%",
        "Total Tokens",
        thousands(a.total_tokens),
        thousands(c.total_tokens),
        pct_diff(a.total_tokens as f64, c.total_tokens as f64)
    );
    let _ = writeln!(
        out,
        "{:<30} {:<20} {:<20} {:+.2}%",
        "Total API Calls",
        thousands(a.total_calls),
        thousands(c.total_calls),
        pct_diff(a.total_calls as f64, c.total_calls as f64)
    );
    let _ = writeln!(
        out,
        "{:<30} {:<20.6} {:<20.6} {:+.2}%",
        "Avg Cost/Pattern ($)",
        a.avg_cost(),
        c.avg_cost(),
        pct_diff(a.avg_cost(), c.avg_cost())
    );
    let _ = writeln!(out, "{}", rule('=', 80));
    out
}

// --- Performance tables ---

pub fn perf_summary_table(results: &[PerfComparison], load_level: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', 120));
    let _ = writeln!(out, "Performance Benchmark: ADK vs CrewAI (Load={load_level})");
    let _ = writeln!(out, "{}", rule('=', 120));
    let _ = writeln!(
        out,
        "{:<30} {:<10} {:<8} {:<12} {:<12} {:<8} {:<8} {:<8} {:<8}",
        "Pattern", "Framework", "Ops", "Time(ms)", "Throughput", "P50", "P95", "P99", "Success"
    );
    let _ = writeln!(out, "{}", rule('=', 120));

    for r in results.iter().filter(|r| r.load_level == load_level) {
        for m in r.metrics() {
            let _ = writeln!(
                out,
                "{:<30} {:<10} {:<8} {:<12} {:<12.2} {:<8.0} {:<8.0} {:<8.0} {:<8}",
                m.pattern_name,
                m.framework.as_str().to_uppercase(),
                m.total_operations,
                thousands(m.execution_time_ms.round() as u64),
                m.throughput_ops_per_sec,
                m.latency.p50_ms,
                m.latency.p95_ms,
                m.latency.p99_ms,
                format!("{:.1}%", m.success_rate * 100.0)
            );
        }
        let _ = writeln!(out, "{}", rule('-', 120));
    }
    out
}

pub fn latency_table(results: &[PerfComparison]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', 120));
    let _ = writeln!(out, "Latency Distribution Comparison");
    let _ = writeln!(out, "{}", rule('=', 120));
    let _ = writeln!(
        out,
        "{:<30} {:<6} {:<10} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "Pattern", "Load", "Framework", "Min", "Mean", "P50", "P95", "P99", "Max", "StdDev"
    );
    let _ = writeln!(out, "{}", rule('=', 120));

    let mut sorted: Vec<&PerfComparison> = results.iter().collect();
    // stable: keeps pattern order, groups loads ascending
    sorted.sort_by_key(|r| {
        (
            results.iter().position(|x| x.pattern == r.pattern).unwrap_or(0),
            r.load_level,
        )
    });

    let mut previous: Option<&str> = None;
    for r in sorted {
        if previous.is_some_and(|p| p != r.pattern) {
            let _ = writeln!(out, "{}", rule('-', 120));
        }
        previous = Some(r.pattern);
        for m in r.metrics() {
            let l = &m.latency;
            let _ = writeln!(
                out,
                "{:<30} {:<6} {:<10} {:<8.0} {:<8.0} {:<8.0} {:<8.0} {:<8.0} {:<8.0} {:<8.0}",
                m.pattern_name,
                r.load_level,
                m.framework.as_str().to_uppercase(),
                l.min_ms,
                l.mean_ms,
                l.p50_ms,
                l.p95_ms,
                l.p99_ms,
                l.max_ms,
                l.stddev_ms
            );
        }
    }
    let _ = writeln!(out, "{}", rule('-', 120));
    out
}

// --- JSON ---

pub fn cost_json(results: &[CostComparison], now: &DateTime<Local>) -> Result<Value, BenchError> {
    let mut patterns = Map::new();
    for r in results {
        patterns.insert(r.pattern.to_string(), serde_json::to_value([&r.adk, &r.crewai])?);
    }
    Ok(json!({
        "timestamp": now.to_rfc3339(),
        "patterns": patterns,
    }))
}

pub fn perf_json(results: &[PerfComparison], now: &DateTime<Local>) -> Result<Value, BenchError> {
    let mut patterns = Map::new();
    for r in results {
        let by_load = patterns
            .entry(r.pattern.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(loads) = by_load {
            loads.insert(r.load_level.to_string(), serde_json::to_value([&r.adk, &r.crewai])?);
        }
    }
    Ok(json!({
        "timestamp": now.to_rfc3339(),
        "patterns": patterns,
    }))
}

// --- CSV ---

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_row(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

const COST_CSV_HEADER: [&str; 12] = [
    "Pattern",
    "Framework",
    "Model",
    "Iterations",
    "API Calls",
    "Input Tokens",
    "Output Tokens",
    "Total Tokens",
    "Execution Time (ms)",
    "Estimated Cost (USD)",
    "Cost per Iteration (USD)",
    "Tokens per Iteration",
];

const PERF_CSV_HEADER: [&str; 16] = [
    "Pattern",
    "Framework",
    "Load Level",
    "Iterations",
    "Total Operations",
    "Execution Time (ms)",
    "Throughput (ops/s)",
    "Min (ms)",
    "Mean (ms)",
    "Median (ms)",
    "P50 (ms)",
    "P95 (ms)",
    "P99 (ms)",
    "Max (ms)",
    "StdDev (ms)",
    "Success Rate",
];

pub fn cost_csv(results: &[CostComparison]) -> String {
    let header: Vec<String> = COST_CSV_HEADER.iter().map(|h| h.to_string()).collect();
    let mut out = csv_row(&header);
    for r in results {
        for m in r.metrics() {
            out.push_str(&csv_row(&[
                m.pattern_name.clone(),
                m.framework.as_str().to_string(),
                m.model.clone(),
                m.iterations.to_string(),
                m.api_calls.to_string(),
                m.tokens.input_tokens.to_string(),
                m.tokens.output_tokens.to_string(),
                m.tokens.total_tokens.to_string(),
                format!("{:.2}", m.execution_time_ms),
                format!("{:.6}", m.estimated_cost_usd),
                format!("{:.6}", m.cost_per_iteration),
                m.tokens_per_iteration.to_string(),
            ]));
        }
    }
    out
}

pub fn perf_csv(results: &[PerfComparison]) -> String {
    let header: Vec<String> = PERF_CSV_HEADER.iter().map(|h| h.to_string()).collect();
    let mut out = csv_row(&header);
    for r in results {
        for m in r.metrics() {
            let l = &m.latency;
            out.push_str(&csv_row(&[
                m.pattern_name.clone(),
                m.framework.as_str().to_string(),
                m.load_level.to_string(),
                m.iterations.to_string(),
                m.total_operations.to_string(),
                format!("{:.2}", m.execution_time_ms),
                format!("{:.2}", m.throughput_ops_per_sec),
                format!("{:.2}", l.min_ms),
                format!("{:.2}", l.mean_ms),
                format!("{:.2}", l.median_ms),
                format!("{:.2}", l.p50_ms),
                format!("{:.2}", l.p95_ms),
                format!("{:.2}", l.p99_ms),
                format!("{:.2}", l.max_ms),
                format!("{:.2}", l.stddev_ms),
                format!("{:.4}", m.success_rate),
            ]));
        }
    }
    out
}

// --- Export ---

fn write_file(path: &Path, contents: &str) -> Result<PathBuf, BenchError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    info!(path = %path.display(), "Exported benchmark results");
    Ok(path.to_path_buf())
}

fn export(
    dir: &Path,
    prefix: &str,
    format: ExportFormat,
    now: &DateTime<Local>,
    json: impl FnOnce() -> Result<Value, BenchError>,
    csv: impl FnOnce() -> String,
) -> Result<Vec<PathBuf>, BenchError> {
    let stamp = file_stamp(now);
    let mut written = Vec::new();
    if format.includes_json() {
        let body = serde_json::to_string_pretty(&json()?)?;
        written.push(write_file(&dir.join(format!("{prefix}_{stamp}.json")), &body)?);
    }
    if format.includes_csv() {
        written.push(write_file(&dir.join(format!("{prefix}_{stamp}.csv")), &csv())?);
    }
    Ok(written)
}

/// Write `cost_analysis_<stamp>.{json,csv}` into `dir`.
pub fn export_cost(
    results: &[CostComparison],
    dir: &Path,
    format: ExportFormat,
    now: &DateTime<Local>,
) -> Result<Vec<PathBuf>, BenchError> {
    export(
        dir,
        "cost_analysis",
        format,
        now,
        || cost_json(results, now),
        || cost_csv(results),
    )
}

/// Write `performance_<stamp>.{json,csv}` into `dir`.
pub fn export_perf(
    results: &[PerfComparison],
    dir: &Path,
    format: ExportFormat,
    now: &DateTime<Local>,
) -> Result<Vec<PathBuf>, BenchError> {
    export(
        dir,
        "performance",
        format,
        now,
        || perf_json(results, now),
        || perf_csv(results),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::cost::CostSimulator;
    use crate::model::{LatencyStats, PerformanceMetrics};
    use chrono::TimeZone;
    use patternlab_core::Framework;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 20, 14, 30, 5).unwrap()
    }

    fn cost_results() -> Vec<CostComparison> {
        let patterns = catalog::parse_filter(Some("learning_adaptation,prioritization")).unwrap();
        CostSimulator::default().run_comparison(&patterns, "gpt-4").unwrap()
    }

    fn perf_metrics(framework: Framework, load_level: u32) -> PerformanceMetrics {
        PerformanceMetrics {
            pattern_name: "Prioritization".into(),
            framework,
            load_level,
            iterations: 3,
            total_operations: 3 * u64::from(load_level),
            execution_time_ms: 1234.5,
            throughput_ops_per_sec: 2.43,
            latency: LatencyStats::from_samples(&[300.0, 340.0, 380.0]),
            success_rate: 1.0,
        }
    }

    fn perf_results() -> Vec<PerfComparison> {
        [1, 5]
            .into_iter()
            .map(|load| PerfComparison {
                pattern: "prioritization",
                load_level: load,
                adk: perf_metrics(Framework::Adk, load),
                crewai: perf_metrics(Framework::CrewAi, load),
            })
            .collect()
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(24_000), "24,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn export_format_parses() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("both".parse::<ExportFormat>().unwrap().includes_csv());
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn cost_tables_render_rows() {
        let results = cost_results();
        let table = cost_summary_table(&results);
        assert!(table.contains("Learning & Adaptation"));
        assert!(table.contains("CREWAI"));
        assert!(table.contains("24,000"));

        let agg = cost_aggregate_table(&CostAggregate::from_results(&results));
        assert!(agg.contains("AGGREGATE STATISTICS"));
        assert!(agg.contains("Total API Calls"));
        // 26 ADK calls vs 39 CrewAI calls
        assert!(agg.contains("-33.33%"));
    }

    #[test]
    fn cost_csv_has_header_and_two_rows_per_pattern() {
        let csv = cost_csv(&cost_results());
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Pattern,Framework,Model,Iterations"));
        // pattern name has no comma, but "&" passes through unquoted
        assert!(lines[1].starts_with("Learning & Adaptation,adk,gpt-4,10,20,16000,8000,24000,"));
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn cost_json_shape() {
        let doc = cost_json(&cost_results(), &fixed_now()).unwrap();
        let pattern = &doc["patterns"]["prioritization"];
        assert_eq!(pattern.as_array().unwrap().len(), 2);
        assert_eq!(pattern[0]["framework"], json!("adk"));
        assert_eq!(pattern[1]["framework"], json!("crewai"));
        assert_eq!(pattern[0]["tokens"]["total_tokens"], json!(3600));
        assert!(doc["timestamp"].as_str().unwrap().starts_with("2025-01-20T14:30:05"));
    }

    #[test]
    fn perf_json_groups_by_load() {
        let doc = perf_json(&perf_results(), &fixed_now()).unwrap();
        let loads = doc["patterns"]["prioritization"].as_object().unwrap();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads["5"][0]["total_operations"], json!(15));
    }

    #[test]
    fn perf_tables_filter_by_load() {
        let results = perf_results();
        let summary = perf_summary_table(&results, 5);
        assert!(summary.contains("(Load=5)"));
        assert_eq!(summary.matches("Prioritization").count(), 2);
        assert!(summary.contains("100.0%"));

        let latency = latency_table(&results);
        assert_eq!(latency.matches("Prioritization").count(), 4);
    }

    #[test]
    fn export_writes_timestamped_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let written = export_cost(&cost_results(), &out, ExportFormat::Both, &fixed_now()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["cost_analysis_20250120_143005.json", "cost_analysis_20250120_143005.csv"]
        );
        let body: Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(body["patterns"].as_object().unwrap().len(), 2);

        let perf = export_perf(&perf_results(), &out, ExportFormat::Csv, &fixed_now()).unwrap();
        assert_eq!(perf.len(), 1);
        assert!(perf[0].ends_with("performance_20250120_143005.csv"));
    }
}
