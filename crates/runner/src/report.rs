//! Markdown and JSON run reports.

use crate::RunnerError;
use crate::runner::{FrameworkTally, RunSummary};
use chrono::Local;
use patternlab_core::Framework;
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
    Both,
}

impl FromStr for ReportFormat {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "both" => Ok(Self::Both),
            _ => Err(RunnerError::InvalidFormat(s.to_string())),
        }
    }
}

fn tally_row(out: &mut String, label: &str, t: &FrameworkTally) {
    let _ = writeln!(
        out,
        "| {label} | {} | {} | {} | {} | {:.1}% |",
        t.total,
        t.passed,
        t.failed,
        t.timeout,
        t.pass_rate()
    );
}

pub fn render_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Pattern Test Report\n");
    let _ = writeln!(out, "- Run: `{}`", summary.run_id);
    let _ = writeln!(out, "- Started: {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        let _ = writeln!(out, "- Finished: {}", finished.to_rfc3339());
    }

    let _ = writeln!(out, "\n## Summary\n");
    let _ = writeln!(out, "| Framework | Total | Passed | Failed | Timeout | Pass Rate |");
    let _ = writeln!(out, "|-----------|-------|--------|--------|---------|-----------|");
    for framework in Framework::ALL {
        tally_row(&mut out, framework.label(), &summary.tally(framework));
    }
    tally_row(&mut out, "**Total**", &summary.totals());

    for (category, results) in summary.by_category() {
        let _ = writeln!(out, "\n## {category}\n");
        let _ = writeln!(out, "| Script | Framework | Status | Duration (s) |");
        let _ = writeln!(out, "|--------|-----------|--------|--------------|");
        for r in results {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {:.1} |",
                r.script.relative,
                r.script.framework.label(),
                r.outcome.status.label(),
                r.outcome.duration_secs
            );
        }
    }

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\n## Failure Details");
        for r in failures {
            let _ = writeln!(out, "\n### `{}` ({})\n", r.script.relative, r.outcome.status.label());
            if let Some(code) = r.outcome.exit_code {
                let _ = writeln!(out, "Exit code: {code}\n");
            }
            let text = r.outcome.error.as_deref().unwrap_or("(no output)");
            let fence = fence_for(text);
            let _ = writeln!(out, "{fence}text");
            let _ = writeln!(out, "{text}");
            let _ = writeln!(out, "{fence}");
        }
    }
    out
}

/// A backtick fence longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// `summary` keyed by framework, `categories` keyed by category then
/// script path.
pub fn to_json(summary: &RunSummary) -> Result<Value, RunnerError> {
    let mut frameworks = Map::new();
    for framework in Framework::ALL {
        frameworks.insert(framework.as_str().to_string(), serde_json::to_value(summary.tally(framework))?);
    }
    frameworks.insert("total".to_string(), serde_json::to_value(summary.totals())?);

    let mut categories = Map::new();
    for (category, results) in summary.by_category() {
        let mut scripts = Map::new();
        for r in results {
            let mut entry = serde_json::to_value(&r.outcome)?;
            if let Value::Object(fields) = &mut entry {
                fields.insert("framework".into(), json!(r.script.framework));
            }
            scripts.insert(r.script.relative.clone(), entry);
        }
        categories.insert(category.to_string(), Value::Object(scripts));
    }

    Ok(json!({
        "generated_at": summary.finished_at.unwrap_or(summary.started_at).to_rfc3339(),
        "run_id": summary.run_id,
        "summary": frameworks,
        "categories": categories,
    }))
}

/// Write `test_report_<stamp>.{md,json}` into `dir`.
pub fn write_reports(
    summary: &RunSummary,
    dir: &Path,
    format: ReportFormat,
) -> Result<Vec<PathBuf>, RunnerError> {
    std::fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut written = Vec::new();

    if matches!(format, ReportFormat::Markdown | ReportFormat::Both) {
        let path = dir.join(format!("test_report_{stamp}.md"));
        std::fs::write(&path, render_markdown(summary))?;
        written.push(path);
    }
    if matches!(format, ReportFormat::Json | ReportFormat::Both) {
        let path = dir.join(format!("test_report_{stamp}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&to_json(summary)?)?)?;
        written.push(path);
    }

    for path in &written {
        info!(path = %path.display(), "Wrote test report");
    }
    Ok(written)
}
