//! `patternlab run`: execute pattern scripts and write a report.

use patternlab_config::AppConfig;
use patternlab_core::Framework;
use patternlab_runner::report::write_reports;
use patternlab_runner::{DiscoveryFilter, ReportFormat, RunSummary, TestRunner, discover};
use std::path::PathBuf;

pub struct RunOptions {
    pub category: Option<String>,
    pub framework: Option<String>,
    pub root: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub format: String,
    pub list: bool,
}

pub async fn run(config: &AppConfig, opts: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let format: ReportFormat = opts.format.parse()?;
    let root = opts
        .root
        .unwrap_or_else(|| PathBuf::from(&config.runner.catalog_root));
    let filter = DiscoveryFilter::parse(opts.category.as_deref(), opts.framework.as_deref())?;
    let scripts = discover(&root, &filter)?;

    if scripts.is_empty() {
        println!("No pattern scripts found under {}", root.display());
        return Ok(());
    }

    if opts.list {
        println!("{:<70} {:<8} {:>8}", "Script", "Framework", "Timeout");
        println!("{}", "-".repeat(88));
        for s in &scripts {
            println!(
                "{:<70} {:<8} {:>7}s",
                s.relative,
                s.framework.label(),
                config.runner.timeout_for(&s.relative).as_secs()
            );
        }
        println!("\n{} scripts", scripts.len());
        return Ok(());
    }

    println!("🧪 Running {} pattern scripts from {}", scripts.len(), root.display());
    let runner = TestRunner::from_config(&config.runner);
    let summary = runner.run(&scripts).await;

    print_summary(&summary);

    let report_dir = opts
        .report_dir
        .unwrap_or_else(|| PathBuf::from(&config.runner.report_dir));
    for path in write_reports(&summary, &report_dir, format)? {
        println!("📄 {}", path.display());
    }

    let failures = summary.failures().count();
    if failures > 0 {
        return Err(format!("{failures} of {} pattern scripts did not pass", scripts.len()).into());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "{:<10} {:>6} {:>6} {:>6} {:>8} {:>8}",
        "Framework", "Total", "Pass", "Fail", "Timeout", "Rate"
    );
    println!("{}", "-".repeat(50));
    for framework in Framework::ALL {
        let t = summary.tally(framework);
        println!(
            "{:<10} {:>6} {:>6} {:>6} {:>8} {:>7.1}%",
            framework.label(),
            t.total,
            t.passed,
            t.failed,
            t.timeout,
            t.pass_rate()
        );
    }

    for r in summary.failures() {
        println!(
            "  ❌ {} [{}] {}",
            r.script.relative,
            r.outcome.status,
            r.outcome
                .error
                .as_deref()
                .and_then(|e| e.lines().last())
                .unwrap_or("")
        );
    }
    println!();
}
