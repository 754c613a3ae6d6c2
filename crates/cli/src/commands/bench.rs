//! `patternlab bench`: cost and performance tables.

use chrono::Local;
use patternlab_bench::perf::parse_load_levels;
use patternlab_bench::report::{
    cost_aggregate_table, cost_summary_table, export_cost, export_perf, latency_table,
    perf_summary_table,
};
use patternlab_bench::{
    CostAggregate, CostSimulator, ExportFormat, PerfSettings, PerformanceSimulator, PricingTable,
    catalog,
};
use patternlab_config::AppConfig;
use std::path::{Path, PathBuf};

const DISCLAIMER: &str =
    "Note: figures are simulated from fixed formulas, not measured from real model calls.";

pub struct PerfOptions {
    pub patterns: Option<String>,
    pub load: Option<String>,
    pub export: Option<String>,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
    pub time_scale: Option<f64>,
}

fn export_target(
    config: &AppConfig,
    export: Option<&str>,
    output: Option<PathBuf>,
) -> Result<Option<(ExportFormat, PathBuf)>, Box<dyn std::error::Error>> {
    let Some(raw) = export else {
        return Ok(None);
    };
    let format: ExportFormat = raw.parse()?;
    let dir = output.unwrap_or_else(|| PathBuf::from(&config.bench.output_dir));
    Ok(Some((format, dir)))
}

fn print_written(paths: &[PathBuf], dir: &Path) {
    println!("💾 Exported {} file(s) to {}", paths.len(), dir.display());
    for p in paths {
        println!("   {}", p.display());
    }
}

pub fn cost(
    config: &AppConfig,
    patterns: Option<String>,
    model: Option<String>,
    export: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selected = catalog::parse_filter(patterns.as_deref())?;
    let target = export_target(config, export.as_deref(), output)?;
    let model = model.unwrap_or_else(|| config.bench.default_model.clone());

    let simulator = CostSimulator::new(PricingTable::with_overrides(&config.bench.custom_pricing));
    let results = simulator.run_comparison(&selected, &model)?;

    println!("💰 Cost Analysis: ADK vs CrewAI (model: {model})");
    println!("{}", cost_summary_table(&results));
    println!("{}", cost_aggregate_table(&CostAggregate::from_results(&results)));
    println!("{DISCLAIMER}");

    if let Some((format, dir)) = target {
        let written = export_cost(&results, &dir, format, &Local::now())?;
        print_written(&written, &dir);
    }
    Ok(())
}

pub async fn perf(config: &AppConfig, opts: PerfOptions) -> Result<(), Box<dyn std::error::Error>> {
    let selected = catalog::parse_filter(opts.patterns.as_deref())?;
    let target = export_target(config, opts.export.as_deref(), opts.output)?;
    let load_levels = match opts.load.as_deref() {
        Some(raw) => parse_load_levels(raw)?,
        None => config.bench.load_levels.clone(),
    };

    let mut settings = PerfSettings::from(&config.bench);
    if let Some(seed) = opts.seed {
        settings.seed = Some(seed);
    }
    if let Some(scale) = opts.time_scale {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(format!("--time-scale must be a finite number > 0, got {scale}").into());
        }
        settings.time_scale = scale;
    }

    println!(
        "⚡ Performance Benchmark: {} pattern(s) at load {:?}",
        selected.len(),
        load_levels
    );
    let mut simulator = PerformanceSimulator::new(settings);
    let results = simulator.run_comparison(&selected, &load_levels).await?;

    for &load in &load_levels {
        println!("{}", perf_summary_table(&results, load));
    }
    println!("{}", latency_table(&results));
    println!("{DISCLAIMER}");

    if let Some((format, dir)) = target {
        let written = export_perf(&results, &dir, format, &Local::now())?;
        print_written(&written, &dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_export_without_flag() {
        let config = AppConfig::default();
        assert!(export_target(&config, None, None).unwrap().is_none());
    }

    #[test]
    fn export_defaults_to_configured_dir() {
        let config = AppConfig::default();
        let (format, dir) = export_target(&config, Some("csv"), None).unwrap().unwrap();
        assert_eq!(format, ExportFormat::Csv);
        assert_eq!(dir, PathBuf::from("results"));
        assert!(export_target(&config, Some("xml"), None).is_err());
    }

    #[test]
    fn cost_exports_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        cost(
            &AppConfig::default(),
            Some("prioritization".into()),
            Some("gpt-4".into()),
            Some("json".into()),
            Some(dir.path().to_path_buf()),
        )
        .unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn infinite_time_scale_is_rejected() {
        let opts = PerfOptions {
            patterns: Some("prioritization".into()),
            load: Some("1".into()),
            export: None,
            output: None,
            seed: Some(1),
            time_scale: Some(f64::INFINITY),
        };
        let err = perf(&AppConfig::default(), opts).await.unwrap_err();
        assert!(err.to_string().contains("--time-scale"));
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        let err = cost(&AppConfig::default(), Some("nope".into()), None, None, None).unwrap_err();
        assert!(err.to_string().contains("prioritization"));
    }
}
