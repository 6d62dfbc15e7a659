//! `throughput-summary`: TCP throughput statistics across scenarios.

use super::{collect, comparison_bars, print_insights, Context, LogKind, Source};
use crate::config::{Config, PlotConfig, Scenario, ThroughputSummaryConfig};
use crate::models::{IpVersion, ThroughputRecord};
use crate::parser::IperfReport;
use crate::report::chart::{BarGrid, BarPanel, ValueLabel};
use crate::report::table::{
    generate_console_table, generate_json_summary, generate_latex_table, sort_throughput_records,
    throughput_insights, write_csv, write_text, SummaryTable, TableKind,
};
use crate::report::{render_bar_grid, Palette};
use crate::scanner::ScanConfig;
use anyhow::Result;
use tracing::{debug, info};

pub fn sources(config: &Config) -> Vec<Source> {
    let summary = &config.throughput_summary;
    summary
        .scenarios
        .iter()
        .map(|scenario| {
            Source::scenario(scenario, ScanConfig::iperf(&summary.durations), LogKind::Iperf)
                .with_protocol("tcp")
        })
        .collect()
}

pub fn run(ctx: &Context<'_>) -> Result<i32> {
    let summary = &ctx.config.throughput_summary;
    println!("📥 Collecting throughput data from all scenarios...");

    let mut records = collect(ctx, &sources(ctx.config), |source, file, name| {
        let report = IperfReport::load(&file.path)?;
        Ok(ThroughputRecord {
            scenario: source.scenario.clone(),
            file: file.file_name.clone(),
            name,
            stats: report.tcp_summary()?,
        })
    })?;
    println!("Collected {} measurements", records.len());

    if records.is_empty() {
        println!("No data collected!");
        return Ok(0);
    }

    let names: Vec<String> = summary.scenarios.iter().map(|s| s.name.clone()).collect();
    sort_throughput_records(&mut records, &names, &summary.durations);

    let table = SummaryTable::throughput(&records);
    print!("{}", generate_console_table(&table));

    let output_dir = ctx.prepare_output_dir()?;
    let stem = TableKind::Throughput.file_stem();

    let csv_path = output_dir.join(format!("{}.csv", stem));
    write_csv(&table, &csv_path)?;
    println!("\nSummary table saved to: {}", csv_path.display());

    let tex_path = output_dir.join(format!("{}.tex", stem));
    write_text(&tex_path, &generate_latex_table(&table))?;
    println!("LaTeX table saved to: {}", tex_path.display());

    let json_path = output_dir.join(format!("{}.json", stem));
    write_text(
        &json_path,
        &generate_json_summary(TableKind::Throughput, &names, &records)?,
    )?;
    println!("JSON summary saved to: {}", json_path.display());

    for duration in &summary.durations {
        let of_duration = records_of_duration(&records, duration);

        let Some(grid) = build_bar_grid(summary, &ctx.config.plot, &ctx.palette, &of_duration)
        else {
            debug!("No throughput data for {}", duration);
            continue;
        };

        let plot_path = output_dir.join(format!("throughput_comparison_summary_{}.svg", duration));
        render_bar_grid(&plot_path, &grid)?;
        info!("Rendered {} comparison panels for {}", grid.panels.len(), duration);
        println!(
            "Throughput comparison plot ({}) saved to {}",
            duration,
            plot_path.display()
        );
    }

    print_insights(&duration_insights(&summary.durations, &records));

    Ok(0)
}

fn records_of_duration(records: &[ThroughputRecord], duration: &str) -> Vec<ThroughputRecord> {
    records
        .iter()
        .filter(|r| r.name.duration == duration)
        .cloned()
        .collect()
}

/// Insight lines under a heading per configured duration, with or
/// without data.
fn duration_insights(durations: &[String], records: &[ThroughputRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    for duration in durations {
        lines.push(format!("\n{} DURATION:", duration.to_uppercase()));
        lines.extend(throughput_insights(&records_of_duration(records, duration)));
    }
    lines
}

/// Scenarios with at least one record, in configured order.
fn scenarios_with_data<'a>(
    summary: &'a ThroughputSummaryConfig,
    records: &[ThroughputRecord],
) -> Vec<&'a Scenario> {
    summary
        .scenarios
        .iter()
        .filter(|s| records.iter().any(|r| r.scenario == s.name))
        .collect()
}

/// Bar grid of one duration's records; `None` when no scenario has data.
fn build_bar_grid(
    summary: &ThroughputSummaryConfig,
    plot: &PlotConfig,
    palette: &Palette,
    records: &[ThroughputRecord],
) -> Option<BarGrid> {
    let scenarios = scenarios_with_data(summary, records);
    if scenarios.is_empty() {
        return None;
    }

    let mut panels = Vec::new();
    for ip in IpVersion::ALL {
        for scenario in &scenarios {
            panels.push(BarPanel {
                title: format!("{} - {}", scenario.display(), ip.role()),
                x_label: Some("Translation Tool".to_string()),
                y_label: "Throughput (Gbps)".to_string(),
                bars: comparison_bars(records, scenario, ip, palette),
                value_label: ValueLabel::GBITS,
            });
        }
    }

    Some(BarGrid {
        title: Vec::new(),
        rows: 2,
        cols: scenarios.len(),
        panel_size: (plot.width, plot.height),
        panels,
    })
}
