//! `rtt-summary`: RTT statistics across scenarios as tables and bars.

use super::{collect, comparison_bars, print_insights, read_text, Context, LogKind, Source};
use crate::config::{Config, PlotConfig, RttSummaryConfig};
use crate::models::{IpVersion, RttRecord};
use crate::parser::parse_ping_summary;
use crate::report::chart::{BarGrid, BarPanel, ValueLabel};
use crate::report::table::{
    generate_console_table, generate_json_summary, generate_latex_table, rtt_insights,
    sort_rtt_records, write_csv, write_text, SummaryTable, TableKind,
};
use crate::report::{render_bar_grid, Palette};
use crate::scanner::ScanConfig;
use anyhow::Result;
use tracing::info;

pub fn sources(config: &Config) -> Vec<Source> {
    let summary = &config.rtt_summary;
    summary
        .scenarios
        .iter()
        .map(|scenario| {
            Source::scenario(
                scenario,
                ScanConfig::ping(std::slice::from_ref(&summary.duration)),
                LogKind::Ping,
            )
        })
        .collect()
}

pub fn run(ctx: &Context<'_>) -> Result<i32> {
    let summary = &ctx.config.rtt_summary;
    println!("📥 Collecting RTT data from all scenarios...");

    let mut records = collect(ctx, &sources(ctx.config), |source, file, name| {
        let content = read_text(&file.path)?;
        Ok(RttRecord {
            scenario: source.scenario.clone(),
            file: file.file_name.clone(),
            name,
            stats: parse_ping_summary(&content)?,
        })
    })?;
    println!("Collected {} measurements", records.len());

    if records.is_empty() {
        println!("No data collected!");
        return Ok(0);
    }

    let names: Vec<String> = summary.scenarios.iter().map(|s| s.name.clone()).collect();
    sort_rtt_records(&mut records, &names);

    let table = SummaryTable::rtt(&records);
    print!("{}", generate_console_table(&table));

    let output_dir = ctx.prepare_output_dir()?;
    let stem = TableKind::Rtt.file_stem();

    let csv_path = output_dir.join(format!("{}.csv", stem));
    write_csv(&table, &csv_path)?;
    println!("\nSummary table saved to: {}", csv_path.display());

    let tex_path = output_dir.join(format!("{}.tex", stem));
    write_text(&tex_path, &generate_latex_table(&table))?;
    println!("LaTeX table saved to: {}", tex_path.display());

    let json_path = output_dir.join(format!("{}.json", stem));
    write_text(
        &json_path,
        &generate_json_summary(TableKind::Rtt, &names, &records)?,
    )?;
    println!("JSON summary saved to: {}", json_path.display());

    let grid = build_bar_grid(summary, &ctx.config.plot, &ctx.palette, &records);
    let plot_path = output_dir.join("rtt_comparison_summary.svg");
    render_bar_grid(&plot_path, &grid)?;
    info!("Rendered {} comparison panels", grid.panels.len());
    println!("Comparison plot saved to {}", plot_path.display());
    println!("  - Black error bars show min-max RTT range for each measurement");
    println!("  - Bar height shows average RTT, numbers on top show exact values");

    print_insights(&rtt_insights(&records));

    Ok(0)
}

/// IP version rows x scenario columns of average RTT bars.
fn build_bar_grid(
    summary: &RttSummaryConfig,
    plot: &PlotConfig,
    palette: &Palette,
    records: &[RttRecord],
) -> BarGrid {
    let mut panels = Vec::new();

    for ip in IpVersion::ALL {
        for scenario in &summary.scenarios {
            panels.push(BarPanel {
                title: format!("{} - {}", scenario.display(), ip.role()),
                x_label: None,
                y_label: "RTT (ms)".to_string(),
                bars: comparison_bars(records, scenario, ip, palette),
                value_label: ValueLabel::MILLIS_BARE,
            });
        }
    }

    BarGrid {
        title: Vec::new(),
        rows: 2,
        cols: summary.scenarios.len().max(1),
        panel_size: (plot.width, plot.height),
        panels,
    }
}
