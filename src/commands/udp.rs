//! `udp`: UDP throughput, packet loss and jitter charts.

use super::{collect, read_text, Context, LogKind, Source};
use crate::analysis::{group_by_case, series_y_range, stats, x_range, y_range, AxisRange, Scale};
use crate::config::{Config, PlotConfig, UdpConfig};
use crate::models::{CaseKey, IpVersion, UdpRun};
use crate::parser::IperfReport;
use crate::report::chart::{Figure, HLine, Line, Note, Panel, PlotSeries};
use crate::report::{render_figure, Palette};
use crate::scanner::ScanConfig;
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::info;

const X_LABEL: &str = "Time [s]";

type Runs = BTreeMap<CaseKey, Vec<UdpRun>>;

pub fn sources(config: &Config) -> Vec<Source> {
    let udp = &config.udp;
    vec![Source::single(
        "UDP",
        &udp.folder,
        ScanConfig::iperf(&udp.durations),
        LogKind::Iperf,
    )]
}

pub fn run(ctx: &Context<'_>) -> Result<i32> {
    let udp = &ctx.config.udp;
    println!("📥 Reading iperf3 UDP reports from {}", udp.folder.display());

    let runs = collect(ctx, &sources(ctx.config), |_, file, name| {
        let content = read_text(&file.path)?;
        let report = IperfReport::from_json(&content)?;
        let run = UdpRun {
            series: report.interval_series(&name.namespace, &name.namespace),
            lost_percent: report.lost_percent(),
            jitter_ms: report.jitter_ms(),
        };
        Ok((CaseKey::new(name.ip_version, name.duration), run))
    })?;
    info!("Parsed {} UDP runs", runs.len());

    let runs: Runs = group_by_case(runs);
    let output_dir = ctx.prepare_output_dir()?;

    let figures = [
        (
            "udp_throughput_over_time.svg",
            throughput_figure(udp, &ctx.config.plot, &ctx.palette, &runs),
        ),
        (
            "udp_loss_pct_over_time.svg",
            overall_figure(udp, &ctx.config.plot, &ctx.palette, &runs, Metric::Loss),
        ),
        (
            "udp_jitter_over_time.svg",
            overall_figure(udp, &ctx.config.plot, &ctx.palette, &runs, Metric::Jitter),
        ),
    ];

    for (file_name, figure) in &figures {
        let path = output_dir.join(file_name);
        render_figure(&path, figure)?;
        println!("✅ UDP plot saved to {}", path.display());
    }

    Ok(0)
}

/// Overall figure reported once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Loss,
    Jitter,
}

impl Metric {
    fn value(&self, run: &UdpRun) -> Option<f64> {
        match self {
            Metric::Loss => run.lost_percent,
            Metric::Jitter => run.jitter_ms,
        }
    }

    fn panel_prefix(&self) -> &'static str {
        match self {
            Metric::Loss => "Loss %",
            Metric::Jitter => "Jitter",
        }
    }

    fn y_label(&self) -> &'static str {
        match self {
            Metric::Loss => "Loss [%]",
            Metric::Jitter => "Jitter [ms]",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Metric::Loss => "UDP Packet Loss (%) for Each Scenario (overall only)",
            Metric::Jitter => "UDP Jitter for Each Scenario (overall only)",
        }
    }
}

fn empty_panel(ip: IpVersion, duration: &str, y_label: &str) -> Panel {
    Panel::new(
        format!("No data: {}, {}", ip, duration),
        X_LABEL,
        y_label,
        Scale::Linear,
        AxisRange::fallback(Scale::Linear),
        AxisRange::fallback(Scale::Linear),
    )
}

fn grid(udp: &UdpConfig, plot: &PlotConfig, title: &str, panels: Vec<Panel>) -> Figure {
    Figure {
        title: vec![title.to_string()],
        rows: 2,
        cols: udp.durations.len().max(1),
        panel_size: (plot.width, plot.height),
        panels,
    }
}

/// Throughput per run with a dashed mean line and loss/jitter notes.
fn throughput_figure(udp: &UdpConfig, plot: &PlotConfig, palette: &Palette, runs: &Runs) -> Figure {
    const Y_LABEL: &str = "Throughput [Gbit/s]";
    let mut panels = Vec::new();

    for ip in IpVersion::ALL {
        for duration in &udp.durations {
            let Some(case) = runs
                .get(&CaseKey::new(ip, duration.as_str()))
                .filter(|c| !c.is_empty())
            else {
                panels.push(empty_panel(ip, duration, Y_LABEL));
                continue;
            };

            let series: Vec<_> = case.iter().map(|r| r.series.clone()).collect();
            let mut panel = Panel::new(
                format!("Throughput: {}, {}", ip, duration),
                X_LABEL,
                Y_LABEL,
                Scale::Linear,
                x_range(&series, plot.x_margin),
                series_y_range(&series, Scale::Linear, plot.y_margin)
                    .unwrap_or_else(|| AxisRange::fallback(Scale::Linear)),
            );

            for run in case {
                let namespace = &run.series.namespace;
                let color = palette.transition(namespace);
                let points = run.series.finite_points(false);

                panel.series.push(
                    PlotSeries::new(namespace, color, run.series.points.clone()).line(Line::Solid),
                );

                let mean = stats::mean(&run.series.values()).unwrap_or(0.0);
                panel.mean_lines.push(HLine { y: mean, color });

                let Some(&(mid_x, _)) = points.get(points.len() / 2) else {
                    continue;
                };
                if let Some(loss) = run.lost_percent.filter(|l| *l > 0.0) {
                    panel.notes.push(Note {
                        x: mid_x,
                        y: mean,
                        text: format!("{:.3}% loss", loss),
                        color,
                    });
                }
                if let Some(jitter) = run.jitter_ms.filter(|j| *j > 0.0) {
                    panel.notes.push(Note {
                        x: mid_x,
                        y: mean * 0.95,
                        text: format!("Jitter: {:.3}ms", jitter),
                        color,
                    });
                }
            }

            panels.push(panel);
        }
    }

    grid(udp, plot, "UDP Throughput Over Time for Each Scenario", panels)
}

/// The run's overall loss or jitter drawn flat across its intervals.
fn overall_figure(
    udp: &UdpConfig,
    plot: &PlotConfig,
    palette: &Palette,
    runs: &Runs,
    metric: Metric,
) -> Figure {
    let mut panels = Vec::new();

    for ip in IpVersion::ALL {
        for duration in &udp.durations {
            let Some(case) = runs
                .get(&CaseKey::new(ip, duration.as_str()))
                .filter(|c| !c.is_empty())
            else {
                panels.push(empty_panel(ip, duration, metric.y_label()));
                continue;
            };

            let flat: Vec<PlotSeries> = case
                .iter()
                .filter_map(|run| {
                    let value = metric.value(run)?;
                    let points = run
                        .series
                        .points
                        .iter()
                        .map(|(x, _)| (*x, value))
                        .collect();
                    Some(
                        PlotSeries::new(
                            &run.series.namespace,
                            palette.transition(&run.series.namespace),
                            points,
                        )
                        .marker(None)
                        .line(Line::Solid),
                    )
                })
                .collect();

            let series: Vec<_> = case.iter().map(|r| r.series.clone()).collect();
            let values: Vec<f64> = case.iter().filter_map(|r| metric.value(r)).collect();

            let mut panel = Panel::new(
                format!("{}: {}, {}", metric.panel_prefix(), ip, duration),
                X_LABEL,
                metric.y_label(),
                Scale::Linear,
                x_range(&series, plot.x_margin),
                y_range(&values, Scale::Linear, plot.y_margin)
                    .unwrap_or_else(|| AxisRange::fallback(Scale::Linear)),
            );
            panel.series = flat;
            panels.push(panel);
        }
    }

    grid(udp, plot, metric.title(), panels)
}
