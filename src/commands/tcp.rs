//! `tcp`: TCP throughput over time in four layouts.
//!
//! - grid: IP version rows x duration columns, limits per panel
//! - same-scale: the grid with one Y range per duration
//! - combined: one panel per duration carrying both IP versions
//! - dual-axis: one chart per duration, IPv6 left and IPv4 right
//!
//! Each layout is rendered with a linear and a log Y axis.

use super::{collect, read_text, Context, LogKind, Source};
use crate::analysis::{
    group_by_case, series_y_range, shared_y_per_duration, x_range, y_per_ip_version, AxisRange,
    Buckets, Scale,
};
use crate::cli::Layout;
use crate::config::{Config, PlotConfig, ThroughputConfig};
use crate::models::{display_namespace, CaseKey, IpVersion, Series, Tool};
use crate::parser::IperfReport;
use crate::report::chart::{Figure, Marker, Panel, PlotSeries, SecondaryAxis, ValueLabel};
use crate::report::{render_figure, Palette};
use crate::scanner::ScanConfig;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

const X_LABEL: &str = "Time [s]";
const Y_LABEL: &str = "Throughput [Gbit/s]";

pub fn sources(config: &Config) -> Vec<Source> {
    let tcp = &config.throughput;
    vec![Source::single(
        &tcp.scenario,
        &tcp.folder,
        ScanConfig::iperf(&tcp.durations),
        LogKind::Iperf,
    )]
}

pub fn run(ctx: &Context<'_>, layout: Layout) -> Result<i32> {
    let tcp = &ctx.config.throughput;
    println!("📥 Reading iperf3 reports from {}", tcp.folder.display());

    let series = collect(ctx, &sources(ctx.config), |_, file, name| {
        let content = read_text(&file.path)?;
        let report = IperfReport::from_json(&content)?;
        let series = report.throughput_series(&name.namespace, &name.namespace);
        Ok((CaseKey::new(name.ip_version, name.duration), series))
    })?;
    info!("Parsed {} throughput series", series.len());

    let buckets: Buckets = group_by_case(series);
    let charts = Charts {
        tcp,
        plot: &ctx.config.plot,
        palette: &ctx.palette,
        buckets: &buckets,
    };

    let output_dir = ctx.prepare_output_dir()?;
    for layout in layout.expand() {
        for scale in Scale::ALL {
            for (file_name, figure) in charts.build(layout, scale) {
                let path: PathBuf = output_dir.join(file_name);
                render_figure(&path, &figure)?;
                println!("✅ Throughput plot saved to {}", path.display());
            }
        }
    }

    Ok(0)
}

/// Legend label of a series in the same-scale layout.
fn same_scale_label(namespace: &str, ip: IpVersion) -> String {
    match (ip, Tool::from_namespace(namespace).hop_label()) {
        (IpVersion::V6, Some(hop)) => hop.to_string(),
        _ => display_namespace(namespace),
    }
}

/// Legend label of a series in the combined and dual-axis layouts.
fn comparison_label(namespace: &str, ip: IpVersion) -> String {
    let tool = Tool::from_namespace(namespace);
    match (ip, tool) {
        (_, Tool::Other) => format!("{} ({})", namespace, ip),
        (IpVersion::V4, _) => display_namespace(namespace),
        (IpVersion::V6, Tool::Tundra) => "1 Hop".to_string(),
        (IpVersion::V6, Tool::Jool) => "2 Hops".to_string(),
        (IpVersion::V6, Tool::Tayga) => format!("{} ({})", namespace, ip),
    }
}

fn marker_for(ip: IpVersion) -> Marker {
    match ip {
        IpVersion::V4 => Marker::Circle,
        IpVersion::V6 => Marker::Cross,
    }
}

/// Everything a layout needs to build its figures.
struct Charts<'a> {
    tcp: &'a ThroughputConfig,
    plot: &'a PlotConfig,
    palette: &'a Palette,
    buckets: &'a Buckets,
}

impl Charts<'_> {
    /// Figures of one layout and scale, with their file names.
    fn build(&self, layout: Layout, scale: Scale) -> Vec<(String, Figure)> {
        let tcp = self.tcp;
        match layout {
            Layout::Grid => vec![(
                format!(
                    "{}_tcp_throughput_over_time_{}_{}.svg",
                    tcp.scenario, tcp.clock, scale
                ),
                self.grid(scale),
            )],
            Layout::SameScale => vec![(
                format!(
                    "{}_tcp_sameScale_{}_{}.svg",
                    tcp.scenario, tcp.clock, scale
                ),
                self.same_scale(scale),
            )],
            Layout::Combined => vec![(
                format!(
                    "{}_tcp_combined_{}_{}.svg",
                    tcp.scenario, tcp.clock, scale
                ),
                self.combined(scale),
            )],
            Layout::DualAxis => tcp
                .durations
                .iter()
                .map(|duration| {
                    (
                        format!(
                            "{}_tcp_dualAxis_{}_{}_{}.svg",
                            tcp.scenario, tcp.clock, duration, scale
                        ),
                        self.dual_axis(duration, scale),
                    )
                })
                .collect(),
            Layout::All => Layout::All
                .expand()
                .into_iter()
                .flat_map(|l| self.build(l, scale))
                .collect(),
        }
    }

    fn bucket(&self, ip: IpVersion, duration: &str) -> &[Series] {
        self.buckets
            .get(&CaseKey::new(ip, duration))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn extrema(&self) -> Option<ValueLabel> {
        self.plot.annotate_extrema.then_some(ValueLabel::GBITS)
    }

    fn figure(&self, title: Vec<String>, rows: usize, panels: Vec<Panel>) -> Figure {
        Figure {
            title,
            rows,
            cols: self.tcp.durations.len().max(1),
            panel_size: (self.plot.width, self.plot.height),
            panels,
        }
    }

    /// IP version x duration, each panel scaled to its own data.
    fn grid(&self, scale: Scale) -> Figure {
        let mut panels = Vec::new();

        for ip in IpVersion::ALL {
            for duration in &self.tcp.durations {
                let series = self.bucket(ip, duration);
                if series.is_empty() {
                    panels.push(Panel::new(
                        format!("No data: {}, {}", ip, duration),
                        X_LABEL,
                        Y_LABEL,
                        scale,
                        AxisRange::fallback(Scale::Linear),
                        AxisRange::fallback(scale),
                    ));
                    continue;
                }

                let mut panel = Panel::new(
                    format!("Throughput: {}, {}", ip, duration),
                    X_LABEL,
                    Y_LABEL,
                    scale,
                    x_range(series, self.plot.x_margin),
                    series_y_range(series, scale, self.plot.y_margin)
                        .unwrap_or_else(|| AxisRange::fallback(scale)),
                );
                panel.series = series
                    .iter()
                    .map(|s| {
                        PlotSeries::new(
                            &s.namespace,
                            self.palette.transition(&s.namespace),
                            s.points.clone(),
                        )
                        .extrema(self.extrema())
                    })
                    .collect();
                panels.push(panel);
            }
        }

        self.figure(
            vec![format!(
                "{} - TCP Throughput Over Time ({}) (Y {})",
                self.tcp.scenario, self.tcp.clock, scale
            )],
            2,
            panels,
        )
    }

    /// The grid with both IP versions of a duration on one Y range.
    fn same_scale(&self, scale: Scale) -> Figure {
        let shared =
            shared_y_per_duration(self.buckets, &self.tcp.durations, scale, self.plot.y_margin);
        let mut panels = Vec::new();

        for ip in IpVersion::ALL {
            for duration in &self.tcp.durations {
                let series = self.bucket(ip, duration);
                let y = shared
                    .get(duration)
                    .copied()
                    .unwrap_or_else(|| AxisRange::fallback(scale));

                if series.is_empty() {
                    panels.push(Panel::new(
                        format!("No data: {}, {}", ip.panel_title(), duration),
                        X_LABEL,
                        Y_LABEL,
                        scale,
                        AxisRange::fallback(Scale::Linear),
                        y,
                    ));
                    continue;
                }

                let mut panel = Panel::new(
                    format!("{}, {}", ip.panel_title(), duration),
                    X_LABEL,
                    Y_LABEL,
                    scale,
                    x_range(series, self.plot.x_margin),
                    y,
                );
                panel.series = series
                    .iter()
                    .map(|s| {
                        PlotSeries::new(
                            same_scale_label(&s.namespace, ip),
                            self.palette.transition(&s.namespace),
                            s.points.clone(),
                        )
                        .marker(Some(marker_for(ip)))
                        .extrema(self.extrema())
                    })
                    .collect();
                panels.push(panel);
            }
        }

        self.figure(
            vec![
                format!("Environment: {}", self.tcp.scenario),
                "TCP Throughput Over Time".to_string(),
                format!("Clocksource: {}, Scale: {}", self.tcp.clock, scale.title()),
            ],
            2,
            panels,
        )
    }

    /// Series of one IP version as drawn in the comparison layouts:
    /// tayga left out of the baseline, baseline colours swapped.
    fn comparison_series(&self, ip: IpVersion, duration: &str) -> Vec<PlotSeries> {
        self.bucket(ip, duration)
            .iter()
            .filter(|s| !(ip == IpVersion::V6 && Tool::from_namespace(&s.namespace) == Tool::Tayga))
            .map(|s| {
                let color = match ip {
                    IpVersion::V4 => self.palette.transition(&s.namespace),
                    IpVersion::V6 => self.palette.baseline(&s.namespace),
                };
                PlotSeries::new(comparison_label(&s.namespace, ip), color, s.points.clone())
                    .marker(Some(marker_for(ip)))
                    .extrema(self.extrema())
            })
            .collect()
    }

    /// One panel per duration with both IP versions on a shared Y range.
    fn combined(&self, scale: Scale) -> Figure {
        let shared =
            shared_y_per_duration(self.buckets, &self.tcp.durations, scale, self.plot.y_margin);

        let panels = self
            .tcp
            .durations
            .iter()
            .map(|duration| {
                let all = IpVersion::ALL
                    .iter()
                    .flat_map(|ip| self.bucket(*ip, duration));

                let mut panel = Panel::new(
                    duration.clone(),
                    X_LABEL,
                    Y_LABEL,
                    scale,
                    x_range(all, self.plot.x_margin),
                    shared
                        .get(duration)
                        .copied()
                        .unwrap_or_else(|| AxisRange::fallback(scale)),
                );
                panel.series = IpVersion::ALL
                    .iter()
                    .flat_map(|ip| self.comparison_series(*ip, duration))
                    .collect();
                panel.marker_legend = true;
                panel.empty_message = Some(format!("No data for {}", duration));
                panel
            })
            .collect();

        self.figure(Vec::new(), 1, panels)
    }

    /// IPv6 baseline on the left axis, IPv4 transition on the right, each
    /// with its own Y range.
    fn dual_axis(&self, duration: &str, scale: Scale) -> Figure {
        let limits = y_per_ip_version(self.buckets, duration, scale, self.plot.y_margin);
        let range_of = |ip: IpVersion| {
            limits
                .get(&ip)
                .copied()
                .unwrap_or_else(|| AxisRange::fallback(scale))
        };

        let all = IpVersion::ALL
            .iter()
            .flat_map(|ip| self.bucket(*ip, duration));

        let mut panel = Panel::new(
            duration,
            X_LABEL,
            IpVersion::V6.role(),
            scale,
            x_range(all, self.plot.x_margin),
            range_of(IpVersion::V6),
        );
        panel.secondary = Some(SecondaryAxis {
            label: IpVersion::V4.role().to_string(),
            range: range_of(IpVersion::V4),
        });
        panel.series = self.comparison_series(IpVersion::V6, duration);
        panel.series.extend(
            self.comparison_series(IpVersion::V4, duration)
                .into_iter()
                .map(PlotSeries::on_secondary),
        );
        panel.marker_legend = true;
        panel.empty_message = Some(format!("No data for {}", duration));

        Figure {
            title: Vec::new(),
            rows: 1,
            cols: 1,
            panel_size: (self.plot.width + self.plot.width / 2, self.plot.height),
            panels: vec![panel],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespaceConfig;
    use plotters::style::RGBColor;

    fn series(namespace: &str, points: Vec<(f64, f64)>) -> Series {
        Series {
            label: namespace.to_string(),
            namespace: namespace.to_string(),
            points,
        }
    }

    fn buckets() -> Buckets {
        let mut buckets = Buckets::new();
        buckets.insert(
            CaseKey::new(IpVersion::V4, "30s"),
            vec![
                series("tundra-ns", vec![(0.0, 9.0), (1.0, 9.4)]),
                series("tayga-ns", vec![(0.0, 3.0), (1.0, 3.5)]),
            ],
        );
        buckets.insert(
            CaseKey::new(IpVersion::V6, "30s"),
            vec![
                series("jool-app-ns", vec![(0.0, 20.0), (1.0, 21.0)]),
                series("tayga-ns", vec![(0.0, 25.0), (1.0, 26.0)]),
            ],
        );
        buckets
    }

    fn with_charts<T>(f: impl FnOnce(&Charts<'_>) -> T) -> T {
        let tcp = ThroughputConfig::default();
        let plot = PlotConfig::default();
        let palette = Palette::new(&NamespaceConfig::default());
        let buckets = buckets();
        let charts = Charts {
            tcp: &tcp,
            plot: &plot,
            palette: &palette,
            buckets: &buckets,
        };
        f(&charts)
    }

    #[test]
    fn test_labels() {
        assert_eq!(same_scale_label("tayga-ns", IpVersion::V6), "1 Hop");
        assert_eq!(same_scale_label("jool-app-ns", IpVersion::V4), "jool");
        assert_eq!(comparison_label("jool-app-ns", IpVersion::V6), "2 Hops");
        assert_eq!(comparison_label("tundra-ns", IpVersion::V4), "tundra");
        assert_eq!(comparison_label("clat-ns", IpVersion::V4), "clat-ns (IPv4)");
    }

    #[test]
    fn test_grid_titles_and_limits() {
        let figure = with_charts(|c| c.grid(Scale::Linear));

        assert_eq!(figure.title, vec!["Single - TCP Throughput Over Time (tsc) (Y linear)"]);
        assert_eq!((figure.rows, figure.cols), (2, 2));
        assert_eq!(figure.panels[0].title, "Throughput: IPv4, 30s");
        assert_eq!(figure.panels[1].title, "No data: IPv4, 2min");
        assert!((figure.panels[0].y_range.max - 9.4 * 1.1).abs() < 1e-9);
        assert_eq!(figure.panels[0].series[0].label.as_deref(), Some("tundra-ns"));
    }

    #[test]
    fn test_same_scale_shares_limits_per_duration() {
        let figure = with_charts(|c| c.same_scale(Scale::Linear));

        assert_eq!(figure.title.len(), 3);
        assert_eq!(figure.title[2], "Clocksource: tsc, Scale: Linear");
        assert_eq!(figure.panels[0].title, "IPv4 Translation, 30s");
        assert_eq!(figure.panels[2].title, "IPv6 Baseline, 30s");
        assert_eq!(figure.panels[0].y_range, figure.panels[2].y_range);
        assert_eq!(figure.panels[2].series[0].marker, Some(Marker::Cross));
    }

    #[test]
    fn test_combined_skips_tayga_baseline() {
        let figure = with_charts(|c| c.combined(Scale::Log));

        assert_eq!(figure.rows, 1);
        assert_eq!(figure.panels.len(), 2);

        let labels: Vec<_> = figure.panels[0]
            .series
            .iter()
            .filter_map(|s| s.label.clone())
            .collect();
        assert_eq!(labels, vec!["tundra", "tayga", "2 Hops"]);
        assert_eq!(figure.panels[0].series[2].color, RGBColor(128, 0, 128));
        assert!(figure.panels[0].marker_legend);
        assert_eq!(
            figure.panels[1].empty_message.as_deref(),
            Some("No data for 2min")
        );
    }

    #[test]
    fn test_dual_axis_limits_per_ip_version() {
        let figure = with_charts(|c| c.dual_axis("30s", Scale::Linear));
        let panel = &figure.panels[0];

        assert_eq!(panel.y_label, "IPv6 Baseline");
        let secondary = panel.secondary.as_ref().unwrap();
        assert_eq!(secondary.label, "IPv4 Transition");
        assert!((panel.y_range.max - 26.0 * 1.1).abs() < 1e-9);
        assert!((secondary.range.max - 9.4 * 1.1).abs() < 1e-9);
        assert!(panel.series.iter().filter(|s| s.secondary).count() == 2);
    }

    #[test]
    fn test_build_file_names() {
        let names: Vec<String> = with_charts(|c| {
            c.build(Layout::All, Scale::Log)
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        });

        assert_eq!(
            names,
            vec![
                "Single_tcp_throughput_over_time_tsc_log.svg",
                "Single_tcp_sameScale_tsc_log.svg",
                "Single_tcp_combined_tsc_log.svg",
                "Single_tcp_dualAxis_tsc_30s_log.svg",
                "Single_tcp_dualAxis_tsc_2min_log.svg",
            ]
        );
    }
}
