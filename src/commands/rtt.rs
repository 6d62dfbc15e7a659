//! `rtt`: ICMP RTT over sequence number, one panel per IP version.

use super::{collect, read_text, Context, LogKind, Source};
use crate::analysis::{group_by_case, series_y_range, x_range, AxisRange, Buckets, Scale};
use crate::config::{Config, PlotConfig, RttConfig};
use crate::error::SkipReason;
use crate::models::{CaseKey, IpVersion, MeasurementName, Series};
use crate::parser::parse_ping_samples;
use crate::report::chart::{Figure, Panel, PlotSeries, ValueLabel};
use crate::report::{render_figure, Palette};
use crate::scanner::ScanConfig;
use anyhow::Result;
use std::path::Path;
use tracing::info;

const X_LABEL: &str = "ICMP sequence (≈ seconds)";
const Y_LABEL: &str = "RTT [ms]";

pub fn sources(config: &Config) -> Vec<Source> {
    let rtt = &config.rtt;
    vec![Source::single(
        &rtt.scenario,
        &rtt.folder,
        ScanConfig::ping(std::slice::from_ref(&rtt.duration)),
        LogKind::Ping,
    )]
}

pub fn run(ctx: &Context<'_>) -> Result<i32> {
    let rtt = &ctx.config.rtt;
    println!("📥 Reading ping logs from {}", rtt.folder.display());

    let series = collect(ctx, &sources(ctx.config), |_, file, name| {
        load_series(&file.path, &name).map(|s| (name, s))
    })?;
    info!("Parsed {} ping series", series.len());

    let buckets: Buckets = group_by_case(
        series
            .into_iter()
            .map(|(name, s)| (CaseKey::new(name.ip_version, name.duration), s)),
    );

    let output_dir = ctx.prepare_output_dir()?;
    for scale in Scale::ALL {
        let figure = build_figure(rtt, &ctx.config.plot, &ctx.palette, &buckets, scale);
        let path = output_dir.join(file_name(rtt, scale));
        render_figure(&path, &figure)?;
        println!("✅ RTT plot saved to {}", path.display());
    }

    Ok(0)
}

/// RTT samples of one ping log, x = icmp_seq.
fn load_series(path: &Path, name: &MeasurementName) -> Result<Series, SkipReason> {
    let content = read_text(path)?;
    let samples = parse_ping_samples(&content);
    if samples.is_empty() {
        return Err(SkipReason::NoSamples);
    }

    Ok(Series {
        label: name.series_label(),
        namespace: name.namespace.clone(),
        points: samples
            .iter()
            .map(|s| (f64::from(s.seq), s.rtt_ms))
            .collect(),
    })
}

fn file_name(rtt: &RttConfig, scale: Scale) -> String {
    format!(
        "{}_ping_rtt_{}_{}_{}.svg",
        rtt.scenario, rtt.clock, rtt.duration, scale
    )
}

fn build_figure(
    rtt: &RttConfig,
    plot: &PlotConfig,
    palette: &Palette,
    buckets: &Buckets,
    scale: Scale,
) -> Figure {
    let extrema = plot.annotate_extrema.then_some(ValueLabel::MILLIS);

    let panels = IpVersion::ALL
        .iter()
        .map(|ip| {
            let series = buckets
                .get(&CaseKey::new(*ip, rtt.duration.as_str()))
                .map(Vec::as_slice)
                .unwrap_or_default();

            if series.is_empty() {
                return Panel::new(
                    format!("No data: {}, {}", ip, rtt.duration),
                    X_LABEL,
                    Y_LABEL,
                    scale,
                    AxisRange::fallback(Scale::Linear),
                    AxisRange::fallback(scale),
                );
            }

            let mut panel = Panel::new(
                format!("RTT: {}, {}", ip, rtt.duration),
                X_LABEL,
                Y_LABEL,
                scale,
                x_range(series, plot.x_margin),
                series_y_range(series, scale, plot.y_margin)
                    .unwrap_or_else(|| AxisRange::fallback(scale)),
            );
            panel.series = series
                .iter()
                .map(|s| {
                    PlotSeries::new(&s.label, palette.transition(&s.namespace), s.points.clone())
                        .extrema(extrema)
                })
                .collect();
            panel
        })
        .collect();

    Figure {
        title: vec![format!(
            "{} - ICMP RTT ({}) - {} (Y {})",
            rtt.scenario, rtt.clock, rtt.duration, scale
        )],
        rows: 1,
        cols: 2,
        panel_size: (plot.width, plot.height),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespaceConfig;
    use std::fs;
    use tempfile::TempDir;

    const PING_LOG: &str = "\
PING 192.0.0.171 (192.0.0.171) 56(84) bytes of data.
64 bytes from 192.0.0.171: icmp_seq=2 ttl=63 time=0.512 ms
64 bytes from 192.0.0.171: icmp_seq=1 ttl=63 time=0.398 ms

--- 192.0.0.171 ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
rtt min/avg/max/mdev = 0.398/0.455/0.512/0.057 ms
";

    fn name() -> MeasurementName {
        MeasurementName {
            namespace: "tundra-ns".to_string(),
            address: "192.0.0.171".to_string(),
            ip_version: IpVersion::V4,
            duration: "30s".to_string(),
            protocol: None,
        }
    }

    #[test]
    fn test_load_series_sorted_by_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tundra-ns_192.0.0.171_ipv4_30s.txt");
        fs::write(&path, PING_LOG).unwrap();

        let series = load_series(&path, &name()).unwrap();

        assert_eq!(series.label, "tundra-ns (192.0.0.171)");
        assert_eq!(series.points, vec![(1.0, 0.398), (2.0, 0.512)]);
    }

    #[test]
    fn test_load_series_without_replies() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "PING nowhere\n").unwrap();

        assert!(matches!(
            load_series(&path, &name()),
            Err(SkipReason::NoSamples)
        ));
    }

    #[test]
    fn test_build_figure_panels() {
        let rtt = RttConfig::default();
        let plot = PlotConfig::default();
        let palette = Palette::new(&NamespaceConfig::default());

        let mut buckets = Buckets::new();
        buckets.insert(
            CaseKey::new(IpVersion::V4, "30s"),
            vec![Series {
                label: "tundra-ns (192.0.0.171)".to_string(),
                namespace: "tundra-ns".to_string(),
                points: vec![(1.0, 0.4), (2.0, 0.5)],
            }],
        );

        let figure = build_figure(&rtt, &plot, &palette, &buckets, Scale::Log);

        assert_eq!(figure.title, vec!["Single - ICMP RTT (tsc) - 30s (Y log)"]);
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[0].title, "RTT: IPv4, 30s");
        assert_eq!(figure.panels[0].series.len(), 1);
        assert_eq!(figure.panels[0].series[0].extrema, Some(ValueLabel::MILLIS));
        assert_eq!(figure.panels[1].title, "No data: IPv6, 30s");
        assert_eq!(figure.panels[1].y_range, AxisRange::fallback(Scale::Log));
    }

    #[test]
    fn test_file_name() {
        let rtt = RttConfig::default();
        assert_eq!(
            file_name(&rtt, Scale::Linear),
            "Single_ping_rtt_tsc_30s_linear.svg"
        );
    }
}
