//! Summary table generation.
//!
//! This module turns scenario records into the aligned console table,
//! CSV, LaTeX and JSON outputs of the summary commands.

use crate::analysis::{insights, Preference};
use crate::models::{display_namespace, RttRecord, SummaryRecord, ThroughputRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

const RTT_HEADERS: [&str; 11] = [
    "Scenario",
    "IP Type",
    "Tool",
    "IP Address",
    "Min (ms)",
    "Avg (ms)",
    "Median (ms)",
    "Max (ms)",
    "Std Dev (ms)",
    "P95 (ms)",
    "Packets",
];

const THROUGHPUT_HEADERS: [&str; 14] = [
    "Scenario",
    "Duration",
    "IP Type",
    "Tool",
    "IP Address",
    "Min (Gbps)",
    "Avg (Gbps)",
    "Max (Gbps)",
    "Overall (Gbps)",
    "Std Dev (Gbps)",
    "P95 (Gbps)",
    "Total (GB)",
    "Retransmits",
    "Samples",
];

/// Which summary a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Rtt,
    Throughput,
}

impl TableKind {
    /// Heading printed above the console table.
    pub fn heading(&self) -> &'static str {
        match self {
            TableKind::Rtt => "RTT MEASUREMENT SUMMARY TABLE",
            TableKind::Throughput => "THROUGHPUT MEASUREMENT SUMMARY TABLE",
        }
    }

    /// Width of the `=` banner around the console table.
    pub fn banner_width(&self) -> usize {
        match self {
            TableKind::Rtt => 120,
            TableKind::Throughput => 140,
        }
    }

    /// Output file stem (`rtt_summary_table`).
    pub fn file_stem(&self) -> &'static str {
        match self {
            TableKind::Rtt => "rtt_summary_table",
            TableKind::Throughput => "throughput_summary_table",
        }
    }

    fn address_column(&self) -> usize {
        match self {
            TableKind::Rtt => 3,
            TableKind::Throughput => 4,
        }
    }

    /// Number of leading columns that go into the LaTeX table.
    fn latex_columns(&self) -> usize {
        match self {
            TableKind::Rtt => RTT_HEADERS.len(),
            // Samples is left out
            TableKind::Throughput => THROUGHPUT_HEADERS.len() - 1,
        }
    }
}

/// Formatted summary rows, one per record.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub kind: TableKind,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl SummaryTable {
    /// RTT table; records are expected in display order.
    pub fn rtt(records: &[RttRecord]) -> Self {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.scenario.clone(),
                    r.name.ip_version.to_string(),
                    display_namespace(&r.name.namespace),
                    r.name.address.clone(),
                    format!("{:.3}", r.stats.min),
                    format!("{:.3}", r.stats.avg),
                    format!("{:.3}", r.stats.median),
                    format!("{:.3}", r.stats.max),
                    format!("{:.3}", r.stats.std_dev),
                    format!("{:.3}", r.stats.p95),
                    r.stats.packet_count.to_string(),
                ]
            })
            .collect();

        Self {
            kind: TableKind::Rtt,
            headers: RTT_HEADERS.to_vec(),
            rows,
        }
    }

    /// Throughput table; records are expected in display order.
    pub fn throughput(records: &[ThroughputRecord]) -> Self {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.scenario.clone(),
                    r.name.duration.clone(),
                    r.name.ip_version.to_string(),
                    display_namespace(&r.name.namespace),
                    r.name.address.clone(),
                    format!("{:.3}", r.stats.min),
                    format!("{:.3}", r.stats.avg),
                    format!("{:.3}", r.stats.max),
                    format!("{:.3}", r.stats.overall),
                    format!("{:.3}", r.stats.std_dev),
                    format!("{:.3}", r.stats.p95),
                    format!("{:.2}", r.stats.total_gb),
                    r.stats.retransmits.to_string(),
                    r.stats.sample_count.to_string(),
                ]
            })
            .collect();

        Self {
            kind: TableKind::Throughput,
            headers: THROUGHPUT_HEADERS.to_vec(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn position_of(list: &[String], value: &str) -> usize {
    list.iter().position(|v| v == value).unwrap_or(list.len())
}

/// Order RTT records by scenario (given order), IP version, file name.
pub fn sort_rtt_records(records: &mut [RttRecord], scenarios: &[String]) {
    records.sort_by(|a, b| {
        position_of(scenarios, &a.scenario)
            .cmp(&position_of(scenarios, &b.scenario))
            .then(a.name.ip_version.cmp(&b.name.ip_version))
            .then_with(|| a.file.cmp(&b.file))
    });
}

/// Order throughput records by scenario, duration (given orders), IP
/// version, file name.
pub fn sort_throughput_records(
    records: &mut [ThroughputRecord],
    scenarios: &[String],
    durations: &[String],
) {
    records.sort_by(|a, b| {
        position_of(scenarios, &a.scenario)
            .cmp(&position_of(scenarios, &b.scenario))
            .then(
                position_of(durations, &a.name.duration)
                    .cmp(&position_of(durations, &b.name.duration)),
            )
            .then(a.name.ip_version.cmp(&b.name.ip_version))
            .then_with(|| a.file.cmp(&b.file))
    });
}

/// Generate the console table, framed by `=` banners.
pub fn generate_console_table(table: &SummaryTable) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let banner = "=".repeat(table.kind.banner_width());
    let headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();

    let mut output = String::new();
    output.push_str(&format!("\n{}\n", banner));
    output.push_str(&format!("{}\n", table.kind.heading()));
    output.push_str(&format!("{}\n", banner));
    output.push_str(&format!("{}\n", format_line(&headers)));
    for row in &table.rows {
        output.push_str(&format!("{}\n", format_line(row)));
    }
    output.push_str(&format!("{}\n", banner));

    output
}

/// Write the table as CSV with a header row.
pub fn write_csv(table: &SummaryTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

fn escape_latex(value: &str) -> String {
    value.replace('_', "\\_")
}

fn latex_preamble(kind: TableKind) -> Vec<String> {
    let (title, caption, label, columns) = match kind {
        TableKind::Rtt => (
            "RTT",
            "RTT Performance Comparison Across Translation Tools and Scenarios",
            "tab:rtt_comparison",
            "|l|l|l|l|r|r|r|r|r|r|r|",
        ),
        TableKind::Throughput => (
            "Throughput",
            "Throughput Performance Comparison Across Translation Tools and Scenarios",
            "tab:throughput_comparison",
            "|l|l|l|l|l|r|r|r|r|r|r|r|r|",
        ),
    };

    vec![
        format!("% {} Measurement Summary Table - LaTeX Format", title),
        "\\begin{table}[htbp]".to_string(),
        "\\centering".to_string(),
        format!("\\caption{{{}}}", caption),
        format!("\\label{{{}}}", label),
        "\\footnotesize".to_string(),
        format!("\\begin{{tabular}}{{{}}}", columns),
        "\\hline".to_string(),
    ]
}

fn latex_notes(kind: TableKind) -> &'static [&'static str] {
    match kind {
        TableKind::Rtt => &[
            "% - Min/Avg/Median/Max: Minimum, Average, Median, and Maximum RTT values",
            "% - Std Dev: Standard deviation of RTT measurements",
            "% - P95: 95th percentile RTT value",
            "% - Packets: Number of ping packets measured",
            "% - IPv4 Transition: Translation from IPv6 to IPv4",
            "% - IPv6 Baseline: Native IPv6 performance",
        ],
        TableKind::Throughput => &[
            "% - Min/Avg/Max: Minimum, Average, and Maximum throughput values from interval data",
            "% - Overall: End-to-end throughput from iperf3 summary",
            "% - Std Dev: Standard deviation of throughput measurements",
            "% - P95: 95th percentile throughput value",
            "% - Total (GB): Total data transferred in gigabytes",
            "% - Retransmits: Number of TCP retransmissions",
            "% - IPv4 Transition: Translation from IPv6 to IPv4",
            "% - IPv6 Baseline: Native IPv6 performance",
        ],
    }
}

/// Generate a LaTeX `table` environment.
///
/// Scenario changes are separated by `\hline`; addresses are set in
/// `\texttt{}` with underscores escaped.
pub fn generate_latex_table(table: &SummaryTable) -> String {
    let kind = table.kind;
    let columns = kind.latex_columns();
    let mut lines = latex_preamble(kind);

    let header = table.headers[..columns]
        .iter()
        .map(|h| format!("\\textbf{{{}}}", h))
        .collect::<Vec<_>>()
        .join(" & ");
    lines.push(format!("{} \\\\", header));
    lines.push("\\hline".to_string());

    let mut current_scenario: Option<&str> = None;
    for row in &table.rows {
        let scenario = row[0].as_str();
        if current_scenario.is_some_and(|s| s != scenario) {
            lines.push("\\hline".to_string());
        }
        current_scenario = Some(scenario);

        let cells: Vec<String> = row[..columns]
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == kind.address_column() {
                    format!("\\texttt{{{}}}", escape_latex(cell))
                } else {
                    escape_latex(cell)
                }
            })
            .collect();
        lines.push(format!("{} \\\\", cells.join(" & ")));
    }

    lines.push("\\hline".to_string());
    lines.push("\\end{tabular}".to_string());
    lines.push("\\end{table}".to_string());
    lines.push(String::new());
    lines.push("% Table Notes:".to_string());
    lines.extend(latex_notes(kind).iter().map(|n| n.to_string()));

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// JSON document written next to the tables.
#[derive(Debug, Serialize)]
struct SummaryDocument<'a, R> {
    generated_at: DateTime<Utc>,
    generator: String,
    table: &'static str,
    scenarios: &'a [String],
    record_count: usize,
    records: &'a [R],
}

/// Generate the JSON document holding every record, raw samples included.
pub fn generate_json_summary<R: Serialize>(
    kind: TableKind,
    scenarios: &[String],
    records: &[R],
) -> Result<String> {
    let document = SummaryDocument {
        generated_at: Utc::now(),
        generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        table: kind.file_stem(),
        scenarios,
        record_count: records.len(),
        records,
    };

    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Write text output to a file.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

/// Best/worst lines for RTT records (lower average wins).
pub fn rtt_insights(records: &[RttRecord]) -> Vec<String> {
    insight_lines(records, Preference::Lower, "ms")
}

/// Best/worst lines for throughput records of one duration.
pub fn throughput_insights(records: &[ThroughputRecord]) -> Vec<String> {
    insight_lines(records, Preference::Higher, " Gbps")
}

fn insight_lines<R: SummaryRecord>(records: &[R], preference: Preference, unit: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for insight in insights(records, preference) {
        for (tag, record) in [("Best", insight.best), ("Worst", insight.worst)] {
            lines.push(format!(
                "{} - {}: {} in {} ({:.3}{} avg)",
                insight.ip_version,
                tag,
                record.name().namespace,
                record.scenario(),
                record.avg(),
                unit
            ));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IpVersion, MeasurementName, PingSummary, ThroughputSummary};

    fn name(namespace: &str, address: &str, ip: IpVersion, duration: &str) -> MeasurementName {
        MeasurementName {
            namespace: namespace.to_string(),
            address: address.to_string(),
            ip_version: ip,
            duration: duration.to_string(),
            protocol: None,
        }
    }

    fn rtt(scenario: &str, namespace: &str, ip: IpVersion, avg: f64) -> RttRecord {
        let address = match ip {
            IpVersion::V4 => "192.0.0.171",
            IpVersion::V6 => "fd00:64:64:5f00:20d2::400",
        };
        RttRecord {
            scenario: scenario.to_string(),
            file: format!("{}_{}.txt", namespace, ip),
            name: name(namespace, address, ip, "30s"),
            stats: PingSummary {
                min: avg / 2.0,
                avg,
                max: avg * 2.0,
                mdev: 0.01,
                std_dev: 0.02,
                median: avg,
                p95: avg * 1.5,
                packet_count: 30,
                raw_rtts: vec![avg],
            },
        }
    }

    fn throughput(scenario: &str, namespace: &str, duration: &str, avg: f64) -> ThroughputRecord {
        ThroughputRecord {
            scenario: scenario.to_string(),
            file: format!("{}_{}.json", namespace, duration),
            name: name(namespace, "192.0.0.171", IpVersion::V4, duration),
            stats: ThroughputSummary {
                min: avg - 1.0,
                avg,
                max: avg + 1.0,
                overall: avg,
                std_dev: 0.5,
                p95: avg + 0.8,
                p5: avg - 0.8,
                duration_seconds: 30.0,
                total_gb: 35.126,
                retransmits: 12,
                sample_count: 30,
                raw_throughputs: vec![avg],
            },
        }
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_rtt_records() {
        let mut records = vec![
            rtt("Double", "tundra-ns", IpVersion::V4, 0.5),
            rtt("AWS", "tundra-ns", IpVersion::V6, 0.4),
            rtt("AWS", "jool-app-ns", IpVersion::V4, 0.3),
            rtt("AWS", "tundra-ns", IpVersion::V4, 0.2),
        ];

        sort_rtt_records(&mut records, &order(&["AWS", "Single", "Double"]));

        let keys: Vec<(&str, IpVersion, &str)> = records
            .iter()
            .map(|r| (r.scenario.as_str(), r.name.ip_version, r.name.namespace.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("AWS", IpVersion::V4, "jool-app-ns"),
                ("AWS", IpVersion::V4, "tundra-ns"),
                ("AWS", IpVersion::V6, "tundra-ns"),
                ("Double", IpVersion::V4, "tundra-ns"),
            ]
        );
    }

    #[test]
    fn test_sort_throughput_records_by_duration() {
        let mut records = vec![
            throughput("AWS_hpet", "tundra-ns", "2min", 8.0),
            throughput("AWS_hpet", "tundra-ns", "30s", 9.0),
        ];

        sort_throughput_records(&mut records, &order(&["AWS_hpet"]), &order(&["30s", "2min"]));

        assert_eq!(records[0].name.duration, "30s");
        assert_eq!(records[1].name.duration, "2min");
    }

    #[test]
    fn test_rtt_table_rows() {
        let table = SummaryTable::rtt(&[rtt("AWS", "jool-app-ns", IpVersion::V4, 0.4)]);

        assert_eq!(table.headers.len(), 11);
        assert_eq!(
            table.rows[0],
            vec![
                "AWS",
                "IPv4",
                "jool",
                "192.0.0.171",
                "0.200",
                "0.400",
                "0.400",
                "0.800",
                "0.020",
                "0.600",
                "30"
            ]
        );
    }

    #[test]
    fn test_throughput_table_rows() {
        let table = SummaryTable::throughput(&[throughput("AWS_kvm", "tundra-ns", "2min", 9.5)]);

        let row = &table.rows[0];
        assert_eq!(row[1], "2min");
        assert_eq!(row[5], "8.500");
        assert_eq!(row[11], "35.13");
        assert_eq!(row[12], "12");
        assert_eq!(row[13], "30");
    }

    #[test]
    fn test_generate_console_table() {
        let table = SummaryTable::rtt(&[rtt("AWS", "tundra-ns", IpVersion::V4, 0.3)]);
        let output = generate_console_table(&table);

        assert!(output.contains(&"=".repeat(120)));
        assert!(output.contains("RTT MEASUREMENT SUMMARY TABLE"));
        assert!(output.contains("tundra"));

        let lines: Vec<&str> = output.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines[3].len(), lines[4].len());
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rtt_summary_table.csv");
        let table = SummaryTable::rtt(&[rtt("Single", "tayga-ns", IpVersion::V6, 0.1)]);

        write_csv(&table, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Scenario,IP Type,Tool,IP Address,Min (ms),Avg (ms),Median (ms),Max (ms),Std Dev (ms),P95 (ms),Packets"
        );
        assert!(lines
            .next()
            .unwrap()
            .starts_with("Single,IPv6,tayga,fd00:64:64:5f00:20d2::400,0.050,0.100"));
    }

    #[test]
    fn test_generate_latex_table_rtt() {
        let mut record = rtt("Double", "tundra-ns", IpVersion::V4, 0.3);
        record.name.address = "my_host".to_string();
        let table = SummaryTable::rtt(&[rtt("AWS", "tundra-ns", IpVersion::V4, 0.3), record]);

        let latex = generate_latex_table(&table);

        assert!(latex.contains("\\caption{RTT Performance Comparison Across Translation Tools and Scenarios}"));
        assert!(latex.contains("\\label{tab:rtt_comparison}"));
        assert!(latex.contains("\\begin{tabular}{|l|l|l|l|r|r|r|r|r|r|r|}"));
        assert!(latex.contains("\\textbf{Packets} \\\\"));
        assert!(latex.contains("\\texttt{my\\_host}"));
        assert!(latex.contains("% Table Notes:"));
        // top, after header, between scenarios, bottom
        assert_eq!(latex.matches("\\hline").count(), 4);
        assert!(!latex.contains("\\n"));
    }

    #[test]
    fn test_generate_latex_table_throughput_omits_samples() {
        let table = SummaryTable::throughput(&[throughput("AWS_hpet", "tundra-ns", "30s", 9.0)]);
        let latex = generate_latex_table(&table);

        assert!(latex.contains("\\label{tab:throughput_comparison}"));
        assert!(latex.contains("\\textbf{Retransmits} \\\\"));
        assert!(!latex.contains("Samples"));
        assert!(latex.contains("AWS\\_hpet & 30s & IPv4 & tundra & \\texttt{192.0.0.171}"));
        assert!(latex.contains("& 35.13 & 12 \\\\"));
    }

    #[test]
    fn test_generate_json_summary() {
        let records = vec![rtt("AWS", "tundra-ns", IpVersion::V4, 0.3)];
        let json = generate_json_summary(TableKind::Rtt, &order(&["AWS"]), &records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["table"], "rtt_summary_table");
        assert_eq!(value["record_count"], 1);
        assert_eq!(value["records"][0]["namespace"], "tundra-ns");
        assert_eq!(value["records"][0]["ip_version"], "IPv4");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_insight_lines() {
        let records = vec![
            rtt("AWS", "tundra-ns", IpVersion::V4, 0.9),
            rtt("Single", "jool-app-ns", IpVersion::V4, 0.2),
        ];
        let lines = rtt_insights(&records);

        assert_eq!(lines[0], "IPv4 - Best: jool-app-ns in Single (0.200ms avg)");
        assert_eq!(lines[1], "IPv4 - Worst: tundra-ns in AWS (0.900ms avg)");

        let lines = throughput_insights(&[throughput("AWS_kvm", "tundra-ns", "30s", 9.25)]);
        assert_eq!(lines[0], "IPv4 - Best: tundra-ns in AWS_kvm (9.250 Gbps avg)");
    }
}
