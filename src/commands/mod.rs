//! Subcommand pipelines.
//!
//! Every subcommand runs discover -> parse -> aggregate -> render once.
//! This module holds what they share: the run context, measurement
//! sources, the progress bar and the per-file collection loop.

pub mod rtt;
pub mod rtt_summary;
pub mod tcp;
pub mod throughput_summary;
pub mod udp;

use crate::analysis::include_in_comparison;
use crate::cli::Command;
use crate::config::{Config, Scenario};
use crate::error::SkipReason;
use crate::models::{display_namespace, IpVersion, MeasurementName, SummaryRecord};
use crate::report::chart::Bar;
use crate::report::Palette;
use crate::scanner::{self, FileScanner, ScanConfig, ScannedFile};
use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings shared by every command of one run.
pub struct Context<'a> {
    pub config: &'a Config,
    pub show_progress: bool,
    pub palette: Palette,
    overrides: HashMap<String, String>,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, show_progress: bool) -> Self {
        Self {
            config,
            show_progress,
            palette: Palette::new(&config.namespaces),
            overrides: config
                .ip_labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Filename token -> address overrides.
    pub fn overrides(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    /// Create the output directory if missing and return it.
    pub fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = &self.config.general.output_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(dir.clone())
    }
}

/// Kind of measurement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Ping,
    Iperf,
}

/// One folder of measurement files and how to read it.
#[derive(Debug, Clone)]
pub struct Source {
    /// Scenario the files belong to.
    pub scenario: String,
    pub folder: PathBuf,
    pub scan: ScanConfig,
    pub kind: LogKind,
    /// Only accept iperf3 files carrying this protocol token.
    pub protocol: Option<&'static str>,
    /// A missing folder is an error rather than a warning.
    pub required: bool,
}

impl Source {
    /// The only folder of a single-folder command.
    pub fn single(scenario: &str, folder: &Path, scan: ScanConfig, kind: LogKind) -> Self {
        Self {
            scenario: scenario.to_string(),
            folder: folder.to_path_buf(),
            scan,
            kind,
            protocol: None,
            required: true,
        }
    }

    /// One scenario of a summary command.
    pub fn scenario(scenario: &Scenario, scan: ScanConfig, kind: LogKind) -> Self {
        Self {
            scenario: scenario.name.clone(),
            folder: scenario.folder.clone(),
            scan,
            kind,
            protocol: None,
            required: false,
        }
    }

    pub fn with_protocol(mut self, protocol: &'static str) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// List matching files. A missing optional folder yields `None`.
    pub fn scan(&self) -> Result<Option<Vec<ScannedFile>>> {
        if !self.required && !self.folder.is_dir() {
            warn!(
                "Folder {} not found, skipping {}",
                self.folder.display(),
                self.scenario
            );
            return Ok(None);
        }

        FileScanner::new(&self.folder, self.scan.clone())
            .scan()
            .map(Some)
    }

    /// Parse a file stem according to the log kind.
    pub fn parse_name(
        &self,
        stem: &str,
        overrides: &HashMap<String, String>,
    ) -> Result<MeasurementName, SkipReason> {
        match self.kind {
            LogKind::Ping => scanner::parse_ping_name(stem, overrides),
            LogKind::Iperf => {
                let name = scanner::parse_iperf_name(stem, overrides)?;
                if let Some(protocol) = self.protocol {
                    scanner::require_protocol(&name, protocol)?;
                }
                Ok(name)
            }
        }
    }
}

/// Measurement sources of a command, in processing order.
pub fn sources(command: &Command, config: &Config) -> Vec<Source> {
    match command {
        Command::Rtt(_) => rtt::sources(config),
        Command::Tcp(_) => tcp::sources(config),
        Command::Udp(_) => udp::sources(config),
        Command::RttSummary(_) => rtt_summary::sources(config),
        Command::ThroughputSummary(_) => throughput_summary::sources(config),
    }
}

/// Run a subcommand. Returns the process exit code.
pub fn run(command: &Command, ctx: &Context<'_>) -> Result<i32> {
    info!("Running {}", command.name());

    match command {
        Command::Rtt(_) => rtt::run(ctx),
        Command::Tcp(tcp) => tcp::run(ctx, tcp.layout),
        Command::Udp(_) => udp::run(ctx),
        Command::RttSummary(_) => rtt_summary::run(ctx),
        Command::ThroughputSummary(_) => throughput_summary::run(ctx),
    }
}

/// Handle --dry-run: list discovered files and their parsed metadata.
pub fn dry_run(command: &Command, ctx: &Context<'_>) -> Result<i32> {
    println!("\n🔍 Dry run: scanning measurement files (nothing is rendered)...\n");

    let mut accepted = 0usize;
    let mut skipped = 0usize;

    for source in sources(command, ctx.config) {
        println!("   📁 {} ({})", source.folder.display(), source.scenario);

        let Some(files) = source.scan()? else {
            println!("      folder not found");
            continue;
        };

        if files.is_empty() {
            println!("      No matching files found.");
        }

        for file in &files {
            match source.parse_name(&file.stem, ctx.overrides()) {
                Ok(name) => {
                    accepted += 1;
                    println!(
                        "      📄 {} ({} bytes) -> {} | {} | {} | {}{}",
                        file.file_name,
                        file.size,
                        name.namespace,
                        name.address,
                        name.ip_version,
                        name.duration,
                        name.protocol
                            .as_deref()
                            .map(|p| format!(" | {}", p))
                            .unwrap_or_default()
                    );
                }
                Err(reason) => {
                    skipped += 1;
                    println!("      ⏭️  {}: {}", file.file_name, reason);
                }
            }
        }
    }

    println!("\n   Total: {} files, {} skipped", accepted, skipped);
    println!("\n✅ Dry run complete. No charts were written.");
    Ok(0)
}

/// Bars of one scenario and IP version in a comparison grid.
///
/// IPv6 bars are named by hop count and drawn in baseline colours.
pub fn comparison_bars<R: SummaryRecord>(
    records: &[R],
    scenario: &Scenario,
    ip_version: IpVersion,
    palette: &Palette,
) -> Vec<Bar> {
    records
        .iter()
        .filter(|r| r.scenario() == scenario.name && r.name().ip_version == ip_version)
        .filter(|r| include_in_comparison(&scenario.name, ip_version, &r.name().namespace))
        .map(|r| {
            let namespace = &r.name().namespace;
            let (label, color) = match ip_version {
                IpVersion::V4 => (display_namespace(namespace), palette.transition(namespace)),
                IpVersion::V6 => (
                    r.name()
                        .tool()
                        .hop_label()
                        .map(str::to_string)
                        .unwrap_or_else(|| display_namespace(namespace)),
                    palette.baseline(namespace),
                ),
            };

            Bar {
                label,
                color,
                avg: r.avg(),
                min: r.min(),
                max: r.max(),
            }
        })
        .collect()
}

/// Print the banner-framed insights block of a summary command.
pub fn print_insights(lines: &[String]) {
    let banner = "=".repeat(60);
    println!("\n{}", banner);
    println!("KEY INSIGHTS:");
    println!("{}", banner);
    for line in lines {
        println!("{}", line);
    }
    println!("{}", banner);
}

/// Progress bar over `len` files, `None` when progress is disabled.
pub fn progress_bar(len: usize, show: bool) -> Option<ProgressBar> {
    if !show || len == 0 {
        return None;
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    Some(pb)
}

/// Log why a file was left out.
pub fn log_skip(file: &ScannedFile, reason: &SkipReason) {
    if reason.is_filtered() {
        debug!("Skipping {}: {}", file.file_name, reason);
    } else {
        warn!("Skipping {}: {}", file.file_name, reason);
    }
}

/// Read a measurement file as text.
pub fn read_text(path: &Path) -> Result<String, SkipReason> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Scan every source and parse each accepted file with `parse`.
///
/// Files whose name or content cannot be used are logged and skipped;
/// only scan failures of required folders abort the run.
pub fn collect<T, F>(ctx: &Context<'_>, sources: &[Source], mut parse: F) -> Result<Vec<T>>
where
    F: FnMut(&Source, &ScannedFile, MeasurementName) -> Result<T, SkipReason>,
{
    let mut batches = Vec::new();
    for source in sources {
        if let Some(files) = source.scan()? {
            batches.push((source, files));
        }
    }

    let total: usize = batches.iter().map(|(_, files)| files.len()).sum();
    let progress = progress_bar(total, ctx.show_progress);
    let mut items = Vec::new();

    for (source, files) in &batches {
        for file in files {
            if let Some(ref pb) = progress {
                pb.set_message(file.file_name.clone());
            }

            let parsed = source
                .parse_name(&file.stem, ctx.overrides())
                .and_then(|name| parse(source, file, name));

            match parsed {
                Ok(item) => items.push(item),
                Err(reason) => match progress {
                    Some(ref pb) => pb.suspend(|| log_skip(file, &reason)),
                    None => log_skip(file, &reason),
                },
            }

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Parsed {} of {} files", items.len(), total));
    }

    debug!("Collected {} measurements from {} files", items.len(), total);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_skips_bad_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tundra-ns_192.0.0.171_ipv4_30s.txt"), "x").unwrap();
        fs::write(dir.path().join("broken_30s.txt"), "x").unwrap();
        fs::write(dir.path().join("tundra-ns_192.0.0.171_ipvX_30s.txt"), "x").unwrap();

        let config = Config::default();
        let ctx = Context::new(&config, false);
        let source = Source::single(
            "Single",
            dir.path(),
            ScanConfig::ping(&["30s".to_string()]),
            LogKind::Ping,
        );

        let names = collect(&ctx, &[source], |_, _, name| Ok(name)).unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names[0].namespace, "tundra-ns");
    }

    #[test]
    fn test_missing_optional_folder_is_skipped() {
        let scenario = Scenario::new("AWS", "AWS", "/definitely/not/here");
        let source = Source::scenario(&scenario, ScanConfig::ping(&[]), LogKind::Ping);

        assert!(source.scan().unwrap().is_none());
    }

    #[test]
    fn test_missing_required_folder_fails() {
        let source = Source::single(
            "Single",
            Path::new("/definitely/not/here"),
            ScanConfig::ping(&[]),
            LogKind::Ping,
        );

        assert!(source.scan().is_err());
    }

    #[test]
    fn test_protocol_filter() {
        let scenario = Scenario::new("AWS_hpet", "AWS (HPET)", "unused");
        let source =
            Source::scenario(&scenario, ScanConfig::iperf(&[]), LogKind::Iperf).with_protocol("tcp");
        let overrides = HashMap::new();

        assert!(source
            .parse_name("tundra-ns_192.0.0.171_tcp_30s", &overrides)
            .is_ok());
        let err = source
            .parse_name("tundra-ns_192.0.0.171_udp_30s", &overrides)
            .unwrap_err();
        assert!(err.is_filtered());
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.output_dir = dir.path().join("nested").join("img");

        let ctx = Context::new(&config, false);
        let out = ctx.prepare_output_dir().unwrap();

        assert!(out.is_dir());
    }
}
