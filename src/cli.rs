//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values. Values left unset here fall
//! back to the configuration file and then to the built-in defaults.

use crate::config::Scenario;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// nat64plot - charts and tables for NAT64/DNS64 translator measurements
///
/// Parses ping logs and iperf3 JSON reports of Tundra, Jool and Tayga
/// measurement runs and renders SVG charts and summary tables.
///
/// Examples:
///   nat64plot rtt --folder RawMessungen/PingAWS --scenario AWS --clock kvm-clock
///   nat64plot tcp --layout combined
///   nat64plot rtt-summary --scenario AWS=RawMessungen/PingAWS
///   nat64plot --dry-run throughput-summary
///   nat64plot --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nat64plot.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory charts and tables are written to (default: img)
    #[arg(short, long, value_name = "DIR", global = true, env = "NAT64PLOT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Do not show the per-file progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Dry run: list discovered files and their parsed metadata
    ///
    /// Nothing is rendered or written.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Generate a default .nat64plot.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Chart and table families.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// ICMP RTT over sequence number from ping logs
    Rtt(RttArgs),

    /// TCP throughput over time from iperf3 JSON reports
    Tcp(TcpArgs),

    /// UDP throughput, loss and jitter from iperf3 JSON reports
    Udp(UdpArgs),

    /// RTT summary table and comparison bars across scenarios
    RttSummary(RttSummaryArgs),

    /// TCP throughput summary table and comparison bars across scenarios
    ThroughputSummary(ThroughputSummaryArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Rtt(_) => "rtt",
            Command::Tcp(_) => "tcp",
            Command::Udp(_) => "udp",
            Command::RttSummary(_) => "rtt-summary",
            Command::ThroughputSummary(_) => "throughput-summary",
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RttArgs {
    /// Folder with ping `.txt` logs
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Scenario name for titles and file names
    #[arg(long, value_name = "NAME")]
    pub scenario: Option<String>,

    /// Clocksource label (hpet, tsc, kvm-clock)
    #[arg(long, value_name = "CLOCK")]
    pub clock: Option<String>,

    /// Duration label of the files to plot
    #[arg(long, value_name = "LABEL")]
    pub duration: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TcpArgs {
    /// Folder with iperf3 `.json` reports
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Scenario name for titles and file names
    #[arg(long, value_name = "NAME")]
    pub scenario: Option<String>,

    /// Clocksource label (hpet, tsc, kvm-clock)
    #[arg(long, value_name = "CLOCK")]
    pub clock: Option<String>,

    /// Duration labels, one panel column each (comma-separated)
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub durations: Option<Vec<String>>,

    /// Chart layout
    #[arg(long, value_enum, default_value = "all")]
    pub layout: Layout,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct UdpArgs {
    /// Folder with iperf3 `.json` reports
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Duration labels, one panel column each (comma-separated)
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub durations: Option<Vec<String>>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RttSummaryArgs {
    /// Scenario as NAME=FOLDER; repeat to replace the configured list
    #[arg(long = "scenario", value_name = "NAME=FOLDER", value_parser = Scenario::parse_arg)]
    pub scenarios: Vec<Scenario>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ThroughputSummaryArgs {
    /// Scenario as NAME=FOLDER; repeat to replace the configured list
    #[arg(long = "scenario", value_name = "NAME=FOLDER", value_parser = Scenario::parse_arg)]
    pub scenarios: Vec<Scenario>,

    /// Duration labels to summarize (comma-separated)
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub durations: Option<Vec<String>>,
}

/// Layout of the TCP throughput charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Layout {
    /// IP version x duration grid, limits per panel
    Grid,
    /// Grid with one Y range per duration
    SameScale,
    /// One panel per duration with both IP versions
    Combined,
    /// One chart per duration, IPv6 left axis, IPv4 right axis
    DualAxis,
    /// Every layout
    #[default]
    All,
}

impl Layout {
    /// Concrete layouts this selection expands to.
    pub fn expand(&self) -> Vec<Layout> {
        match self {
            Layout::All => vec![
                Layout::Grid,
                Layout::SameScale,
                Layout::Combined,
                Layout::DualAxis,
            ],
            other => vec![*other],
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err(
                "A subcommand is required (rtt, tcp, udp, rtt-summary, throughput-summary)"
                    .to_string(),
            );
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let durations = match command {
            Command::Tcp(tcp) => tcp.durations.as_ref(),
            Command::Udp(udp) => udp.durations.as_ref(),
            Command::ThroughputSummary(summary) => summary.durations.as_ref(),
            _ => None,
        };
        if let Some(durations) = durations {
            if durations.is_empty() || durations.iter().any(|d| d.trim().is_empty()) {
                return Err("Durations must not be empty".to_string());
            }
        }

        if let Command::Rtt(rtt) = command {
            if rtt.duration.as_deref().is_some_and(|d| d.trim().is_empty()) {
                return Err("Duration must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether the per-file progress bar should be drawn.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("nat64plot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_tcp_layout() {
        let args = parse(&["tcp", "--layout", "dual-axis", "--durations", "30s,2min"]);

        match args.command {
            Some(Command::Tcp(tcp)) => {
                assert_eq!(tcp.layout, Layout::DualAxis);
                assert_eq!(tcp.durations, Some(vec!["30s".to_string(), "2min".to_string()]));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_layout_all_expands() {
        assert_eq!(Layout::All.expand().len(), 4);
        assert_eq!(Layout::Combined.expand(), vec![Layout::Combined]);
    }

    #[test]
    fn test_parse_summary_scenarios() {
        let args = parse(&[
            "rtt-summary",
            "--scenario",
            "AWS=data/aws",
            "--scenario",
            "Lab=data/lab",
        ]);

        match args.command {
            Some(Command::RttSummary(summary)) => {
                assert_eq!(summary.scenarios.len(), 2);
                assert_eq!(summary.scenarios[1].name, "Lab");
                assert_eq!(summary.scenarios[1].folder, PathBuf::from("data/lab"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_scenario_is_usage_error() {
        let result = Args::try_parse_from(["nat64plot", "rtt-summary", "--scenario", "nofolder"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["udp", "--dry-run", "-o", "charts"]);

        assert!(args.dry_run);
        assert_eq!(args.output_dir, Some(PathBuf::from("charts")));
        assert_eq!(args.command.as_ref().map(|c| c.name()), Some("udp"));
    }

    #[test]
    fn test_validation_requires_subcommand() {
        let args = parse(&[]);
        assert!(args.validate().is_err());

        let args = parse(&["--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["rtt"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        assert!(Args::try_parse_from(["nat64plot", "-v", "-q", "rtt"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["rtt"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);
        assert!(args.show_progress());

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
        assert!(!args.show_progress());
    }
}
