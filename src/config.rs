//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.nat64plot.toml` files. Every field has a default, so an empty file
//! (or no file at all) reproduces the standard measurement layout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".nat64plot.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chart geometry and annotation settings.
    #[serde(default)]
    pub plot: PlotConfig,

    /// Namespace colours.
    #[serde(default)]
    pub namespaces: NamespaceConfig,

    /// Filename token -> pretty address overrides for IPv6 targets.
    #[serde(default = "default_ip_labels")]
    pub ip_labels: BTreeMap<String, String>,

    /// `rtt` command.
    #[serde(default)]
    pub rtt: RttConfig,

    /// `tcp` command.
    #[serde(default)]
    pub throughput: ThroughputConfig,

    /// `udp` command.
    #[serde(default)]
    pub udp: UdpConfig,

    /// `rtt-summary` command.
    #[serde(default)]
    pub rtt_summary: RttSummaryConfig,

    /// `throughput-summary` command.
    #[serde(default)]
    pub throughput_summary: ThroughputSummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            plot: PlotConfig::default(),
            namespaces: NamespaceConfig::default(),
            ip_labels: default_ip_labels(),
            rtt: RttConfig::default(),
            throughput: ThroughputConfig::default(),
            udp: UdpConfig::default(),
            rtt_summary: RttSummaryConfig::default(),
            throughput_summary: ThroughputSummaryConfig::default(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory charts and tables are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("img")
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Extra room right of the last sample, as a fraction of the X range.
    #[serde(default = "default_x_margin")]
    pub x_margin: f64,

    /// Extra room above the highest sample, as a fraction of the Y range.
    #[serde(default = "default_y_margin")]
    pub y_margin: f64,

    /// Label the min and max point of every series.
    #[serde(default = "default_true")]
    pub annotate_extrema: bool,

    /// Width of one panel in pixels.
    #[serde(default = "default_panel_width")]
    pub width: u32,

    /// Height of one panel in pixels.
    #[serde(default = "default_panel_height")]
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            x_margin: default_x_margin(),
            y_margin: default_y_margin(),
            annotate_extrema: true,
            width: default_panel_width(),
            height: default_panel_height(),
        }
    }
}

fn default_x_margin() -> f64 {
    0.02
}

fn default_y_margin() -> f64 {
    0.10
}

fn default_true() -> bool {
    true
}

fn default_panel_width() -> u32 {
    700
}

fn default_panel_height() -> u32 {
    500
}

/// Namespace colour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace -> colour name (or `#rrggbb`).
    #[serde(default = "default_namespace_colors")]
    pub colors: BTreeMap<String, String>,

    /// Colours handed out to namespaces missing from `colors`.
    #[serde(default = "default_fallback_colors")]
    pub fallback: Vec<String>,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            colors: default_namespace_colors(),
            fallback: default_fallback_colors(),
        }
    }
}

fn default_namespace_colors() -> BTreeMap<String, String> {
    [
        ("tundra-ns", "red"),
        ("jool-app-ns", "green"),
        ("tayga-ns", "blue"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_fallback_colors() -> Vec<String> {
    vec!["brown", "olive", "pink", "teal", "navy", "magenta"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ip_labels() -> BTreeMap<String, String> {
    [
        ("fd00_64_64_5f00_20d2__400", "fd00:64:64:5f00:20d2::400"),
        ("2a05_d014_144f_5f00_20d2__400", "2a05:d014:144f:5f00:20d2::400"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_durations() -> Vec<String> {
    vec!["30s".to_string(), "2min".to_string()]
}

/// Ping RTT plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RttConfig {
    #[serde(default = "default_rtt_folder")]
    pub folder: PathBuf,

    /// Scenario name used in the title and file name.
    #[serde(default = "default_rtt_scenario")]
    pub scenario: String,

    /// Clocksource label.
    #[serde(default = "default_rtt_clock")]
    pub clock: String,

    /// Only files ending in `_<duration>.txt` are plotted.
    #[serde(default = "default_rtt_duration")]
    pub duration: String,
}

impl Default for RttConfig {
    fn default() -> Self {
        Self {
            folder: default_rtt_folder(),
            scenario: default_rtt_scenario(),
            clock: default_rtt_clock(),
            duration: default_rtt_duration(),
        }
    }
}

fn default_rtt_folder() -> PathBuf {
    PathBuf::from("RawMessungen/PingSingleMachineRTT")
}

fn default_rtt_scenario() -> String {
    "Single".to_string()
}

fn default_rtt_clock() -> String {
    "tsc".to_string()
}

fn default_rtt_duration() -> String {
    "30s".to_string()
}

/// TCP throughput plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputConfig {
    #[serde(default = "default_throughput_folder")]
    pub folder: PathBuf,

    #[serde(default = "default_throughput_scenario")]
    pub scenario: String,

    #[serde(default = "default_rtt_clock")]
    pub clock: String,

    /// Durations, one panel column each.
    #[serde(default = "default_durations")]
    pub durations: Vec<String>,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            folder: default_throughput_folder(),
            scenario: default_throughput_scenario(),
            clock: default_rtt_clock(),
            durations: default_durations(),
        }
    }
}

fn default_throughput_folder() -> PathBuf {
    PathBuf::from("RawMessungen/LocalSingle_tsc_clocktime")
}

fn default_throughput_scenario() -> String {
    "Single".to_string()
}

/// UDP plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    #[serde(default = "default_udp_folder")]
    pub folder: PathBuf,

    #[serde(default = "default_durations")]
    pub durations: Vec<String>,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            folder: default_udp_folder(),
            durations: default_durations(),
        }
    }
}

fn default_udp_folder() -> PathBuf {
    PathBuf::from("UDP_1/Messungen")
}

/// One measurement scenario of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Short name used in tables (`AWS`, `LocalSingle_tsc`).
    pub name: String,
    /// Display name used in chart titles.
    #[serde(default)]
    pub label: Option<String>,
    /// Folder holding the scenario's measurement files.
    pub folder: PathBuf,
}

impl Scenario {
    pub fn new(name: &str, label: &str, folder: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            folder: PathBuf::from(folder),
        }
    }

    /// Title label, falling back to the name.
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Parse a `NAME=FOLDER` command-line value.
    pub fn parse_arg(value: &str) -> Result<Self, String> {
        let (name, folder) = value
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=FOLDER, got '{}'", value))?;

        if name.trim().is_empty() || folder.trim().is_empty() {
            return Err(format!("expected NAME=FOLDER, got '{}'", value));
        }

        Ok(Self {
            name: name.trim().to_string(),
            label: None,
            folder: PathBuf::from(folder.trim()),
        })
    }
}

/// RTT summary table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RttSummaryConfig {
    /// Scenarios in table order.
    #[serde(default = "default_rtt_scenarios")]
    pub scenarios: Vec<Scenario>,

    /// Only `_<duration>.txt` files are summarized.
    #[serde(default = "default_rtt_duration")]
    pub duration: String,
}

impl Default for RttSummaryConfig {
    fn default() -> Self {
        Self {
            scenarios: default_rtt_scenarios(),
            duration: default_rtt_duration(),
        }
    }
}

fn default_rtt_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("AWS", "AWS", "RawMessungen/PingAWS"),
        Scenario::new("Single", "Single Local Host", "RawMessungen/PingSingleMachineRTT"),
        Scenario::new("Double", "Dual Local Host", "RawMessungen/PingDoubleMachineRTT"),
    ]
}

/// Throughput summary table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputSummaryConfig {
    /// Scenarios in table order.
    #[serde(default = "default_throughput_scenarios")]
    pub scenarios: Vec<Scenario>,

    /// Durations, in table order; one bar chart each.
    #[serde(default = "default_durations")]
    pub durations: Vec<String>,
}

impl Default for ThroughputSummaryConfig {
    fn default() -> Self {
        Self {
            scenarios: default_throughput_scenarios(),
            durations: default_durations(),
        }
    }
}

fn default_throughput_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("AWS_hpet", "AWS (HPET)", "RawMessungen/AWS_hpet_clocktime"),
        Scenario::new("AWS_kvm", "AWS (KVM-Clock)", "RawMessungen/AWS_kvm-clock_clocktime"),
        Scenario::new(
            "LocalDouble_hpet",
            "Dual Local (HPET)",
            "RawMessungen/LocalDouble_hpet_clocktime",
        ),
        Scenario::new(
            "LocalDouble_tsc",
            "Dual Local (TSC)",
            "RawMessungen/LocalDouble_tsc_clocktime",
        ),
        Scenario::new(
            "LocalSingle_hpet",
            "Single Local (HPET)",
            "RawMessungen/LocalSingle_hpet_clocktime",
        ),
        Scenario::new(
            "LocalSingle_tsc",
            "Single Local (TSC)",
            "RawMessungen/LocalSingle_tsc_clocktime",
        ),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }

        match &args.command {
            Some(Command::Rtt(rtt)) => {
                if let Some(ref folder) = rtt.folder {
                    self.rtt.folder = folder.clone();
                }
                if let Some(ref scenario) = rtt.scenario {
                    self.rtt.scenario = scenario.clone();
                }
                if let Some(ref clock) = rtt.clock {
                    self.rtt.clock = clock.clone();
                }
                if let Some(ref duration) = rtt.duration {
                    self.rtt.duration = duration.clone();
                }
            }
            Some(Command::Tcp(tcp)) => {
                if let Some(ref folder) = tcp.folder {
                    self.throughput.folder = folder.clone();
                }
                if let Some(ref scenario) = tcp.scenario {
                    self.throughput.scenario = scenario.clone();
                }
                if let Some(ref clock) = tcp.clock {
                    self.throughput.clock = clock.clone();
                }
                if let Some(ref durations) = tcp.durations {
                    self.throughput.durations = durations.clone();
                }
            }
            Some(Command::Udp(udp)) => {
                if let Some(ref folder) = udp.folder {
                    self.udp.folder = folder.clone();
                }
                if let Some(ref durations) = udp.durations {
                    self.udp.durations = durations.clone();
                }
            }
            Some(Command::RttSummary(summary)) => {
                if !summary.scenarios.is_empty() {
                    self.rtt_summary.scenarios = summary.scenarios.clone();
                }
            }
            Some(Command::ThroughputSummary(summary)) => {
                if !summary.scenarios.is_empty() {
                    self.throughput_summary.scenarios = summary.scenarios.clone();
                }
                if let Some(ref durations) = summary.durations {
                    self.throughput_summary.durations = durations.clone();
                }
            }
            None => {}
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.plot.x_margin) || !(0.0..=1.0).contains(&self.plot.y_margin)
        {
            anyhow::bail!("Plot margins must be between 0.0 and 1.0");
        }
        if self.plot.width < 100 || self.plot.height < 100 {
            anyhow::bail!("Panel size must be at least 100x100 pixels");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
