//! Namespace colours.
//!
//! Colours are configured by name (`red`, `orange`, ...) or as `#rrggbb`.
//! The IPv6 baseline swaps each primary colour for a distinct companion
//! so transition and baseline series never share a colour on one axis.

use crate::config::NamespaceConfig;
use plotters::style::RGBColor;

/// Neutral colour for unknown names.
pub const GRAY: RGBColor = RGBColor(128, 128, 128);

/// Resolve a colour name or `#rrggbb` hex string.
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let name = name.trim().to_lowercase();

    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }

    let rgb = match name.as_str() {
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "cyan" => (0, 190, 190),
        "magenta" => (255, 0, 255),
        "brown" => (165, 42, 42),
        "olive" => (128, 128, 0),
        "pink" => (255, 105, 180),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "black" => (0, 0, 0),
        "gray" | "grey" => (128, 128, 128),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}

/// Baseline companion of a transition colour name.
pub fn baseline_variant(name: &str) -> &str {
    match name {
        "red" => "orange",
        "green" => "purple",
        "blue" => "cyan",
        other => other,
    }
}

/// Colour lookup for namespaces.
#[derive(Debug, Clone)]
pub struct Palette {
    config: NamespaceConfig,
}

impl Palette {
    pub fn new(config: &NamespaceConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Configured colour name, or a fallback picked stably from the name.
    pub fn color_name(&self, namespace: &str) -> String {
        if let Some(name) = self.config.colors.get(namespace) {
            return name.clone();
        }

        if self.config.fallback.is_empty() {
            return "gray".to_string();
        }

        let hash = namespace
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        self.config.fallback[hash % self.config.fallback.len()].clone()
    }

    /// Colour for a transition (IPv4) series.
    pub fn transition(&self, namespace: &str) -> RGBColor {
        parse_color(&self.color_name(namespace)).unwrap_or(GRAY)
    }

    /// Colour for a baseline (IPv6) series.
    pub fn baseline(&self, namespace: &str) -> RGBColor {
        let name = self.color_name(namespace);
        parse_color(baseline_variant(&name)).unwrap_or(GRAY)
    }
}
