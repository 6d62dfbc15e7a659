//! Measurement file discovery.
//!
//! This module lists the measurement files of a flat folder, filtered by
//! extension and by duration suffix, in a stable (file name) order.

pub mod filename;

pub use filename::{parse_iperf_name, parse_ping_name, require_protocol};

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extension to include, without the dot (e.g. "txt", "json").
    pub extension: String,
    /// Duration labels to keep (e.g. ["30s"]); empty keeps everything.
    pub durations: Vec<String>,
}

impl ScanConfig {
    /// Ping logs (`*.txt`).
    pub fn ping(durations: &[String]) -> Self {
        Self {
            extension: "txt".to_string(),
            durations: durations.to_vec(),
        }
    }

    /// iperf3 JSON logs (`*.json`).
    pub fn iperf(durations: &[String]) -> Self {
        Self {
            extension: "json".to_string(),
            durations: durations.to_vec(),
        }
    }
}

/// Scanned file information.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name including extension.
    pub file_name: String,
    /// File name without extension; this is what gets split into tokens.
    pub stem: String,
    /// File size in bytes.
    pub size: u64,
}

/// File scanner for one measurement folder.
pub struct FileScanner {
    config: ScanConfig,
    folder: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(folder: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            config,
            folder: folder.into(),
        }
    }

    /// Scan for all matching files, sorted by file name.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.folder.is_dir() {
            return Err(anyhow!("Directory not found: {}", self.folder.display()));
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(&self.folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read entry in {}: {}", self.folder.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.matches(&file_name) {
                continue;
            }

            let stem = Path::new(&file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                file_name,
                stem,
                size,
            });
        }

        debug!(
            "Found {} .{} files in {}",
            files.len(),
            self.config.extension,
            self.folder.display()
        );

        Ok(files)
    }

    /// Check if a file name matches scan criteria.
    pub fn matches(&self, file_name: &str) -> bool {
        // Hidden files
        if file_name.starts_with('.') {
            return false;
        }

        let suffix = format!(".{}", self.config.extension);
        let Some(stem) = file_name.strip_suffix(&suffix) else {
            return false;
        };

        self.config.durations.is_empty()
            || self
                .config
                .durations
                .iter()
                .any(|d| stem.ends_with(&format!("_{}", d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_matches_extension_and_duration() {
        let scanner = FileScanner::new("unused", ScanConfig::ping(&["30s".to_string()]));

        assert!(scanner.matches("tundra-ns_192.0.0.171_ipv4_30s.txt"));
        assert!(!scanner.matches("tundra-ns_192.0.0.171_ipv4_2min.txt"));
        assert!(!scanner.matches("tundra-ns_192.0.0.171_ipv4_30s.json"));
        assert!(!scanner.matches(".hidden_ipv4_30s.txt"));
    }

    #[test]
    fn test_matches_all_durations_when_empty() {
        let scanner = FileScanner::new("unused", ScanConfig::iperf(&[]));

        assert!(scanner.matches("jool-app-ns_192.0.0.171_tcp_2min.json"));
        assert!(!scanner.matches("notes.txt"));
    }

    #[test]
    fn test_scan_sorted_and_flat() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_1.2.3.4_tcp_30s.json"), "{}").unwrap();
        fs::write(dir.path().join("a_1.2.3.4_tcp_30s.json"), "{}").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c_1.2.3.4_tcp_30s.json"), "{}").unwrap();

        let scanner = FileScanner::new(dir.path(), ScanConfig::iperf(&[]));
        let files = scanner.scan().unwrap();

        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_1.2.3.4_tcp_30s.json", "b_1.2.3.4_tcp_30s.json"]);
        assert_eq!(files[0].stem, "a_1.2.3.4_tcp_30s");
        assert_eq!(files[0].size, 2);
    }

    #[test]
    fn test_scan_missing_folder() {
        let scanner = FileScanner::new("/definitely/not/here", ScanConfig::ping(&[]));
        assert!(scanner.scan().is_err());
    }
}
