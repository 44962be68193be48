use super::format_bytes;
use anyhow::Result;
use colored::*;
use gogarden_core::{CacheStats, CleanupReport, HistoryEntry, ImageUri, Resolution};
use serde_json::{Value, json};
use std::path::Path;

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn uri(&self, uri: &ImageUri) -> String {
        match uri {
            ImageUri::Local(_) => format!("{} {uri}", self.colorize("local ", |s| s.green())),
            ImageUri::Remote(_) => format!("{} {uri}", self.colorize("remote", |s| s.yellow())),
        }
    }

    pub fn stats(&self, stats: &CacheStats, cache_dir: &Path) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            self.colorize("Image cache", |s| s.bold().blue())
        ));
        output.push_str(&format!("  Directory: {}\n", cache_dir.display()));
        output.push_str(&format!("  Files: {}\n", stats.file_count));
        output.push_str(&format!(
            "  Size: {} ({:.2} MB)\n",
            format_bytes(stats.total_size_bytes),
            stats.total_size_mb()
        ));
        output.push_str(&format!("  Indexed: {}\n", stats.memory_cache_count));
        output.push_str(&format!("  Queued: {}\n", stats.queue_length));
        output
    }

    pub fn cleanup(&self, report: &CleanupReport) -> String {
        let deleted = self.colorize(&report.deleted.to_string(), |s| s.red());
        let mut output = format!(
            "Scanned {} files: deleted {deleted}, kept {} ({})\n",
            report.scanned,
            report.retained,
            format_bytes(report.retained_bytes)
        );
        if report.failed > 0 {
            output.push_str(&self.colorize(
                &format!("{} files could not be processed\n", report.failed),
                |s| s.yellow(),
            ));
        }
        output
    }

    pub fn history(&self, entries: &[HistoryEntry]) -> String {
        if entries.is_empty() {
            return "No identifications recorded\n".to_string();
        }

        let mut output = String::new();
        for entry in entries {
            let marker = if entry.matched_in_database {
                self.colorize("✓", |s| s.green())
            } else {
                self.colorize("?", |s| s.yellow())
            };
            output.push_str(&format!(
                "{marker} {}  {} ({:.1}%)\n",
                entry.date.format("%Y-%m-%d %H:%M"),
                self.colorize(&entry.plant_name, |s| s.bold()),
                entry.confidence
            ));
            if !entry.scientific_name.is_empty() {
                output.push_str(&format!(
                    "    {}\n",
                    self.colorize(&entry.scientific_name, |s| s.italic())
                ));
            }
        }
        output
    }

    pub fn resolution(&self, resolution: &Resolution) -> String {
        match resolution {
            Resolution::Loaded { index, uri } => {
                format!("Candidate {index}: {}\n", self.uri(uri))
            }
            Resolution::Placeholder(placeholder) => format!(
                "{} {placeholder}\n",
                self.colorize("placeholder", |s| s.dimmed())
            ),
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &Value) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    pub fn stats(&self, stats: &CacheStats, cache_dir: &Path) -> Result<String> {
        let mut value = serde_json::to_value(stats)?;
        value["total_size_mb"] = json!(stats.total_size_mb());
        value["cache_dir"] = json!(cache_dir.to_string_lossy());
        self.render(&value)
    }

    pub fn cleanup(&self, report: &CleanupReport) -> Result<String> {
        self.render(&serde_json::to_value(report)?)
    }

    pub fn history(&self, entries: &[HistoryEntry]) -> Result<String> {
        self.render(&serde_json::to_value(entries)?)
    }

    pub fn resolution(&self, resolution: &Resolution) -> Result<String> {
        let value = match resolution {
            Resolution::Loaded { index, uri } => json!({
                "status": "loaded",
                "index": index,
                "local": uri.is_local(),
                "uri": uri.as_str(),
            }),
            Resolution::Placeholder(placeholder) => json!({
                "status": "placeholder",
                "title": placeholder.title,
                "glyph": placeholder.glyph,
            }),
        };
        self.render(&value)
    }
}
