//! Output formatting for CLI

use bookprobe_common::Verdict;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a whole document; tables fall back to pretty JSON
pub fn print_document<T: Serialize + ?Sized>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value).unwrap_or_default()),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Key/value pairs, one per line or as a two-column table
pub fn print_pairs(pairs: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(vec!["Field", "Value"]);
            for (key, value) in pairs {
                table.add_row(vec![key.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let map: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                .collect();
            print_document(&map, format);
        }
        OutputFormat::Plain => {
            for (key, value) in pairs {
                println!("{}: {}", key, value);
            }
        }
    }
}

pub fn verdict_mark(verdict: Verdict) -> String {
    match verdict {
        Verdict::Pass => "✓ pass".green().to_string(),
        Verdict::Fail => "✗ fail".red().to_string(),
        Verdict::Unconfirmed => "~ observed".yellow().to_string(),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "i".blue(), message);
}
