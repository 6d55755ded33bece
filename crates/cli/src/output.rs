// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering of daemon responses to text or JSON.

use clap::ValueEnum;
use serde::Serialize;

use zpm_core::WorkerName;
use zpm_daemon::protocol::{StoreRecord, WorkerStats};

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_list(names: &[WorkerName], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&names),
        OutputFormat::Text => {
            if names.is_empty() {
                println!("No workers registered");
                return;
            }
            for name in names {
                println!("{}", name);
            }
        }
    }
}

pub fn print_stats(stats: &[WorkerStats], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            if stats.is_empty() {
                println!("No workers registered");
                return;
            }
            println!("{:<16} {:<10} {:>5} {:>10} {:>8} {:>10}", "NAME", "STATUS", "PIDS", "RESTARTS", "CPU%", "RSS");
            for s in stats {
                println!(
                    "{:<16} {:<10} {:>5} {:>10} {:>8.1} {:>10}",
                    s.name,
                    s.status,
                    s.pids.len(),
                    s.restart_count,
                    s.cpu_percent,
                    format_bytes(s.rss_bytes)
                );
                if let Some(err) = &s.last_error {
                    println!("  {}", color::muted(&format!("last error: {err}")));
                }
            }
        }
    }
}

pub fn print_store(records: &[StoreRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No workers registered");
                return;
            }
            for r in records {
                println!(
                    "{:<16} {:<10} restarts={}",
                    r.config.name, r.status, r.restart_count
                );
            }
        }
    }
}

pub fn print_started(name: &WorkerName) {
    println!("{} '{}' started", color::header("Worker"), name);
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to encode output as json: {err}"),
    }
}
