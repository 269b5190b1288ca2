//! Notification texts and size-limited chunking.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{ChangeEvent, DiffKind, FailureState, NetworkName};

/// Per-message ceiling of the push channel, in UTF-16 code units.
pub const DEFAULT_MAX_MESSAGE_UNITS: usize = 4096;

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn push_section<'a>(
    lines: &mut Vec<String>,
    title: &str,
    marker: char,
    names: impl ExactSizeIterator<Item = &'a NetworkName>,
) {
    if names.len() == 0 {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title} ({}):", names.len()));
    lines.extend(names.map(|name| format!("{marker} {name}")));
}

/// Added/removed report for a steady-state change.
pub fn change_message(event: &ChangeEvent, target: &str) -> String {
    if event.kind == DiffKind::Initialization {
        return initial_message(event, target);
    }
    let mut lines = vec![format!("🔔 Network list changed on {target}")];
    push_section(&mut lines, "Added", '+', event.added.iter());
    push_section(&mut lines, "Removed", '-', event.removed.iter());
    lines.push(String::new());
    lines.push(stamp(event.timestamp));
    lines.join("\n")
}

/// Report for the first accepted snapshot.
pub fn initial_message(event: &ChangeEvent, target: &str) -> String {
    let mut lines = vec![format!("📋 Now watching {target}")];
    push_section(&mut lines, "Networks", '•', event.added.iter());
    lines.push(String::new());
    lines.push(stamp(event.timestamp));
    lines.join("\n")
}

pub fn escalation_message(failures: &FailureState, target: &str) -> String {
    format!(
        "⚠️ Monitoring {target} failed {} time(s) in a row.\nLast error: {}",
        failures.consecutive_failures(),
        failures.last_error().unwrap_or("unknown")
    )
}

pub fn recovery_message(failed_cycles: u32, target: &str) -> String {
    format!("✅ Monitoring {target} recovered after {failed_cycles} failed cycle(s).")
}

pub fn startup_message(target: &str, interval_secs: u64) -> String {
    format!("🚀 Network watcher started for {target}, checking every {interval_secs}s.")
}

pub fn heartbeat_message(target: &str, at: DateTime<Utc>) -> String {
    format!("🕒 Checking {target} for network changes ({})", stamp(at))
}

pub fn fatal_message(reason: &str) -> String {
    format!("🚨 Network watcher cannot start: {reason}")
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Splits `text` into pieces of at most `limit` UTF-16 code units (the unit
/// the push channel counts in), breaking only between lines so no entity
/// name is cut. A single line longer than `limit` is the only thing ever
/// split mid-line, and then only on char boundaries.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = utf16_len(line);
        if line_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            split_line(line, limit, &mut chunks);
            continue;
        }

        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + needed > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

fn split_line(line: &str, limit: usize, chunks: &mut Vec<String>) {
    let mut part = String::new();
    let mut part_len = 0;
    for c in line.chars() {
        if part_len + c.len_utf16() > limit {
            chunks.push(std::mem::take(&mut part));
            part_len = 0;
        }
        part.push(c);
        part_len += c.len_utf16();
    }
    if !part.is_empty() {
        chunks.push(part);
    }
}
