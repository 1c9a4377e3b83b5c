//! Human and machine renderings of a [`DiffResult`].
use std::fmt::Write;

use colored::Colorize;
use serde::Serialize;

use crate::diff::DiffResult;

#[derive(Serialize)]
struct Report<'a> {
    left: &'a str,
    right: &'a str,
    #[serde(flatten)]
    diff: &'a DiffResult,
}

pub fn render_json(diff: &DiffResult, left: &str, right: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report { left, right, diff })
}

pub fn render_text(diff: &DiffResult, left: &str, right: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} {}", left.bold(), "vs".dimmed(), right.bold());

    if diff.is_empty() {
        let _ = writeln!(out, "{}", "No differences.".green());
    }

    section(&mut out, &format!("Only in {left}"), &diff.only_left, |out, p| {
        let _ = writeln!(out, "  {} {p}", "-".red());
    });
    section(&mut out, &format!("Only in {right}"), &diff.only_right, |out, p| {
        let _ = writeln!(out, "  {} {p}", "+".green());
    });
    section(&mut out, "Type mismatches", &diff.type_mismatches, |out, m| {
        let _ = writeln!(
            out,
            "  {} {}: {} → {}",
            "~".yellow(),
            m.path,
            m.left.to_string().red(),
            m.right.to_string().green()
        );
    });
    section(&mut out, "Presence mismatches", &diff.presence_mismatches, |out, m| {
        let _ = writeln!(out, "  {} {}: {} → {}", "?".cyan(), m.path, m.left, m.right);
    });

    let changes: Vec<_> = diff.path_changes.iter().collect();
    section(&mut out, "Path changes", &changes, |out, (name, change)| {
        let _ = writeln!(out, "  {} {}", "↔".magenta(), name.bold());
        if !change.shared.is_empty() {
            let _ = writeln!(out, "      both:  {}", change.shared.join(", "));
        }
        if !change.only_left.is_empty() {
            let _ = writeln!(out, "      {left}:  {}", change.only_left.join(", "));
        }
        if !change.only_right.is_empty() {
            let _ = writeln!(out, "      {right}:  {}", change.only_right.join(", "));
        }
    });

    section(&mut out, "Common", &diff.common, |out, c| {
        let _ = writeln!(out, "  {} {}: {}", "=".dimmed(), c.path, c.ty);
    });
    out
}

fn section<T>(out: &mut String, title: &str, items: &[T], mut line: impl FnMut(&mut String, &T)) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{} ({})", title.bold().underline(), items.len());
    for item in items {
        line(out, item);
    }
}
