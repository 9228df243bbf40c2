//! CLI presentation: text formatters per command family.

use crate::remote::FilesetInfo;
use crate::workspace::{DeleteReport, PendingChanges, PullOutcome, PushReport, StatusReport};
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::Path;

/// Paths listed per change category before the rest is summarized.
const MAX_LISTED_PATHS: usize = 20;

fn section_title(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn push_paths(lines: &mut Vec<String>, marker: String, paths: &[String]) {
    for path in paths.iter().take(MAX_LISTED_PATHS) {
        lines.push(format!("  {} {}", marker, path));
    }
    if paths.len() > MAX_LISTED_PATHS {
        lines.push(format!("  ... and {} more", paths.len() - MAX_LISTED_PATHS));
    }
}

pub fn format_init_summary(name: &str, root: &Path) -> String {
    format!("Initialized workspace '{}' at {}", name, root.display())
}

pub fn format_push_report(report: &PushReport) -> String {
    let mut lines = vec![
        section_title(&format!("Pushed fileset '{}'", report.fileset)),
        format!("Entries:       {}", report.entries),
        format!("Total size:    {}", human_bytes(report.size)),
        format!("Unique blobs:  {}", report.digests),
        format!(
            "Uploaded:      {} ({})",
            report.uploaded,
            human_bytes(report.bytes_uploaded)
        ),
        format!("Already there: {}", report.already_present),
    ];
    if !report.skipped.is_empty() {
        lines.push(format!("{}", "Skipped (not regular files):".yellow()));
        for path in &report.skipped {
            lines.push(format!("  {}", path.display()));
        }
    }
    lines.join("\n")
}

pub fn format_pull_outcome(outcome: &PullOutcome) -> String {
    match outcome {
        PullOutcome::Completed(report) => {
            let mut lines = vec![
                section_title(&format!("Pulled fileset '{}'", report.fileset)),
                format!("Entries:    {}", report.entries),
                format!(
                    "Downloaded: {} ({})",
                    report.downloaded,
                    human_bytes(report.bytes_downloaded)
                ),
                format!("Preserved:  {}", report.preserved),
                format!("Restored:   {}", report.restored),
            ];
            if !report.eviction.removed.is_empty() {
                lines.push(format!(
                    "Evicted {} cached blobs ({}), cache now {}",
                    report.eviction.removed.len(),
                    human_bytes(report.eviction.freed),
                    human_bytes(report.eviction.remaining)
                ));
            }
            lines.join("\n")
        }
        PullOutcome::Declined(changes) => format!(
            "Pull cancelled; {} local changes kept in {}",
            changes.added.len() + changes.updated.len(),
            changes.root.display()
        ),
    }
}

pub fn format_pending_changes(changes: &PendingChanges) -> String {
    let mut lines = vec![format!(
        "Local changes in {} would be lost:",
        changes.root.display()
    )];
    push_paths(&mut lines, format!("{}", "+".green()), &changes.added);
    push_paths(&mut lines, format!("{}", "~".yellow()), &changes.updated);
    lines.join("\n")
}

pub fn format_status(report: &StatusReport, patterns: &[String]) -> String {
    let mut lines = vec![
        section_title(&format!("Workspace '{}'", report.workspace)),
        format!("Root:     {}", report.root.display()),
        format!(
            "Fileset:  {}",
            report.current.as_deref().unwrap_or("(none pulled or pushed)")
        ),
    ];
    if !patterns.is_empty() {
        lines.push(format!("Patterns: {}", patterns.join(", ")));
    }
    if report.is_clean() {
        lines.push("No local changes".to_string());
        return lines.join("\n");
    }
    lines.push(String::new());
    push_paths(&mut lines, format!("{}", "+".green()), &report.added);
    push_paths(&mut lines, format!("{}", "~".yellow()), &report.updated);
    push_paths(&mut lines, format!("{}", "-".red()), &report.removed);
    lines.join("\n")
}

pub fn format_filesets(workspace: &str, filesets: &[FilesetInfo], current: Option<&str>) -> String {
    if filesets.is_empty() {
        return format!("No filesets in workspace '{}'", workspace);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Fileset", "Last Modified", "Current"]);
    for info in filesets {
        let marker = if current == Some(info.name.as_str()) { "*" } else { "" };
        table.add_row(vec![
            info.name.clone(),
            info.last_modified.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            marker.to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_workspaces(names: &[String]) -> String {
    if names.is_empty() {
        return "No workspaces on the remote".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Workspace"]);
    for name in names {
        table.add_row(vec![name]);
    }
    table.to_string()
}

pub fn format_delete_report(report: &DeleteReport) -> String {
    format!(
        "Deleted fileset '{}' ({} unreferenced blobs removed)",
        report.fileset, report.blobs_deleted
    )
}
