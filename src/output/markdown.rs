//! Markdown run report

use crate::output::RunSummary;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a run
pub fn write_markdown_summary(
    summary: &RunSummary,
    config_hash: Option<&str>,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary, config_hash);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary, config_hash: Option<&str>) -> String {
    let mut md = String::new();

    md.push_str("# Doc-Harvest Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if summary.interrupted {
        "interrupted"
    } else {
        "completed"
    };
    md.push_str(&format!("- **Status**: {}\n", status));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Queue\n\n");
    md.push_str(&format!("- **Total Entries**: {}\n", summary.total_entries));
    md.push_str(&format!("- **Started At Index**: {}\n", summary.start_index));
    md.push_str(&format!("- **Entries Seen**: {}\n", summary.entries_seen));
    md.push_str(&format!("- **Remaining**: {}\n", summary.remaining()));
    md.push_str(&format!(
        "- **Processed URLs (all runs)**: {}\n\n",
        summary.processed_total
    ));

    md.push_str("## Outcomes\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Succeeded | {} |\n", summary.succeeded));
    md.push_str(&format!(
        "| Already Processed | {} |\n",
        summary.already_processed
    ));
    md.push_str(&format!("| Literal | {} |\n", summary.literals));
    md.push_str(&format!("| Outlier | {} |\n", summary.outliers));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| Link Failures | {} |\n\n", summary.link_failures));

    md.push_str("## Blocked Domains\n\n");
    md.push_str(&format!("Total: {}\n\n", summary.blocked_domains));
    if !summary.newly_blocked.is_empty() {
        md.push_str("Blocked during this run:\n\n");
        for domain in &summary.newly_blocked {
            md.push_str(&format!("- {}\n", domain));
        }
        md.push('\n');
    }

    md
}
