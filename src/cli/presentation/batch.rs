//! Suggestion batch presentation.

use crate::error::CliError;
use crate::types::{Priority, SuggestionBatch};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;

fn priority_label(priority: Priority, color: bool) -> String {
    let label = priority.as_str();
    if !color {
        return label.to_string();
    }
    match priority {
        Priority::High => label.red().bold().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.dimmed().to_string(),
    }
}

/// Table of suggestions, then any attached code, then the summary line.
pub fn format_batch_text(batch: &SuggestionBatch, color: bool) -> String {
    let mut out = String::new();

    if let Some(kind) = batch.error {
        let heading = format!("Request failed ({})", kind);
        if color {
            out.push_str(&format!("{}\n", heading.red().bold()));
        } else {
            out.push_str(&format!("{}\n", heading));
        }
        out.push_str(&format!("  {}\n", batch.summary));
        return out;
    }

    if batch.is_empty() {
        out.push_str("No suggestions.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["#", "Type", "Priority", "Title", "Description"]);
        for (i, suggestion) in batch.suggestions.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                suggestion.kind.as_str().to_string(),
                priority_label(suggestion.priority, color),
                suggestion.title.clone(),
                suggestion.description.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));

        for (i, suggestion) in batch.suggestions.iter().enumerate() {
            if suggestion.code.trim().is_empty() {
                continue;
            }
            out.push_str(&format!("\n[{}] {}\n", i + 1, suggestion.title));
            for line in suggestion.code.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }

    if !batch.summary.is_empty() {
        out.push_str(&format!(
            "\nSummary: {} (confidence {:.2})\n",
            batch.summary, batch.confidence
        ));
    }
    out
}

pub fn format_batch_json(batch: &SuggestionBatch) -> Result<String, CliError> {
    serde_json::to_string_pretty(batch).map_err(|e| CliError::Output(e.to_string()))
}
