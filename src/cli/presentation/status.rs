//! Assistant status presentation.

use crate::assistant::AssistantStatus;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_status_text(status: &AssistantStatus) -> String {
    let mut out = format!("{}\n", "Sidekick status".bold().underline());
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    let stats = &status.orchestrator;
    let rows = [
        ("State", status.state.to_string()),
        ("Provider", status.provider.clone().unwrap_or_else(|| "offline".to_string())),
        ("Context version", status.context_version.to_string()),
        ("Last batch size", status.last_batch_size.to_string()),
        ("Provider calls", stats.provider_calls.to_string()),
        ("Cache hits", stats.cache_hits.to_string()),
        ("Dedup joins", stats.dedup_joins.to_string()),
        ("Failures", stats.failures.to_string()),
        ("Cache entries", stats.cache_entries.to_string()),
    ];
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    out.push_str(&table.to_string());
    out
}
