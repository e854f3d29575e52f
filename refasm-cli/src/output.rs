use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use refasm::{pipeline::PipelineStats, GenerationSummary};
use serde::Serialize;

/// Print `data` as JSON (if `json`) or call `display_fn` for human-readable output.
pub fn print_output<T: Serialize>(
    data: &T,
    json: bool,
    display_fn: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if json {
        let json = serde_json::to_string_pretty(data)?;
        println!("{json}");
    } else {
        display_fn(data);
    }
    Ok(())
}

/// What a run produced, in printable form.
#[derive(Debug, Serialize)]
pub struct Report {
    pub input: String,
    pub output: String,
    pub modifiers: String,
    pub mvid: String,
    pub changes: Vec<(String, usize)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outlines: Vec<String>,
}

impl Report {
    pub fn new(input: &std::path::Path, modifiers: String, summary: &GenerationSummary) -> Self {
        Report {
            input: input.display().to_string(),
            output: summary.output.display().to_string(),
            modifiers,
            mvid: summary.mvid.to_string(),
            changes: changes(&summary.stats),
            warnings: summary.warnings.clone(),
            outlines: summary
                .outlines
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }
    }

    pub fn print(&self) {
        println!("input: {}", self.input);
        println!("ref assembly: {}", self.output);
        println!("access modifiers: {}", self.modifiers);
        println!("mvid: {}", self.mvid);

        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic);
        for (label, count) in self.changes.iter().filter(|(_, count)| *count > 0) {
            table.add_row(vec![label.clone(), count.to_string()]);
        }
        if let Some(column) = table.column_mut(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        for line in table.to_string().lines() {
            println!("  {}", line.trim_end());
        }

        if !self.warnings.is_empty() {
            println!("{} warning(s)", self.warnings.len());
        }
        for outline in &self.outlines {
            println!("outline: {outline}");
        }
    }
}

fn changes(stats: &PipelineStats) -> Vec<(String, usize)> {
    [
        ("bodies stripped", stats.bodies_stripped),
        ("constructor chains kept", stats.constructor_chains_preserved),
        ("types removed", stats.types_removed),
        ("nested types removed", stats.nested_types_removed),
        ("base types re-rooted", stats.bases_rerooted),
        ("interfaces removed", stats.interfaces_removed),
        ("methods removed", stats.methods_removed),
        ("fields removed", stats.fields_removed),
        ("accessors removed", stats.accessors_removed),
        ("properties removed", stats.properties_removed),
        ("attributes removed", stats.attributes_removed),
        ("initial values removed", stats.initial_values_removed),
        ("resources removed", stats.resources_removed),
        ("common attributes removed", stats.common_attributes_removed),
        ("dangling references", stats.dangling_references),
    ]
    .into_iter()
    .map(|(label, count)| (label.to_string(), count))
    .collect()
}
