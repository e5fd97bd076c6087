//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use rumor_domain::{BelievabilityEntry, Rumor, RumorId, RumorRecord, SubjectId};
use rumor_engine::{DecayReport, KnownRumor, RumorPage, RumorStatistics, SpreadResult};
use serde::Serialize;
use std::collections::BTreeSet;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest content shown in a table cell
const CONTENT_WIDTH: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

/// Lineage view of one subject
#[derive(Debug, Serialize)]
pub struct LineageView {
    /// The subject asked about
    pub subject_id: SubjectId,
    /// Root rumor of the lineage
    pub root_id: RumorId,
    /// Immediate source first, root last
    pub ancestors: Vec<SubjectId>,
    /// All variants derived from the subject
    pub descendants: BTreeSet<SubjectId>,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    fn table(builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a page of rumors.
    pub fn format_rumors(&self, page: &RumorPage) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(&serde_json::json!({
                "total": page.total,
                "rumors": page.rumors,
            })),
            OutputFormat::Quiet => Ok(join_ids(page.rumors.iter().map(|r| r.id))),
            OutputFormat::Table => {
                if page.rumors.is_empty() {
                    return Ok(self.colorize("No rumors found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Content", "Severity", "Truth", "Categories", "Originator"]);
                for rumor in &page.rumors {
                    builder.push_record([
                        rumor.id.to_string(),
                        truncate(&rumor.original_content),
                        rumor.severity.to_string(),
                        format!("{:.2}", rumor.truth_value),
                        categories(rumor),
                        rumor.originator_id.to_string(),
                    ]);
                }
                Ok(format!(
                    "{}\n{}",
                    Self::table(builder),
                    self.colorize(
                        &format!("Showing {} of {} rumor(s)", page.rumors.len(), page.total),
                        "cyan"
                    )
                ))
            }
        }
    }

    /// Format a full rumor record.
    pub fn format_record(&self, record: &RumorRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(&serde_json::json!({
                "rumor": record.rumor,
                "variants": record.lineage.variants(),
                "believability": record.ledger.entries(),
                "version": record.version,
            })),
            OutputFormat::Quiet => Ok(record.id().to_string()),
            OutputFormat::Table => {
                let rumor = &record.rumor;
                let mut out = vec![
                    self.colorize(&format!("Rumor {}", rumor.id), "cyan"),
                    format!("  Content:    {}", rumor.original_content),
                    format!("  Severity:   {}", rumor.severity),
                    format!("  Truth:      {:.2}", rumor.truth_value),
                    format!("  Categories: {}", categories(rumor)),
                    format!("  Originator: {}", rumor.originator_id),
                    String::new(),
                ];

                if !record.lineage.is_empty() {
                    let mut builder = Builder::default();
                    builder.push_record(["Variant", "Source", "Content", "Strength", "Creator", "Strategy"]);
                    for v in record.lineage.variants() {
                        builder.push_record([
                            v.id.to_string(),
                            v.source_id.to_string(),
                            truncate(&v.content),
                            format!("{:.2}", v.mutation_strength),
                            v.creator_entity_id.to_string(),
                            v.strategy.clone(),
                        ]);
                    }
                    out.push(Self::table(builder));
                }

                out.push(self.entries_table(record.ledger.entries()));
                Ok(out.join("\n"))
            }
        }
    }

    fn entries_table(&self, entries: &[BelievabilityEntry]) -> String {
        if entries.is_empty() {
            return self.colorize("Nobody believes this anymore.", "yellow");
        }
        let mut builder = Builder::default();
        builder.push_record(["Entity", "Subject", "Believability", "Heard From", "Heard At"]);
        for e in entries {
            builder.push_record([
                e.entity_id.to_string(),
                e.subject_id.to_string(),
                format!("{:.3}", e.believability),
                e.heard_from_entity_id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string()),
                e.heard_at.to_string(),
            ]);
        }
        Self::table(builder)
    }

    /// Format the outcome of a spread.
    pub fn format_spread(&self, result: &SpreadResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(result),
            OutputFormat::Quiet => Ok(result.resulting_subject_id.to_string()),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                if let Some(variant) = &result.variant {
                    lines.push(self.info(&format!("Mutated into {}: {}", variant.id, variant.content)));
                }
                let message = match result.previous_believability {
                    None => format!("Now believes {} at {:.3}", result.resulting_subject_id, result.new_believability),
                    Some(prev) if prev == result.new_believability => format!(
                        "Already believed {} at {:.3}; unchanged",
                        result.resulting_subject_id, prev
                    ),
                    Some(prev) => format!(
                        "Belief in {} reinforced {:.3} -> {:.3}",
                        result.resulting_subject_id, prev, result.new_believability
                    ),
                };
                lines.push(self.success(&message));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format one believability entry.
    pub fn format_entry(&self, entry: &BelievabilityEntry) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(entry),
            OutputFormat::Quiet => Ok(format!("{:.3}", entry.believability)),
            OutputFormat::Table => Ok(self.success(&format!(
                "{} now believes {} at {:.3}",
                entry.entity_id, entry.subject_id, entry.believability
            ))),
        }
    }

    /// Format a decay report.
    pub fn format_decay(&self, report: &DecayReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(report),
            OutputFormat::Quiet => Ok(format!("{} {}", report.entries_updated, report.entries_forgotten)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Severity", "Decayed", "Forgotten"]);
                let severities: BTreeSet<_> = report
                    .updated_by_severity
                    .keys()
                    .chain(report.forgotten_by_severity.keys())
                    .collect();
                for severity in severities {
                    builder.push_record([
                        severity.to_string(),
                        report.updated_by_severity.get(severity).copied().unwrap_or(0).to_string(),
                        report.forgotten_by_severity.get(severity).copied().unwrap_or(0).to_string(),
                    ]);
                }
                Ok(format!(
                    "{}\n{}",
                    Self::table(builder),
                    self.success(&format!(
                        "Decayed {} and forgot {} belief(s) across {} of {} rumor(s)",
                        report.entries_updated,
                        report.entries_forgotten,
                        report.rumors_changed,
                        report.rumors_scanned
                    ))
                ))
            }
        }
    }

    /// Format the rumors an entity knows.
    pub fn format_known(&self, known: &[KnownRumor]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(known),
            OutputFormat::Quiet => Ok(join_ids(known.iter().map(|k| k.subject_id))),
            OutputFormat::Table => {
                if known.is_empty() {
                    return Ok(self.colorize("No rumors known.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Rumor", "Version", "Content", "Believability", "Heard From", "Severity"]);
                for k in known {
                    let version = if k.subject_id == k.rumor_id {
                        "original".to_string()
                    } else {
                        k.subject_id.to_string()
                    };
                    builder.push_record([
                        k.rumor_id.to_string(),
                        version,
                        truncate(&k.content),
                        format!("{:.3}", k.believability),
                        k.heard_from_entity_id
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "-".to_string()),
                        k.severity.to_string(),
                    ]);
                }
                Ok(Self::table(builder))
            }
        }
    }

    /// Format a lineage view.
    pub fn format_lineage(&self, lineage: &LineageView) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(lineage),
            OutputFormat::Quiet => Ok(join_ids(lineage.ancestors.iter().copied())),
            OutputFormat::Table => {
                let mut lines = vec![self.colorize(&format!("Lineage of {}", lineage.subject_id), "cyan")];
                lines.push(format!("  Root: {}", lineage.root_id));
                if lineage.ancestors.is_empty() {
                    lines.push("  Ancestors: none (this is the root rumor)".to_string());
                } else {
                    lines.push("  Ancestors:".to_string());
                    for (depth, id) in lineage.ancestors.iter().enumerate() {
                        lines.push(format!("    {}. {}", depth + 1, id));
                    }
                }
                lines.push(format!("  Descendants: {}", lineage.descendants.len()));
                for id in &lineage.descendants {
                    lines.push(format!("    - {}", id));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format aggregate statistics.
    pub fn format_stats(&self, stats: &RumorStatistics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Self::json(stats),
            OutputFormat::Quiet => Ok(stats.total_rumors.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                builder.push_record(["Rumors".to_string(), stats.total_rumors.to_string()]);
                builder.push_record(["Variants".to_string(), stats.total_variants.to_string()]);
                builder.push_record(["Spread records".to_string(), stats.total_spread_records.to_string()]);
                builder.push_record(["Average truth".to_string(), format!("{:.3}", stats.average_truth_value)]);
                builder.push_record([
                    "Variants per rumor".to_string(),
                    format!("{:.2}", stats.average_variants_per_rumor),
                ]);
                builder.push_record([
                    "Spread records per rumor".to_string(),
                    format!("{:.2}", stats.average_spread_records_per_rumor),
                ]);
                for (severity, count) in &stats.by_severity {
                    builder.push_record([format!("Severity: {}", severity), count.to_string()]);
                }
                for (category, count) in &stats.by_category {
                    builder.push_record([format!("Category: {}", category), count.to_string()]);
                }
                Ok(Self::table(builder))
            }
        }
    }

    /// Format rumor creation result.
    pub fn rumor_created(&self, id: &RumorId) -> String {
        match self.format {
            OutputFormat::Quiet => id.to_string(),
            OutputFormat::Json => serde_json::json!({ "id": id }).to_string(),
            OutputFormat::Table => self.success(&format!("Rumor created: {}", id)),
        }
    }

    /// Format the result of a bulk creation.
    pub fn rumors_created(&self, ids: &[RumorId]) -> String {
        match self.format {
            OutputFormat::Quiet => join_ids(ids.iter().copied()),
            OutputFormat::Json => serde_json::json!({ "ids": ids }).to_string(),
            OutputFormat::Table => self.bulk_result("Imported", ids.len()),
        }
    }

    /// Format bulk operation result.
    pub fn bulk_result(&self, operation: &str, count: usize) -> String {
        self.success(&format!("{} {} rumor(s)", operation, count))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn join_ids(ids: impl Iterator<Item = SubjectId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join("\n")
}

fn categories(rumor: &Rumor) -> String {
    rumor
        .categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= CONTENT_WIDTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(CONTENT_WIDTH - 1).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumor_domain::{Category, EntityId, Severity};

    fn create_test_rumor() -> Rumor {
        Rumor::new(
            EntityId::new("npc_58").unwrap(),
            "The king is ill",
            [Category::Political],
            Severity::Major,
            0.3,
            1_000,
        )
        .unwrap()
    }

    fn page() -> RumorPage {
        RumorPage {
            rumors: vec![create_test_rumor()],
            total: 1,
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_rumors(&page()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["rumors"][0]["original_content"], "The king is ill");
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let page = page();
        let output = formatter.format_rumors(&page).unwrap();
        assert_eq!(output, page.rumors[0].id.to_string());
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_rumors(&page()).unwrap();
        assert!(output.contains("Severity"));
        assert!(output.contains("political"));
        assert!(output.contains("Showing 1 of 1 rumor(s)"));
    }

    #[test]
    fn test_empty_rumors() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_rumors(&RumorPage { rumors: vec![], total: 0 })
            .unwrap();
        assert!(output.contains("No rumors found"));
    }

    #[test]
    fn test_record_table_lists_beliefs() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let record = RumorRecord::new(create_test_rumor());
        let output = formatter.format_record(&record).unwrap();
        assert!(output.contains("The king is ill"));
        assert!(output.contains("npc_58"));
        assert!(output.contains("1.000"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "x".repeat(100);
        assert_eq!(truncate(&long).chars().count(), CONTENT_WIDTH);
    }
}
