//! Import command implementation.

use super::parse_entity;
use crate::cli::ImportArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_domain::Severity;
use rumor_engine::{categories_from_names, CreateRumor, RumorService};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};

/// Execute the import command.
///
/// All definitions are validated before any rumor is created.
pub fn execute_import<R: RumorRepository>(
    args: ImportArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either --file or --stdin".to_string(),
        ));
    };

    let definitions: Vec<RumorDefinition> = serde_json::from_str(&json_data)?;
    if definitions.is_empty() {
        return Err(CliError::InvalidInput("No rumors provided".to_string()));
    }

    let inputs = definitions
        .into_iter()
        .map(RumorDefinition::into_create)
        .collect::<Result<Vec<_>>>()?;

    let mut ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        ids.push(service.create(input)?);
    }

    Ok(formatter.rumors_created(&ids))
}

/// Rumor definition for JSON input.
#[derive(Debug, Deserialize)]
struct RumorDefinition {
    originator: String,
    content: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default = "default_severity")]
    severity: String,
    #[serde(default = "default_truth")]
    truth_value: f64,
    #[serde(default)]
    initial_entities: Vec<String>,
}

impl RumorDefinition {
    fn into_create(self) -> Result<CreateRumor> {
        let severity = Severity::parse(&self.severity).ok_or_else(|| {
            CliError::InvalidInput(format!("Unknown severity '{}'", self.severity))
        })?;
        Ok(CreateRumor {
            originator_id: parse_entity(&self.originator)?,
            content: self.content,
            categories: categories_from_names(&self.categories),
            severity,
            truth_value: self.truth_value,
            initial_entities: self
                .initial_entities
                .iter()
                .map(|e| parse_entity(e))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

fn default_severity() -> String {
    "moderate".to_string()
}

fn default_truth() -> f64 {
    0.5
}
