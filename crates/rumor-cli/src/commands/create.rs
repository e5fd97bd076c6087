//! Create command implementation.

use super::parse_entity;
use crate::cli::CreateArgs;
use crate::error::Result;
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::{categories_from_names, CreateRumor, RumorService};

/// Execute the create command.
pub fn execute_create<R: RumorRepository>(
    args: CreateArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let input = CreateRumor {
        originator_id: parse_entity(&args.originator)?,
        content: args.content,
        categories: categories_from_names(&args.categories),
        severity: args.severity.into(),
        truth_value: args.truth,
        initial_entities: args
            .initial
            .iter()
            .map(|e| parse_entity(e))
            .collect::<Result<Vec<_>>>()?,
    };

    let id = service.create(input)?;
    Ok(formatter.rumor_created(&id))
}
