//! Spread and believe command implementations.

use super::{parse_entity, parse_id};
use crate::cli::{BelieveArgs, SpreadArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_domain::Adjustment;
use rumor_engine::{RumorService, SpreadParams, SpreadRequest};

/// Execute the spread command.
pub fn execute_spread<R: RumorRepository>(
    args: SpreadArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let params = if args.mutate {
        SpreadParams::mutating(args.strength, args.relationship)
    } else {
        SpreadParams::faithful(args.relationship)
    };
    let request = SpreadRequest {
        subject_id: parse_id(&args.subject)?,
        from_entity_id: parse_entity(&args.from)?,
        to_entity_id: parse_entity(&args.to)?,
        params,
    };

    let result = service.spread(request)?;
    formatter.format_spread(&result)
}

/// Execute the believe command.
pub fn execute_believe<R: RumorRepository>(
    args: BelieveArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let adjustment = match (args.delta, args.set) {
        (Some(delta), None) => Adjustment::Delta(delta),
        (None, Some(value)) => Adjustment::Absolute(value),
        _ => {
            return Err(CliError::InvalidInput(
                "Specify exactly one of --delta or --set".to_string(),
            ))
        }
    };

    let entry = service.update_believability(
        parse_id(&args.subject)?,
        &parse_entity(&args.entity)?,
        adjustment,
    )?;
    formatter.format_entry(&entry)
}
