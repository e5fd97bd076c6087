//! List and known-by command implementations.

use super::parse_entity;
use crate::cli::{KnownArgs, ListArgs};
use crate::error::Result;
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::{categories_from_names, KnownByQuery, Page, RumorFilter, RumorService};

/// Execute the list command.
pub fn execute_list<R: RumorRepository>(
    args: ListArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let filter = RumorFilter {
        categories: categories_from_names(&args.categories),
        min_truth: args.min_truth,
        max_truth: args.max_truth,
        severity: args.severity.map(Into::into),
        min_severity: args.min_severity.map(Into::into),
        search_text: args.search,
        known_by: args.known_by.as_deref().map(parse_entity).transpose()?,
    };
    let page = Page {
        limit: args.limit,
        offset: args.offset,
    };

    let rumors = service.list(&filter, page)?;
    formatter.format_rumors(&rumors)
}

/// Execute the known command.
pub fn execute_known<R: RumorRepository>(
    args: KnownArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let entity = parse_entity(&args.entity)?;
    let query = KnownByQuery {
        categories: categories_from_names(&args.categories),
        min_believability: args.min_believability,
        limit: args.limit,
    };

    let known = service.rumors_known_by(&entity, &query)?;
    formatter.format_known(&known)
}
