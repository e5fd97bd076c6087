//! Lineage command implementation.

use super::parse_id;
use crate::cli::LineageArgs;
use crate::error::Result;
use crate::output::{Formatter, LineageView};
use rumor_domain::traits::RumorRepository;
use rumor_engine::RumorService;

/// Execute the lineage command.
pub fn execute_lineage<R: RumorRepository>(
    args: LineageArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let subject_id = parse_id(&args.subject)?;
    let view = LineageView {
        subject_id,
        root_id: service.root_of(subject_id)?.id,
        ancestors: service.ancestors_of(subject_id)?,
        descendants: service.descendants_of(subject_id)?,
    };
    formatter.format_lineage(&view)
}
