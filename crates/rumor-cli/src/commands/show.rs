//! Show command implementation.

use super::parse_id;
use crate::cli::ShowArgs;
use crate::error::Result;
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::RumorService;

/// Execute the show command.
pub fn execute_show<R: RumorRepository>(
    args: ShowArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let record = service.get(parse_id(&args.id)?)?;
    formatter.format_record(&record)
}
