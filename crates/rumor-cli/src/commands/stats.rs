//! Stats command implementation.

use crate::error::Result;
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::RumorService;

/// Execute the stats command.
pub fn execute_stats<R: RumorRepository>(
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let stats = service.statistics()?;
    formatter.format_stats(&stats)
}
