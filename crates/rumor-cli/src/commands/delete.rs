//! Delete command implementation.

use super::parse_id;
use crate::cli::DeleteArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rumor_domain::traits::RumorRepository;
use rumor_engine::{RumorError, RumorService};
use std::fs;
use std::io::{self, Write};

/// Execute the delete command.
///
/// Unknown ids are reported and skipped; the rest are still deleted.
pub fn execute_delete<R: RumorRepository>(
    args: DeleteArgs,
    service: &RumorService<R>,
    formatter: &Formatter,
) -> Result<String> {
    let mut ids = args.ids.clone();
    if let Some(file_path) = &args.file {
        ids.extend(read_ids_from_file(file_path)?);
    }
    if ids.is_empty() {
        return Err(CliError::InvalidInput("No rumor IDs provided".to_string()));
    }

    let rumor_ids = ids
        .iter()
        .map(|id| parse_id(id))
        .collect::<Result<Vec<_>>>()?;

    if !args.yes && !confirm(&rumor_ids)? {
        return Ok(formatter.info("Operation cancelled"));
    }

    let mut deleted = 0;
    let mut lines = Vec::new();
    for id in rumor_ids {
        match service.delete(id) {
            Ok(()) => deleted += 1,
            Err(RumorError::NotFound(_)) => {
                lines.push(formatter.warning(&format!("Rumor {} not found", id)));
            }
            Err(e) => return Err(e.into()),
        }
    }
    lines.push(formatter.bulk_result("Deleted", deleted));
    Ok(lines.join("\n"))
}

fn confirm(ids: &[rumor_domain::RumorId]) -> Result<bool> {
    println!("About to delete {} rumor(s) with all variants and beliefs:", ids.len());
    for id in ids {
        println!("  - {}", id);
    }
    print!("Continue? [y/N] ");
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

/// Read IDs from a file (one per line).
fn read_ids_from_file(path: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
