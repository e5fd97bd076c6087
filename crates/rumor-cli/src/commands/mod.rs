//! Command implementations.
//!
//! Each command returns the text to print so that it can be tested without
//! capturing stdout.

pub mod create;
pub mod decay;
pub mod delete;
pub mod import;
pub mod lineage;
pub mod list;
pub mod show;
pub mod spread;
pub mod stats;

pub use self::create::execute_create;
pub use self::decay::{execute_decay, execute_worker};
pub use self::delete::execute_delete;
pub use self::import::execute_import;
pub use self::lineage::execute_lineage;
pub use self::list::{execute_known, execute_list};
pub use self::show::execute_show;
pub use self::spread::{execute_believe, execute_spread};
pub use self::stats::execute_stats;

use crate::error::{CliError, Result};
use rumor_domain::{EntityId, SubjectId};

/// Parse a rumor or variant id argument.
pub(crate) fn parse_id(input: &str) -> Result<SubjectId> {
    SubjectId::parse(input.trim())
        .map_err(|e| CliError::InvalidInput(format!("Invalid ID '{}': {}", input, e)))
}

/// Parse an entity id argument.
pub(crate) fn parse_entity(input: &str) -> Result<EntityId> {
    EntityId::new(input.trim())
        .map_err(|e| CliError::InvalidInput(format!("Invalid entity '{}': {}", input, e)))
}
