//! Rumor Engine
//!
//! Spreads rumors between entities, mutates them on retelling, and decays
//! belief over time.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Creation**: Registering a rumor with its originator and initial listeners
//! - **Spreading**: Transferring belief from a teller to a listener, optionally
//!   creating a mutated variant on the way
//! - **Manual adjustment**: Overriding an entity's belief directly
//! - **Decay**: Linearly eroding belief with elapsed time, faster for trivial
//!   rumors, and forgetting entries that reach zero
//! - **Lineage queries**: Ancestors, descendants and roots of variants
//! - **Events**: Publishing a notification after every committed change
//!
//! # Architecture
//!
//! [`RumorService`] sits on top of any [`RumorRepository`]. Each rumor's
//! variants and beliefs form one record that is locked, loaded, modified and
//! written back with an optimistic version check. Operations on different
//! rumors proceed in parallel.
//!
//! ## Spread rules
//!
//! | Quantity | Rule |
//! |----------|------|
//! | Transfer | `clamp(source × 0.8 × (1 + 0.25 × rf), 0, 1)` |
//! | Re-exposure | Keep the existing value if at least as large, otherwise `min(transfer + 0.05, 1)` |
//! | First exposure | Store the transfer value |
//!
//! ## Decay rates
//!
//! | Severity | Multiplier | Loss per day (default) |
//! |----------|------------|------------------------|
//! | trivial | 1.5 | 0.15 |
//! | minor | 1.2 | 0.12 |
//! | moderate | 1.0 | 0.10 |
//! | major | 0.8 | 0.08 |
//! | critical | 0.6 | 0.06 |
//!
//! # Usage
//!
//! ## One-time decay pass
//!
//! ```
//! use rumor_engine::{EngineConfig, RumorService};
//! use rumor_store::InMemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RumorService::new(InMemoryStore::new(), EngineConfig::default())?;
//! let report = service.decay_now()?;
//! println!("{} entries decayed", report.entries_updated);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration presets
//!
//! ```
//! use rumor_engine::EngineConfig;
//!
//! // Default: 0.1 per day, hourly sweeps
//! let config = EngineConfig::default();
//!
//! // Aggressive: rumors fade twice as fast, sweeps every 15 minutes
//! let config = EngineConfig::aggressive();
//!
//! // Lenient: rumors linger, sweeps every 4 hours
//! let config = EngineConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [spread]
//! transfer_rate = 0.8
//! relationship_weight = 0.25
//! reinforcement_bonus = 0.05
//! initial_believability = 0.8
//!
//! [decay]
//! base_rate_per_day = 0.1
//! sweep_interval_minutes = 60
//!
//! [locking]
//! lock_timeout_ms = 500
//! max_retries = 3
//!
//! [mutation]
//! kind = "word_substitution"
//! callback_timeout_ms = 2000
//! ```

#![warn(missing_docs)]

pub mod clock;
mod config;
mod decay;
mod error;
pub mod events;
mod locks;
mod metrics;
mod service;
mod spread;
mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DecayConfig, EngineConfig, LockConfig, MAX_SWEEP_INTERVAL_MINUTES};
pub use decay::{DecayReport, DecayScheduler};
pub use error::RumorError;
pub use events::{BroadcastPublisher, NoopPublisher, RecordingPublisher, TracingPublisher};
pub use locks::RumorLocks;
pub use metrics::DecayMetrics;
pub use service::{
    categories_from_names, CreateRumor, KnownByQuery, KnownRumor, RumorService, RumorStatistics,
};
pub use spread::{SpreadEngine, SpreadParams, SpreadRequest, SpreadResult};
pub use worker::DecayWorker;

pub use rumor_domain::traits::{Page, RumorFilter, RumorPage, RumorRepository};
