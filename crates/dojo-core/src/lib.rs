//! Dojo Core - mission verification and progression
//!
//! The decision logic of Review Dojo:
//! - Normalizes snippet text for comparison
//! - Evaluates edited snippets against a mission's acceptance rule
//! - Tracks completed missions and the furthest-reached watermark
//! - Derives score, accuracy and course rank
//!
//! # Example
//!
//! ```rust
//! use dojo_core::{evaluate, Mission, Outcome};
//!
//! let mission = Mission::new(
//!     1,
//!     "Remove destructive methods",
//!     "def f(d); d.sort!; d.reverse!; end",
//!     "def f(d); d.sort.reverse; end",
//! )
//! .with_keywords(["sort.reverse"])
//! .with_remove_keywords(["sort!", "reverse!"]);
//!
//! let result = evaluate("def f(d); d.sort; end", &mission);
//! assert_eq!(result.outcome, Outcome::MissingRequired);
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod mission;
pub mod normalize;
pub mod progression;
pub mod scoring;
pub mod view;

pub use catalog::Catalog;
pub use config::EngineConfig;
pub use error::{CatalogError, ConfigError, ProgressError};
pub use evaluator::{evaluate, Evaluator, Outcome, RuleReport, SubmissionResult};
pub use mission::{Mission, MissionId};
pub use normalize::{normalize_loose, normalize_strict, normalize_strict_with};
pub use progression::{allowed_transitions, validate_transition, MissionState, ProgressState};
pub use scoring::{Accuracy, Certificate, Rank, ScoreLedger};
pub use view::MissionViewState;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Dojo Core
    pub use crate::{
        Catalog, EngineConfig, Evaluator, Mission, MissionId, MissionState, MissionViewState,
        Outcome, ProgressState, ScoreLedger, SubmissionResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
