//! Dojo Session - orchestration and persistence
//!
//! Drives the decision logic of `dojo-core` for one learner:
//! - [`Session`] runs one evaluation cycle per submission and owns progress
//! - [`ProgressStore`] abstracts where progress is kept
//! - [`SessionHandle`] shares a session between async callers and paces
//!   verdicts with a cancellable delay
//!
//! # Example
//!
//! ```rust
//! use dojo_core::{Catalog, EngineConfig, Outcome};
//! use dojo_session::{MemoryStore, Session};
//!
//! let catalog = Catalog::builtin().unwrap();
//! let mut session = Session::open(catalog, MemoryStore::new(), EngineConfig::default());
//!
//! let reference = session.current_mission().unwrap().reference_snippet.clone();
//! let snapshot = session.submit(&reference).unwrap();
//! assert_eq!(snapshot.result.outcome, Outcome::Accepted);
//! assert_eq!(snapshot.score_delta, 100);
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod handle;
pub mod session;
pub mod store;

pub use error::{SessionError, StoreError};
pub use handle::SessionHandle;
pub use session::{
    Disclosure, EvaluationSnapshot, EvaluationTicket, NextStep, Session, SessionSnapshot,
};
pub use store::{JsonFileStore, MemoryStore, ProgressStore};
