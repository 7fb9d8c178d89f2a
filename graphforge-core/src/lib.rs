//! `graphforge-core`: the quad-store trait (§4.1), the pull-based iterator
//! algebra (§4.2), the path builder and morphism compiler (§4.3), the
//! optimizer (§4.4) and the execution driver (§2 row J) that make up the
//! core of a graph query engine.
//!
//! Split out of `graphforge-model` the way the teacher splits its query
//! evaluator out of `oxrdf`: this crate owns storage and execution, the
//! model crate owns only the shared value/quad vocabulary.

pub mod config;
pub mod driver;
pub mod error;
pub mod iterator;
pub mod optimizer;
pub mod path;
pub mod store;
pub mod tagger;

pub use config::{CancellationToken, ExecutionOptions, StoreOptions};
pub use driver::{PathResult, QueryDriver};
pub use error::{DeltaError, DeltaErrorKind, IteratorError, StoreError};
pub use iterator::{Handle, IteratorType, QueryIterator, Stats};
pub use path::Path;
pub use store::memory::MemoryStore;
pub use store::{Action, Delta, IgnoreOpts, PrimaryKey, QuadStore};
