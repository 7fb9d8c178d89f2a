//! Data-model primitives for the graphforge query engine: the [`Value`]
//! literal/reference sum type, [`Quad`] statements, [`Direction`] slots and
//! the opaque [`NodeHash`]/[`QuadHash`] handles the storage layer and
//! iterator algebra operate on.
//!
//! Split out from `graphforge-core` the way the teacher splits `oxrdf` out
//! of `oxigraph`: this crate has no storage or query-execution concerns,
//! only the shared vocabulary both the store and the engine speak.

mod direction;
mod hash;
mod quad;
mod small_str;
mod value;

pub use direction::{Direction, InvalidDirectionError};
pub use hash::{NodeHash, QuadHash, HASH_WIDTH};
pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;
pub use quad::Quad;
pub use small_str::CompactStr;
pub use value::{Instant, Value};
