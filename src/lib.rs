//! Stow maps annotated Rust records onto SQL tables.
//!
//! ```rust
//! use stow::{MappingCache, Record};
//!
//! #[derive(Default, Record)]
//! struct Person {
//!     #[stow(column = "id,pk")]
//!     id: Option<uuid::Uuid>,
//!     #[stow(column = "name")]
//!     name: String,
//!     #[stow(column = "created_at,ro")]
//!     created_at: Option<time::PrimitiveDateTime>,
//! }
//!
//! let cache = MappingCache::new();
//! let mapping = cache.mapping::<Person>().unwrap();
//! assert_eq!(mapping.columns(), ["id", "name", "created_at"]);
//! ```
pub use stow_core::*;
pub use stow_macros::Record;
