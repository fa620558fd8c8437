//! Foundation types for shipmap.
//!
//! Every other shipmap crate depends on `shipmap-types`.
//!
//! # Key Types
//!
//! - [`DebugId`]: Content-derived identifier correlating a chunk with its source map
//! - [`Chunk`]: One compiled output file read from disk
//! - [`PreparedPair`]: A chunk copy plus its optional source map, staged for upload

pub mod artifact;
pub mod debug_id;
pub mod error;

pub use artifact::{is_chunk_path, Chunk, PreparedPair, CHUNK_EXTENSIONS};
pub use debug_id::DebugId;
pub use error::TypeError;
