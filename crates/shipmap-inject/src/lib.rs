//! Debug-ID snippet injection for shipmap.
//!
//! A chunk is marked for correlation by inserting a small runtime snippet
//! that carries the marker `shipmap-dbid-<debug id>`. The snippet goes after
//! any leading comments and the `"use strict"` directive, so directive
//! semantics are preserved. The insertion is reported as an
//! [`InjectionEdit`] that can be replayed onto the chunk's source map with
//! [`shift_mappings`] or [`adjust_source_map`].
//!
//! # Modules
//!
//! - [`marker`]: marker prefix, snippet text, and extraction
//! - [`snippet`]: insertion point detection and injection
//! - [`mappings`]: base64 VLQ decoding, shifting, and re-encoding
//! - [`sourcemap`]: JSON-level source map augmentation

pub mod error;
pub mod mappings;
pub mod marker;
pub mod snippet;
pub mod sourcemap;

pub use error::{InjectError, InjectResult};
pub use mappings::{shift_mappings, Segment};
pub use marker::{debug_id_snippet, extract_debug_id, MARKER_PREFIX};
pub use snippet::{inject_snippet, Injection, InjectionEdit};
pub use sourcemap::{adjust_source_map, set_debug_id, DEBUG_ID_KEYS};
