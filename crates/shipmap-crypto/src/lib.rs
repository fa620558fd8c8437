//! Deterministic debug-ID generation for shipmap.
//!
//! A debug ID is derived from the SHA-256 digest of a chunk's content and
//! folded into the canonical 8-4-4-4-12 shape. The same content always
//! yields the same identifier.

pub mod hasher;

pub use hasher::DebugIdHasher;
