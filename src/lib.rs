//! tagforge: music library metadata identification and reconciliation
//!
//! Walks a music library directory tree, treats each directory as an album,
//! identifies every audio file against Last.fm (optionally seeded by acoustic
//! fingerprint matches), reconciles provider metadata with the file's own
//! tags, and exports the final tag set per song.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod services;
pub mod types;

pub use error::{Error, Result};
