//! Service layer: provider clients, identification, and the album pipeline.

pub mod aggregator;
pub mod cover;
pub mod fingerprint;
pub mod identifier;
pub mod lastfm;
pub mod provider;
pub mod reconcile;
pub mod tag_reader;
