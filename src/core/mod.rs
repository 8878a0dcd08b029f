//! Core resolution logic (specs, cache keys, tiers, bin selection, launch).

pub mod bin;
pub mod cachekey;
pub mod config;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod request;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod fakes;
