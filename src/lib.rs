//! npexec: run a package's executable without adding it to the project.
//!
//! Local tree first, then a shared cache keyed by a BLAKE3 digest of the
//! requested specs, then a scoped install. The chosen bin runs through a
//! shell with the cache's `node_modules/.bin` ahead of PATH.

pub mod backend;
pub mod cli;
pub mod core;
pub mod transport;
