//! snapforge-lib: Core types and logic for snapforge
//!
//! This crate drives named parts through the `pull -> build -> stage -> strip`
//! lifecycle and packs the result:
//! - `Project`: parts, metadata and the `after` dependency graph
//! - `lifecycle`: the step executor and the clean orchestrator
//! - `state`: per-part, per-step records that make runs incremental
//! - `pack`: the compressed filesystem image built from the stripped tree

pub mod cleanbuild;
pub mod collision;
pub mod consts;
pub mod env;
pub mod fileset;
pub mod graph;
pub mod init;
pub mod lifecycle;
pub mod meta;
pub mod pack;
pub mod part;
pub mod platform;
pub mod plugin;
pub mod project;
pub mod repo;
pub mod state;
pub mod step;
pub mod util;

