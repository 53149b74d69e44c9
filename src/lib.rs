//! Cross-context state synchronization for the Nexus workspace.
//!
//! Every running context (a tab, a process) keeps its own copy of five
//! collections and exchanges full replacements over a broadcast channel.
//! Conflicts resolve last-write-wins on the publish timestamp; typing
//! indicators are ephemeral and expire on their own.

pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sync;
pub mod utils;
pub mod ws;
