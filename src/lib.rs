//! Setsync: Content-Addressed Directory Synchronization
//!
//! Publishes large directory trees to a remote object store as named,
//! immutable filesets of content-addressed blobs, and restores them with
//! minimal transfer by reusing local and cached content.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod logging;
pub mod remote;
pub mod store;
pub mod transfer;
pub mod tree;
pub mod types;
pub mod workspace;
