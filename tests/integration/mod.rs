//! Integration tests for the setsync synchronization engine

mod build_properties;
mod cache_eviction;
mod fileset_management;
mod local_changes;
mod push_pull;
mod selective_pull;
mod test_utils;
