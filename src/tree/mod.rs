//! Content-addressed snapshot trees
//!
//! A snapshot is a tree of [`Entry`] nodes rooted at the workspace directory.
//! Directories own their children by name; regular files carry their size and
//! content digest; symlinks carry their target. Trees are built from the
//! filesystem by [`builder::TreeBuilder`], flattened into path-keyed
//! [`EntryMap`] views for diffing, and published as compressed [`FileSet`]s.

pub mod builder;
pub mod entry;
pub mod entry_map;
pub mod fileset;
pub mod hasher;
pub mod path;
pub mod walker;

pub use builder::{BuildResult, BuilderConfig, TreeBuilder};
pub use entry::Entry;
pub use entry_map::{DigestMap, EntryMap};
pub use fileset::FileSet;
