//! Read-only analytics over a [`GraphStore`](board_core::GraphStore).
//!
//! Everything here is a pure function of the store's public traversal
//! contract (`get_neighbors`, `traverse`, `node_ids`). Nothing is cached
//! between calls, so every function can be re-run after the store changes.
//!
//! - [`paths`]: roots, leaves, shortest paths, depth, level sets
//! - [`structure`]: cycle detection, connected components
//! - [`layout`]: level-based hierarchical layout

pub mod layout;
pub mod paths;
pub mod structure;

pub use layout::{hierarchical_layout, LayoutSpacing};
pub use paths::{
    depth, find_leaves, find_roots, levels, nodes_at_level, root_to_leaf_paths, shortest_path,
};
pub use structure::{connected_components, has_cycle};
