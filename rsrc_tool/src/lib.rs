//! `rsrc_tool`
//!
//! Tooling over the resource crates:
//! - Pack the built-in cube mesh
//! - Inspect encoded meshes, fonts and images
//! - Load named resources through a cache rooted at an asset directory

pub mod commands;

pub use commands::{inspect, load_all, pack_cube, Summary};
