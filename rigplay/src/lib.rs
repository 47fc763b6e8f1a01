//! rigplay library
//!
//! Command implementations and scene snapshot loading behind the `rigplay`
//! binary.

pub mod cli;
pub mod commands;
pub mod scene_doc;
pub mod utils;
