//! Shared utilities for the rigplay CLI

pub mod format;
pub mod progress;
pub mod table;
pub mod tree;

pub use format::*;
pub use progress::*;
pub use table::*;
pub use tree::*;
