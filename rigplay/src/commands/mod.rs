//! Command implementations

pub mod info;
pub mod play;
pub mod rig;
pub mod tree;
pub mod validate;
