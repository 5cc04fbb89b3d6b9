//! # Story Rules
//!
//! The "Story Bible" crate - characters and their psychological profiles, dramatic
//! structure, and the opaque state carried by every narrative branch.
//! This crate holds no branching logic; it is the vocabulary the branch core speaks.

pub mod entities;
pub mod error;
pub mod mechanics;
pub mod world_state;

pub use entities::*;
pub use error::*;
pub use mechanics::*;
pub use world_state::*;
