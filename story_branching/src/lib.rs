//! # Story Branching
//!
//! Explores several candidate continuations of a story at once, scores them, and
//! commits to exactly one per decision point, within a fixed width and depth budget.
//!
//! ## Core Components
//!
//! - **branch**: branch records and the weighted scorer
//! - **generators**: decision-, theme- and structure-driven branch generators
//! - **filter**: the viability gate applied to new candidates
//! - **tree**: the branch tree - evolution, capacity pruning and collapse
//! - **trigger**: collapse trigger evaluation
//! - **constraint**: creative constraints applied to the active set
//! - **session**: a lock-guarded tree with parallel content synthesis
//!
//! ## Lifecycle
//!
//! 1. `BranchTree::create_root` from an initial context
//! 2. `evolve` one or more times from the committed tip or an active branch
//! 3. `evaluate_trigger` against the caller's context
//! 4. `collapse` when a trigger fires, committing one branch

pub mod branch;
pub mod collaborators;
pub mod config;
pub mod constraint;
pub mod error;
pub mod filter;
pub mod generators;
pub mod session;
pub mod tree;
pub mod trigger;

pub use branch::*;
pub use collaborators::*;
pub use config::*;
pub use constraint::*;
pub use error::*;
pub use filter::*;
pub use generators::*;
pub use session::*;
pub use tree::*;
pub use trigger::*;
