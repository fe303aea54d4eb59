//! Tree diffing - decides what has to move

mod compare;
mod engine;

pub use compare::needs_update;
pub use engine::{DiffAction, DiffResult, Differ};
