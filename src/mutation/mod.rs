//! Mutation module
//!
//! One-shot writes with `mutate` / `reset`. Each call gets a generation;
//! a result whose generation was superseded by a later `mutate` or by a
//! `reset` is discarded.

mod machine;

pub use machine::{Mutation, MutationState, MutationStatus};
