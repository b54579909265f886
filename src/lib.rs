//! Event Weaver — context-adaptive procedural event generation for RPGs.
//!
//! Turns a sparse bag of player attributes into a finished narrative event
//! (title, description, choices with stat effects) through a pipeline of
//! context analysis, difficulty scaling, Markov-trained text synthesis, and
//! a bounded coherence-retry loop.

pub mod core;
pub mod schema;
