//! Domain models for the medicine recommendation engine.

mod knowledge;
mod patient;
mod recommendation;

pub use knowledge::*;
pub use patient::*;
pub use recommendation::*;
