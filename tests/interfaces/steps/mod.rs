//! Cucumber step definitions for interface tests.

pub mod groups;
pub mod history;
