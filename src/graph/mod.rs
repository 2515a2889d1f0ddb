//! Graph parsing: raw link records → canonical adjacency state.

pub mod parser;
