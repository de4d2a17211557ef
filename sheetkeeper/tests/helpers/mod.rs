//! Test Helper Utilities
//!
//! Shared in-memory adapters for testing sheetkeeper

#![allow(dead_code)]

pub mod mocks;
pub mod token_server;

pub use mocks::{decode_snapshot, MemoryGateway, MemoryStore, Scripted, ScriptedSource};

use sheetkeeper::gateway::CellMatrix;

/// Build a cell matrix from string slices
pub fn rows(data: &[&[&str]]) -> CellMatrix {
    data.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}
