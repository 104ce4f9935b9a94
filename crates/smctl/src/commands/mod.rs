//! Command implementations

pub mod operation;
pub mod profile;
pub mod provider;
