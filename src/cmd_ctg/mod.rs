//! Subcommand modules for the `ctg` binary.

pub mod codon;
pub mod common;
pub mod find;
