pub mod alphabet;
pub mod classify;
pub mod codon;
pub mod common;
pub mod fastaline;
pub mod fuzzy;
pub mod io;
pub mod validate;
