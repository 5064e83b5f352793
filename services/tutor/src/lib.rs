//! Preschool Tutor Library Crate
//!
//! Everything behind the `tutor` binary: configuration, the SQLite learning
//! records, the shared application state, voice I/O and the interactive
//! console menu. The binary is a thin wrapper around this library.

pub mod config;
pub mod console;
pub mod db;
pub mod models;
pub mod state;
pub mod voice;
