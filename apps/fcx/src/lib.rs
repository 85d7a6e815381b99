//! # fcx
//!
//! Command-line front end for `framecodex-core`: argument parsing,
//! configuration layering and file I/O. All validation and rendering is
//! delegated to the core crate.

pub mod cli;
pub mod config;
