//! cslrun configuration library
//!
//! Resolves the layered `.cslrun.yaml` / `cslrun.yaml` configuration used by the
//! cslrun citation-style test runner. [`config::resolve_config`] is the entry point.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod paths;
