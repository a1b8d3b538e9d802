//! Application frameworks for Probetcl: an interactive REPL and a script
//! runner, for exercising probe scripts from a workstation.
//!
//! The host application creates a [`probetcl::Interp`], registers its probe
//! commands on it, and hands it to [`repl`] or [`script`]; see those
//! functions for details.

mod shell;

pub use shell::*;
