//! Warden CLI - replay scripted calls against an authority
//!
//! Builds an authority over an in-memory network and a manual clock, runs a
//! JSON script of calls against it and reports every emitted event.

pub mod commands;
pub mod script;

pub use commands::{run, Cli, Commands, ConfigCommands};
pub use script::{Replay, Script, ScriptError, Step, StepRecord};
