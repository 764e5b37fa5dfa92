//! # Sunwheel Library
//!
//! Internal library for the sunwheel binary.
//!
//! This library exists to enable testing of the temporal engine internals and
//! to keep CLI dispatch (main.rs) separate from the engine itself.
//!
//! ## Architecture
//!
//! - **Ephemeris**: `solar` computes sunrise/sunset/solar-noon instants for an
//!   observer position from closed-form astronomical approximations
//! - **Cycle Tracking**: `cycle` polls a remote worldstate endpoint for the
//!   current phase of a two-phase game cycle and reconstructs the full
//!   boundary schedule around any date from a single anchor timestamp
//! - **Configuration**: `config` for TOML-based settings with validation
//! - **Infrastructure**: structured logging, time source abstraction,
//!   CLI argument parsing

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod config;
pub mod constants;
pub mod cycle;
pub mod solar;
pub mod time_source;
