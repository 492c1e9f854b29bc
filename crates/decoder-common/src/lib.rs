//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the DECODER tools."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Core shared primitives for the DECODER field tools.
//! This crate exposes configuration loading, tracing setup, console styling
//! and operator prompt utilities consumed by the generator and the harness.

pub mod config;
pub mod console;
pub mod logging;
pub mod prompt;

pub use config::{
    ApiConfig, BuildingSpec, GeneratorConfig, HarnessConfig, LoadedToolConfig, LoggingConfig,
    ToolConfig,
};
pub use console::{colors_enabled, CapturedOutput, ColorMode, Console, Palette};
pub use logging::{init_tracing, LogFormat};
pub use prompt::{AutoPrompter, PromptError, Prompter, ScriptedPrompter, StdinPrompter};
