// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between UI and Services
// - Commands accept DTOs, return DTOs
// - Commands handle error conversion for the caller
// - Commands NEVER contain business logic

pub mod resolution_commands;

pub use resolution_commands::*;
