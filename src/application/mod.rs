// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - It provides the boundary between the UI/CLI and the resolver services
// - It translates between DTOs and domain values
// - Invalid requests are rejected here, before the resolver is involved

pub mod commands;
pub mod dto;
pub mod error_handling;
pub mod state;

pub use commands::*;
pub use dto::*;
pub use error_handling::{ErrorResponse, ErrorType, ToErrorResponse};
pub use state::AppState;
