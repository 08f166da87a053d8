/// Backend-agnostic API error types.
pub mod error;
/// Game backend API and its HTTP implementation.
pub mod game_api;
