//! Library crate for jeopardy-client, exposing the session logic to the binary and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
