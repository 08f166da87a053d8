/// HTTP request and response bodies.
pub mod api;
/// Terminal commands.
pub mod command;
/// Public-facing phase names.
pub mod phase;
/// Shared input validators.
pub mod validation;
/// Serializable session snapshot.
pub mod view;
/// Push channel messages.
pub mod ws;
