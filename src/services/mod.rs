/// Push channel supervisor with reconnect and backoff.
pub mod connection;
/// User actions against the backend.
pub mod dispatcher;
/// Periodic roster refresh gated on the game phase.
pub mod roster_poller;
/// Session event loop tying the channels, countdowns and actions together.
pub mod session_runner;
