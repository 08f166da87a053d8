mod client;
mod config;
mod error;

pub use client::HttpGameApi;
pub use config::HttpApiConfig;
pub use error::{HttpApiError, HttpResult};
