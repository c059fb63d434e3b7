pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod server;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
