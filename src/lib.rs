pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
