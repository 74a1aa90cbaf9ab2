// handlers/mod.rs - HTTP handlers
//
// component/  /api/v1/component routes
// health.rs   /health

pub mod component;
pub mod health;

pub use component::*;
pub use health::health;
