pub mod component_service;
pub mod reference_resolver;

pub use component_service::{ComponentService, DeleteOutcome, ListPage, ServiceError, ValidationError};
pub use reference_resolver::resolve_and_maybe_delete;
