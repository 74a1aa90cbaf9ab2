pub mod types;
pub mod schema;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use schema::{ColumnDef, EntitySchema, FilterRecord};
pub use filter::Filter;
pub use error::FilterError;
