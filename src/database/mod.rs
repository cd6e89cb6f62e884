pub mod manager;
pub mod query_builder;
pub mod repository;
pub mod resource;
pub mod value;

pub use manager::{Database, DatabaseError};
pub use repository::{Changes, Repository};
pub use resource::Resource;
pub use value::{ColumnDef, ColumnKind, SqlValue};
