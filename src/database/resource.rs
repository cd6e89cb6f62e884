use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use super::manager::DatabaseError;
use super::value::ColumnDef;

/// A table-backed entity the generic repository, list and CRUD handlers can work with.
pub trait Resource: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static {
    /// Table name
    const TABLE: &'static str;
    /// Human readable name used in messages ("College", "Academic year")
    const NAME: &'static str;
    /// Every column a client may filter or sort on
    const COLUMNS: &'static [ColumnDef];
    /// Text columns matched by the `search` list parameter
    const SEARCH_COLUMNS: &'static [&'static str] = &[];
    /// Columns accepted by `sortBy`
    const SORTABLE: &'static [&'static str] = &["created_at"];
    /// Order applied when the client does not pick one
    const DEFAULT_ORDER: &'static str = "created_at desc";
    /// Query parameters that filter on a column, e.g. `("collegeId", "college_id")`
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[];

    fn has_column(name: &str) -> bool {
        Self::COLUMNS.iter().any(|c| c.name == name)
    }

    fn soft_deletes() -> bool {
        Self::has_column("is_deleted")
    }

    fn not_found() -> DatabaseError {
        DatabaseError::NotFound(format!("{} not found.", Self::NAME))
    }
}

/// Shared column definitions
pub mod columns {
    use crate::database::value::{col, ColumnDef, ColumnKind};

    pub const ID: ColumnDef = col("id", ColumnKind::Uuid);
    pub const IS_DELETED: ColumnDef = col("is_deleted", ColumnKind::Bool);
    pub const CREATED_AT: ColumnDef = col("created_at", ColumnKind::Timestamp);
    pub const UPDATED_AT: ColumnDef = col("updated_at", ColumnKind::Timestamp);
}
