use serde_json::Value;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::database::resource::Resource;
use crate::database::value::{bind_query, bind_query_as, SqlValue};
use crate::filter::FilterData;

/// Column/value pairs for an insert or update
pub type Changes = Vec<(&'static str, SqlValue)>;

/// Generic table access for a [`Resource`].
///
/// Every method takes an executor so the same calls work on the pool or
/// inside a transaction (`&mut *tx`).
pub struct Repository<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Resource> Repository<T> {
    pub async fn insert<'c, E>(executor: E, changes: Changes) -> Result<T, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let mut columns = vec!["\"id\"".to_string()];
        let mut placeholders = vec!["$1".to_string()];
        let mut params = vec![SqlValue::Uuid(Uuid::new_v4())];

        for (name, value) in changes {
            Self::check_column(name)?;
            columns.push(format!("\"{}\"", name));
            placeholders.push(value.placeholder(params.len() + 1));
            params.push(value);
        }

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );
        let row = bind_query_as(sqlx::query_as::<_, T>(&sql), params).fetch_one(executor).await?;
        Ok(row)
    }

    /// Update a live row; fails with not-found when the row is missing or soft-deleted
    pub async fn update<'c, E>(executor: E, id: Uuid, changes: Changes) -> Result<T, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        if changes.is_empty() {
            return Err(DatabaseError::QueryError("update requires at least one column".to_string()));
        }

        let mut assignments = Vec::with_capacity(changes.len() + 1);
        let mut params = vec![SqlValue::Uuid(id)];
        for (name, value) in changes {
            Self::check_column(name)?;
            assignments.push(format!("\"{}\" = {}", name, value.placeholder(params.len() + 1)));
            params.push(value);
        }
        if T::has_column("updated_at") {
            assignments.push("\"updated_at\" = now()".to_string());
        }

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = $1{} RETURNING *",
            T::TABLE,
            assignments.join(", "),
            Self::live_guard()
        );
        bind_query_as(sqlx::query_as::<_, T>(&sql), params)
            .fetch_optional(executor)
            .await?
            .ok_or_else(T::not_found)
    }

    /// Live row by id
    pub async fn find<'c, E>(executor: E, id: Uuid) -> Result<Option<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql = format!("SELECT * FROM \"{}\" WHERE \"id\" = $1{}", T::TABLE, Self::live_guard());
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(executor).await?;
        Ok(row)
    }

    /// Row by id, soft-deleted or not
    pub async fn find_any<'c, E>(executor: E, id: Uuid) -> Result<Option<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql = format!("SELECT * FROM \"{}\" WHERE \"id\" = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(executor).await?;
        Ok(row)
    }

    /// Live row by id or a not-found error naming the resource
    pub async fn get<'c, E>(executor: E, id: Uuid) -> Result<T, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        Self::find(executor, id).await?.ok_or_else(T::not_found)
    }

    /// First live row matching a where-object
    pub async fn find_by<'c, E>(executor: E, where_clause: Value) -> Result<Option<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        QueryBuilder::<T>::new()?
            .filter(FilterData { where_clause: Some(where_clause), ..Default::default() })?
            .select_optional(executor)
            .await
    }

    pub async fn select<'c, E>(executor: E, filter_data: FilterData) -> Result<Vec<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        QueryBuilder::<T>::new()?.filter(filter_data)?.select_all(executor).await
    }

    pub async fn count<'c, E>(executor: E, filter_data: FilterData) -> Result<i64, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        QueryBuilder::<T>::new()?.filter(filter_data)?.count(executor).await
    }

    /// Flip the soft-delete flag; only rows currently in the opposite state match
    pub async fn set_deleted<'c, E>(executor: E, id: Uuid, deleted: bool) -> Result<T, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        if !T::soft_deletes() {
            return Err(DatabaseError::QueryError(format!("{} does not support soft delete", T::TABLE)));
        }
        let sql = format!(
            "UPDATE \"{}\" SET \"is_deleted\" = $2, \"updated_at\" = now() WHERE \"id\" = $1 AND \"is_deleted\" = NOT $2 RETURNING *",
            T::TABLE
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(deleted)
            .fetch_optional(executor)
            .await?
            .ok_or_else(T::not_found)
    }

    pub async fn hard_delete<'c, E>(executor: E, id: Uuid) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", T::TABLE);
        let result = bind_query(sqlx::query(&sql), vec![SqlValue::Uuid(id)]).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(T::not_found());
        }
        Ok(())
    }

    fn live_guard() -> &'static str {
        if T::soft_deletes() { " AND \"is_deleted\" = false" } else { "" }
    }

    fn check_column(name: &str) -> Result<(), DatabaseError> {
        if T::has_column(name) {
            Ok(())
        } else {
            Err(DatabaseError::QueryError(format!("unknown column '{}' on {}", name, T::TABLE)))
        }
    }
}
