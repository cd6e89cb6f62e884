use sqlx::{PgExecutor, Row};

use crate::database::manager::DatabaseError;
use crate::database::resource::Resource;
use crate::database::value::{bind_query, bind_query_as};
use crate::filter::{Filter, FilterData};

/// Runs a [`Filter`] against a resource table and maps rows to `T`.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Resource> QueryBuilder<T> {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(T::TABLE, T::COLUMNS)?,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    pub async fn select_all<'c, E>(self, executor: E) -> Result<Vec<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql_result = self.filter.to_sql()?;
        let rows = bind_query_as(sqlx::query_as::<_, T>(&sql_result.query), sql_result.params)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn select_optional<'c, E>(mut self, executor: E) -> Result<Option<T>, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        self.filter.limit(1, None)?;
        let sql_result = self.filter.to_sql()?;
        let row = bind_query_as(sqlx::query_as::<_, T>(&sql_result.query), sql_result.params)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn count<'c, E>(self, executor: E) -> Result<i64, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql_result = self.filter.to_count_sql()?;
        let row = bind_query(sqlx::query(&sql_result.query), sql_result.params)
            .fetch_one(executor)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}
