use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};
use crate::database::value::ColumnDef;

pub struct Filter {
    table_name: &'static str,
    columns: &'static [ColumnDef],
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: &'static str, columns: &'static [ColumnDef]) -> Result<Self, FilterError> {
        Self::validate_table_name(table_name)?;
        let soft_delete = columns.iter().any(|c| c.name == "is_deleted");
        Ok(Self {
            table_name,
            columns,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions { soft_delete, include_deleted: false },
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        self.include_deleted(data.include_deleted);
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        Ok(self)
    }

    pub fn include_deleted(&mut self, include: bool) -> &mut Self {
        self.options.include_deleted = include;
        self
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec, self.columns)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit;
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(self.columns, self.where_data.as_ref(), 0, &self.options)?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (where_clause, params) =
            FilterWhere::generate(self.columns, self.where_data.as_ref(), starting_param_index, &self.options)?;
        Ok(SqlResult { query: where_clause, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let query = format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name))),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::{col, ColumnKind, SqlValue};
    use serde_json::json;

    const COLUMNS: &[ColumnDef] = &[
        col("id", ColumnKind::Uuid),
        col("name", ColumnKind::Text),
        col("abbreviation", ColumnKind::Text),
        col("is_deleted", ColumnKind::Bool),
        col("created_at", ColumnKind::Timestamp),
    ];

    #[test]
    fn builds_select_with_where_order_and_limit() {
        let mut filter = Filter::new("colleges", COLUMNS).unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "abbreviation": "LDRP" })),
                order: Some(json!("name asc")),
                limit: Some(10),
                offset: Some(20),
                include_deleted: false,
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"colleges\" WHERE \"is_deleted\" = false AND \"abbreviation\" = $1 ORDER BY \"name\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![SqlValue::Text("LDRP".to_string())]);
    }

    #[test]
    fn include_deleted_drops_the_soft_delete_guard() {
        let mut filter = Filter::new("colleges", COLUMNS).unwrap();
        filter.include_deleted(true);
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"colleges\" WHERE 1=1");
    }

    #[test]
    fn limit_is_capped_by_config() {
        let mut filter = Filter::new("colleges", COLUMNS).unwrap();
        filter.limit(i64::MAX, None).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.ends_with(&format!("LIMIT {}", crate::config::CONFIG.filter.max_limit)));
    }

    #[test]
    fn rejects_bad_table_names_and_negative_limits() {
        assert!(Filter::new("colleges; --", COLUMNS).is_err());
        let mut filter = Filter::new("colleges", COLUMNS).unwrap();
        assert!(filter.limit(-1, None).is_err());
    }
}
