use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereOptions};
use crate::database::value::{ColumnDef, ColumnKind, SqlValue};

const MAX_DEPTH: usize = 8;

/// Compiles a JSON where-object into a parameterised SQL predicate.
///
/// Parameters are numbered from `starting_param_index + 1` and every nested
/// `$and` / `$or` / `$not` shares the same parameter list.
pub struct FilterWhere<'a> {
    columns: &'a [ColumnDef],
    param_values: Vec<SqlValue>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(columns: &'a [ColumnDef], starting_param_index: usize) -> Self {
        Self {
            columns,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(
        columns: &'a [ColumnDef],
        where_data: Option<&Value>,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut filter_where = Self::new(columns, starting_param_index);
        filter_where.build(where_data, options)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: Option<&Value>, options: &FilterWhereOptions) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut sql_conditions = vec![];
        if options.soft_delete && !options.include_deleted {
            sql_conditions.push("\"is_deleted\" = false".to_string());
        }

        match where_data {
            None | Some(Value::Null) => {}
            Some(Value::Object(obj)) => sql_conditions.extend(self.parse_object(obj, 0)?),
            Some(_) => return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_object(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<Vec<String>, FilterError> {
        if depth > MAX_DEPTH {
            return Err(FilterError::TooDeep(MAX_DEPTH));
        }
        let mut conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                conditions.push(self.parse_logical_operator(key, value, depth)?);
            } else {
                conditions.extend(self.parse_field_condition(key, value)?);
            }
        }
        Ok(conditions)
    }

    fn parse_clause(&mut self, value: &Value, depth: usize) -> Result<String, FilterError> {
        let obj = value
            .as_object()
            .ok_or_else(|| FilterError::InvalidOperatorData("logical operands must be objects".to_string()))?;
        let parts = self.parse_object(obj, depth + 1)?;
        Ok(if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") })
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value, depth: usize) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // empty OR matches nothing, empty AND matches everything
                    return Ok(if op == "$or" { "1=0".to_string() } else { "1=1".to_string() });
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.parse_clause(v, depth)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.parse_clause(value, depth)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        let column = *self
            .columns
            .iter()
            .find(|c| c.name == field)
            .ok_or_else(|| FilterError::InvalidColumn(field.to_string()))?;

        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                let mut out = vec![];
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key).ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    out.push(self.build_sql_condition(&column, operator, op_val)?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            _ => Ok(vec![self.build_sql_condition(&column, FilterOp::Eq, value)?]),
        }
    }

    fn build_sql_condition(&mut self, column: &ColumnDef, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", column.name);
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", quoted_column)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", quoted_column)),
            FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let placeholder = self.param(column, data)?;
                Ok(format!("{} {} {}", quoted_column, operator.comparison_sql(), placeholder))
            }
            FilterOp::Like | FilterOp::NLike | FilterOp::ILike | FilterOp::NILike => {
                if !matches!(column.kind, ColumnKind::Text) {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "pattern operators only apply to text columns, '{}' is not text",
                        column.name
                    )));
                }
                let placeholder = self.param(column, data)?;
                Ok(format!("{} {} {}", quoted_column, operator.comparison_sql(), placeholder))
            }
            FilterOp::In | FilterOp::NIn => {
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return Ok(if operator == FilterOp::In { "1=0".to_string() } else { "1=1".to_string() });
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for v in &values {
                    placeholders.push(self.param(column, v)?);
                }
                Ok(format!("{} {} ({})", quoted_column, operator.comparison_sql(), placeholders.join(", ")))
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => {
                    let low = self.param(column, &values[0])?;
                    let high = self.param(column, &values[1])?;
                    Ok(format!("{} BETWEEN {} AND {}", quoted_column, low, high))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", quoted_column)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", quoted_column)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        }
    }

    fn param(&mut self, column: &ColumnDef, value: &Value) -> Result<String, FilterError> {
        if value.is_null() {
            return Err(FilterError::InvalidValue {
                column: column.name.to_string(),
                message: "null is only allowed with equality".to_string(),
            });
        }
        let sql_value = SqlValue::coerce(column.kind, value).map_err(|message| FilterError::InvalidValue {
            column: column.name.to_string(),
            message,
        })?;
        self.param_index += 1;
        let placeholder = sql_value.placeholder(self.param_index);
        self.param_values.push(sql_value);
        Ok(placeholder)
    }
}
