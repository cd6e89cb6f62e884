use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::database::value::ColumnDef;

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value, columns: &[ColumnDef]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["created_at desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)),
                        _ => return Err(FilterError::InvalidOperatorData("order entries must be strings".to_string())),
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "name": "asc" }
                obj.iter()
                    .map(|(k, v)| FilterOrderInfo {
                        column: k.clone(),
                        sort: SortDirection::parse(v.as_str().unwrap_or("asc")),
                    })
                    .collect()
            }
            _ => return Err(FilterError::InvalidOperatorData("order must be a string, array or object".to_string())),
        };

        for info in &infos {
            if !columns.iter().any(|c| c.name == info.column) {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        // split on commas, then each token into column and direction
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                let sort = SortDirection::parse(it.next().unwrap_or("asc"));
                Some(FilterOrderInfo { column: column.to_string(), sort })
            })
            .collect()
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::{col, ColumnKind};
    use serde_json::json;

    const COLUMNS: &[ColumnDef] = &[col("name", ColumnKind::Text), col("created_at", ColumnKind::Timestamp)];

    #[test]
    fn parses_all_order_shapes() {
        let from_string = FilterOrder::validate_and_parse(&json!("created_at desc, name"), COLUMNS).unwrap();
        assert_eq!(FilterOrder::generate(&from_string), "ORDER BY \"created_at\" DESC, \"name\" ASC");

        let from_array = FilterOrder::validate_and_parse(&json!(["name DESC"]), COLUMNS).unwrap();
        assert_eq!(FilterOrder::generate(&from_array), "ORDER BY \"name\" DESC");

        let from_object = FilterOrder::validate_and_parse(&json!({ "name": "asc" }), COLUMNS).unwrap();
        assert_eq!(FilterOrder::generate(&from_object), "ORDER BY \"name\" ASC");
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = FilterOrder::validate_and_parse(&json!("name; DROP TABLE users"), COLUMNS).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }
}
