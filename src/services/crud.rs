use serde_json::{json, Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config;
use crate::database::{Database, Repository, Resource};
use crate::error::ApiError;
use crate::filter::{FilterData, SortDirection};
use crate::middleware::Page;
use crate::models::{Changeset, Creatable, Editable};

/// Query-string options shared by every list and count endpoint.
///
/// `page`, `limit`, `search`, `sortBy`, `sortOrder` and `includeDeleted` are
/// common; every other key must be one of the resource's parent filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub sort: Option<(String, SortDirection)>,
    pub include_deleted: bool,
    pub filters: Vec<(&'static str, Value)>,
    /// Extra where-objects the server adds, e.g. restricting to the caller's rows
    pub scope: Vec<Value>,
}

/// Keeps `(page - 1) * limit` well inside i64 for any configured limit
pub const MAX_PAGE: i64 = 1_000_000;

const COMMON_KEYS: &[&str] = &["page", "limit", "search", "q", "sortBy", "sortOrder", "includeDeleted"];

impl ListParams {
    pub fn parse<T: Resource>(query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let page = parse_positive(query, "page")?.unwrap_or(1);
        let limit = parse_positive(query, "limit")?
            .unwrap_or(config::config().filter.default_limit)
            .min(config::config().filter.max_limit);
        if page > MAX_PAGE {
            return Err(ApiError::validation_error(
                format!("page must be at most {}.", MAX_PAGE),
                Some(HashMap::from([("page".to_string(), format!("Must be between 1 and {}.", MAX_PAGE))])),
            ));
        }

        let search = query
            .get("search")
            .or_else(|| query.get("q"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let sort = match query.get("sortBy") {
            Some(sort_by) => {
                let column = to_snake_case(sort_by);
                if !T::SORTABLE.contains(&column.as_str()) {
                    return Err(ApiError::bad_request(format!(
                        "Cannot sort by '{}'. Allowed: {}.",
                        sort_by,
                        T::SORTABLE.join(", ")
                    )));
                }
                let direction = match query.get("sortOrder").map(|o| o.trim().to_ascii_lowercase()) {
                    None => SortDirection::Asc,
                    Some(order) if order == "asc" || order == "desc" => SortDirection::parse(&order),
                    Some(_) => return Err(ApiError::bad_request("sortOrder must be 'asc' or 'desc'.")),
                };
                Some((column, direction))
            }
            None => None,
        };

        let include_deleted = parse_bool(query, "includeDeleted")?.unwrap_or(false);

        let mut filters = Vec::new();
        for (key, raw) in query {
            if COMMON_KEYS.contains(&key.as_str()) {
                continue;
            }
            let column = T::PARENT_FILTERS
                .iter()
                .find(|(param, _)| param == key)
                .map(|(_, column)| *column)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown query parameter '{}'.", key)))?;
            filters.push((column, Value::String(raw.clone())));
        }
        filters.sort_by(|a, b| a.0.cmp(b.0));

        Ok(Self { page, limit, search, sort, include_deleted, filters, scope: Vec::new() })
    }

    /// Only `page` and `limit`; for endpoints that parse their own filters
    pub fn paging<T: Resource>(query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let paging: HashMap<String, String> = query
            .iter()
            .filter(|(key, _)| key.as_str() == "page" || key.as_str() == "limit")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self::parse::<T>(&paging)
    }

    pub fn with_scope(mut self, clause: Value) -> Self {
        self.scope.push(clause);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Where-object combining parent filters and the search term
    pub fn where_clause<T: Resource>(&self) -> Option<Value> {
        let mut clauses: Vec<Value> = self
            .filters
            .iter()
            .map(|(column, value)| {
                let mut m = Map::new();
                m.insert(column.to_string(), value.clone());
                Value::Object(m)
            })
            .collect();
        clauses.extend(self.scope.iter().cloned());

        if let Some(term) = &self.search {
            if !T::SEARCH_COLUMNS.is_empty() {
                let pattern = format!("%{}%", escape_like(term));
                let any: Vec<Value> = T::SEARCH_COLUMNS
                    .iter()
                    .map(|column| json!({ *column: { "$ilike": pattern } }))
                    .collect();
                clauses.push(json!({ "$or": any }));
            }
        }

        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(json!({ "$and": clauses })),
        }
    }

    pub fn filter_data<T: Resource>(&self) -> FilterData {
        let order = match &self.sort {
            Some((column, direction)) => format!("{} {}", column, direction.to_sql().to_lowercase()),
            None => T::DEFAULT_ORDER.to_string(),
        };
        FilterData {
            where_clause: self.where_clause::<T>(),
            order: Some(Value::String(order)),
            limit: Some(self.limit),
            offset: Some(self.offset()),
            include_deleted: self.include_deleted,
        }
    }

    pub fn count_data<T: Resource>(&self) -> FilterData {
        FilterData {
            where_clause: self.where_clause::<T>(),
            include_deleted: self.include_deleted,
            ..Default::default()
        }
    }
}

fn parse_positive(query: &HashMap<String, String>, key: &str) -> Result<Option<i64>, ApiError> {
    match query.get(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ApiError::bad_request(format!("{} must be a positive integer.", key))),
        },
    }
}

pub fn parse_bool(query: &HashMap<String, String>, key: &str) -> Result<Option<bool>, ApiError> {
    match query.get(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v == "true" => Ok(Some(true)),
        Some(v) if v == "false" => Ok(Some(false)),
        Some(_) => Err(ApiError::bad_request(format!("{} must be 'true' or 'false'.", key))),
    }
}

pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Generic create/read/update/delete over a [`Resource`]
pub struct CrudService<'a> {
    db: &'a Database,
}

impl<'a> CrudService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn list<T: Resource>(&self, params: &ListParams) -> Result<Page<T>, ApiError> {
        let items = Repository::<T>::select(self.db.pool(), params.filter_data::<T>()).await?;
        let total = Repository::<T>::count(self.db.pool(), params.count_data::<T>()).await?;
        Ok(Page::new(items, params.page, params.limit, total))
    }

    pub async fn count<T: Resource>(&self, params: &ListParams) -> Result<i64, ApiError> {
        Ok(Repository::<T>::count(self.db.pool(), params.count_data::<T>()).await?)
    }

    pub async fn create<T: Creatable>(&self, input: &T::Create) -> Result<T, ApiError> {
        let record = Repository::<T>::insert(self.db.pool(), input.changes()).await?;
        tracing::info!(resource = T::TABLE, "Created {}", T::NAME.to_lowercase());
        Ok(record)
    }

    pub async fn get<T: Resource>(&self, id: Uuid) -> Result<T, ApiError> {
        Ok(Repository::<T>::get(self.db.pool(), id).await?)
    }

    pub async fn update<T: Editable>(&self, id: Uuid, input: &T::Update) -> Result<T, ApiError> {
        let changes = input.changes();
        if changes.is_empty() {
            return Err(ApiError::bad_request("At least one field must be provided for update."));
        }
        Ok(Repository::<T>::update(self.db.pool(), id, changes).await?)
    }

    pub async fn soft_delete<T: Resource>(&self, id: Uuid) -> Result<T, ApiError> {
        let record = Repository::<T>::set_deleted(self.db.pool(), id, true).await?;
        tracing::info!(resource = T::TABLE, %id, "Soft-deleted {}", T::NAME.to_lowercase());
        Ok(record)
    }

    pub async fn restore<T: Resource>(&self, id: Uuid) -> Result<T, ApiError> {
        if Repository::<T>::find_any(self.db.pool(), id).await?.is_none() {
            return Err(T::not_found().into());
        }
        if Repository::<T>::find(self.db.pool(), id).await?.is_some() {
            return Err(ApiError::bad_request(format!("{} is not deleted.", T::NAME)));
        }
        let record = Repository::<T>::set_deleted(self.db.pool(), id, false).await?;
        tracing::info!(resource = T::TABLE, %id, "Restored {}", T::NAME.to_lowercase());
        Ok(record)
    }

    pub async fn hard_delete<T: Resource>(&self, id: Uuid) -> Result<(), ApiError> {
        Repository::<T>::hard_delete(self.db.pool(), id).await?;
        tracing::warn!(resource = T::TABLE, %id, "Permanently deleted {}", T::NAME.to_lowercase());
        Ok(())
    }

    /// Fails with 400 naming the parent when `id` is not a live row of `T`
    pub async fn require_parent<T: Resource>(&self, id: Uuid) -> Result<T, ApiError> {
        Repository::<T>::find(self.db.pool(), id)
            .await?
            .ok_or_else(|| ApiError::bad_request(format!("{} does not exist.", T::NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcademicYear, College, Semester};

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply() {
        let params = ListParams::parse::<College>(&HashMap::new()).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, config::config().filter.default_limit);
        assert_eq!(params.offset(), 0);
        let data = params.filter_data::<College>();
        assert_eq!(data.order, Some(json!("name asc")));
        assert!(data.where_clause.is_none());
    }

    #[test]
    fn huge_pages_are_rejected() {
        let err = ListParams::parse::<College>(&query(&[("page", &i64::MAX.to_string())])).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let last = ListParams::parse::<College>(&query(&[("page", &MAX_PAGE.to_string()), ("limit", "1000")])).unwrap();
        assert!(last.offset() > 0);
    }

    #[test]
    fn search_spans_search_columns() {
        let params = ListParams::parse::<College>(&query(&[("search", "ldrp"), ("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(params.offset(), 20);
        let clause = params.where_clause::<College>().unwrap();
        assert_eq!(clause["$or"].as_array().unwrap().len(), 3);
        assert_eq!(clause["$or"][0]["name"]["$ilike"], "%ldrp%");
    }

    #[test]
    fn parent_filters_map_to_columns() {
        let college_id = Uuid::new_v4().to_string();
        let params =
            ListParams::parse::<AcademicYear>(&query(&[("collegeId", &college_id), ("isActive", "true")])).unwrap();
        let clause = params.where_clause::<AcademicYear>().unwrap();
        assert_eq!(clause["$and"][0]["college_id"], college_id.as_str());
        assert_eq!(clause["$and"][1]["is_active"], "true");
    }

    #[test]
    fn rejects_unknown_parameters_and_sorts() {
        assert!(ListParams::parse::<College>(&query(&[("collegeId", "x")])).is_err());
        assert!(ListParams::parse::<College>(&query(&[("sortBy", "website")])).is_err());
        assert!(ListParams::parse::<College>(&query(&[("page", "0")])).is_err());
        assert!(ListParams::parse::<College>(&query(&[("includeDeleted", "maybe")])).is_err());
    }

    #[test]
    fn sort_by_accepts_camel_case() {
        let params =
            ListParams::parse::<Semester>(&query(&[("sortBy", "semesterNumber"), ("sortOrder", "desc")])).unwrap();
        assert_eq!(params.filter_data::<Semester>().order, Some(json!("semester_number desc")));
    }

    #[test]
    fn scope_is_combined_with_filters() {
        let params = ListParams::parse::<College>(&HashMap::new())
            .unwrap()
            .with_scope(json!({ "id": { "$in": [] } }));
        assert_eq!(params.where_clause::<College>(), Some(json!({ "id": { "$in": [] } })));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
