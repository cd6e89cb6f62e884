use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Display;

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern compiles"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("phone pattern compiles"));
static URL_HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:[^@/]*@)?([^/:?#]+)").expect("url host pattern compiles"));
static ACADEMIC_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{4})$").expect("academic year pattern compiles"));

/// Collects per-field validation failures, keeping the first message for each field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.entry(field.to_string()).or_insert_with(|| message.into());
        }
        self
    }

    /// Trimmed length between `min` and `max` characters
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            return self.check(false, field, format!("{} is required.", field));
        }
        self.check(
            len >= min && len <= max,
            field,
            format!("{} must be between {} and {} characters.", field, min, max),
        )
    }

    pub fn opt_length(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> &mut Self {
        match value {
            Some(v) => self.length(field, v, min, max),
            None => self,
        }
    }

    pub fn range<T: PartialOrd + Display>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self {
        let ok = value >= min && value <= max;
        self.check(ok, field, format!("{} must be between {} and {}.", field, min, max))
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_email(value), field, "Please provide a valid email address.")
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(URL_RE.is_match(value.trim()), field, format!("{} must be a valid URL.", field))
    }

    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(PHONE_RE.is_match(value.trim()), field, "Please provide a valid contact number.")
    }

    pub fn academic_year(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            is_academic_year(value),
            field,
            "Academic year must look like 2025-2026, with consecutive years.",
        )
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed.", Some(std::mem::take(&mut self.errors))))
        }
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// `YYYY-YYYY` where the second year follows the first
pub fn is_academic_year(value: &str) -> bool {
    ACADEMIC_YEAR_RE
        .captures(value.trim())
        .and_then(|caps| {
            let first: i32 = caps[1].parse().ok()?;
            let second: i32 = caps[2].parse().ok()?;
            Some(second == first + 1)
        })
        .unwrap_or(false)
}

/// Lower-cased host of an http(s) URL
pub fn url_host(value: &str) -> Option<String> {
    URL_HOST_RE.captures(value.trim()).map(|caps| caps[1].to_ascii_lowercase())
}

/// Trim, and map blank strings to `None`
pub fn blank_to_none(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_first_error_per_field() {
        let mut v = Validator::new();
        v.length("name", "", 3, 100).length("name", "ab", 3, 100).range("semesterNumber", 13, 1, 12);
        let err = v.finish().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert_eq!(fields["name"], "name is required.");
                assert!(fields.contains_key("semesterNumber"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn academic_years_must_be_consecutive() {
        assert!(is_academic_year("2025-2026"));
        assert!(!is_academic_year("2025-2027"));
        assert!(!is_academic_year("25-26"));
    }

    #[test]
    fn formats() {
        assert!(is_email("admin@ldrp.ac.in"));
        assert!(!is_email("admin@"));
        let mut v = Validator::new();
        v.url("website", "https://ldrp.ac.in").phone("contactNumber", "+91 79 2324 1492");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn extracts_url_hosts() {
        assert_eq!(url_host("https://res.cloudinary.com/demo/cert.pdf"), Some("res.cloudinary.com".into()));
        assert_eq!(url_host("http://user@Drive.Google.com:443/x"), Some("drive.google.com".into()));
        assert_eq!(url_host("ftp://example.com"), None);
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(blank_to_none(Some("   ")), None);
        assert_eq!(blank_to_none(Some(" x ")), Some("x".to_string()));
        assert_eq!(blank_to_none(None), None);
    }
}
