//! Text fields submitted alongside uploads.

use chrono::NaiveDate;
use regex::RegexSet;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::ApiError;

/// Patterns that mark a free-text field as hostile. Matched against the lowercased value.
static MALICIOUS_TEXT: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"<script.*?>.*?</script>",
        r"on[a-z0-9_]+\s*=",
        r"javascript:",
        r"<.*?>",
        r"eval\s*\(",
        r"base64,",
        r"drop\s+table",
        r"union\s+select",
        r"--",
    ])
    .expect("malicious text patterns are valid")
});

pub fn is_malicious_text(text: &str) -> bool {
    MALICIOUS_TEXT.is_match(&text.to_lowercase())
}

fn has_shape(value: &str, digits: &[usize], dashes: &[usize]) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && digits.iter().all(|&i| bytes[i].is_ascii_digit())
        && dashes.iter().all(|&i| bytes[i] == b'-')
}

/// Parses `DD-MM-YYYY` or `YYYY-MM-DD`. The date must exist in the calendar.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if has_shape(value, &[0, 1, 3, 4, 6, 7, 8, 9], &[2, 5]) {
        NaiveDate::parse_from_str(value, "%d-%m-%Y").ok()
    } else if has_shape(value, &[0, 1, 2, 3, 5, 6, 8, 9], &[4, 7]) {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    } else {
        None
    }
}

/// FormFields
///
/// The ordinary (non-file) fields of a multipart submission. A repeated name keeps the
/// last value.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw value, untrimmed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Trimmed free text, `None` when absent or blank. Rejects hostile content.
    pub fn optional_text(&self, name: &str) -> Result<Option<String>, ApiError> {
        let Some(value) = self.get(name).map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        if is_malicious_text(value) {
            return Err(ApiError::BadRequest(format!(
                "Malicious content detected in {name}"
            )));
        }
        Ok(Some(value.to_string()))
    }

    pub fn required_text(&self, name: &str) -> Result<String, ApiError> {
        self.optional_text(name)?
            .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, ApiError> {
        let value = self
            .get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))?;
        parse_date(value).ok_or_else(|| {
            ApiError::BadRequest("Invalid date format. Use DD-MM-YYYY or YYYY-MM-DD".to_string())
        })
    }

    /// Lenient integer: absent, unparsable or zero values all become `default`.
    pub fn int_or(&self, name: &str, default: i32) -> i32 {
        self.get(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|n| *n != 0)
            .unwrap_or(default)
    }

    pub fn required_int(&self, name: &str) -> Result<i32, ApiError> {
        self.get(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid or missing {name}")))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
