//! Row decoding helpers shared by the query modules.

use std::str::FromStr;

use jiff::Timestamp;
use rusqlite::{types::Type, Row};

/// Reads an INTEGER primary or foreign key.
pub(crate) fn id(row: &Row, idx: usize) -> rusqlite::Result<u64> {
    row.get::<_, i64>(idx).map(|v| v as u64)
}

pub(crate) fn opt_id(row: &Row, idx: usize) -> rusqlite::Result<Option<u64>> {
    row.get::<_, Option<i64>>(idx).map(|v| v.map(|v| v as u64))
}

/// Reads an RFC 3339 TEXT column.
pub(crate) fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(idx)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            s.parse::<Timestamp>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        })
        .transpose()
}

/// Parses a TEXT column into one of the status enums.
pub(crate) fn parsed<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Decodes a JSON TEXT column.
pub(crate) fn json<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// URL-safe slug from a title: lowercase ASCII alphanumerics separated by
/// single dashes.
pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Whether `slug` is non-empty and only uses `[a-z0-9-]`.
pub(crate) fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Customer Onboarding"), "customer-onboarding");
        assert_eq!(slugify("  KYC -- Step 2!  "), "kyc-step-2");
        assert_eq!(slugify("Überblick"), "berblick");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("customer-onboarding"));
        assert!(!is_valid_slug("Customer"));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug(""));
    }
}
