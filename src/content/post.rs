//! Post and category records

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post as published in the data repository's `posts/index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Display title
    pub title: String,

    /// Short summary shown in listings
    pub excerpt: String,

    /// Unique slug, also the name of the markdown body (`<file>.md`)
    pub file: String,

    /// Creation date as written in the index
    #[serde(default)]
    pub created_date: Option<String>,

    /// Last edit date, if the post was ever edited
    #[serde(default)]
    pub edited_date: Option<String>,

    /// Category slugs
    #[serde(default)]
    pub categories: Vec<String>,
}

impl PostRecord {
    /// Create a record with only the required fields
    pub fn new(title: &str, file: &str, created_date: &str) -> Self {
        Self {
            title: title.to_string(),
            excerpt: String::new(),
            file: file.to_string(),
            created_date: Some(created_date.to_string()),
            edited_date: None,
            categories: Vec::new(),
        }
    }

    /// Parsed creation date; `Ok(None)` when the field is absent or blank
    pub fn created(&self) -> Result<Option<DateTime<Utc>>, String> {
        parse_optional(self.created_date.as_deref())
    }

    /// Parsed edit date; `Ok(None)` when the field is absent or blank
    pub fn edited(&self) -> Result<Option<DateTime<Utc>>, String> {
        parse_optional(self.edited_date.as_deref())
    }

    /// The date a post is ordered by: the edit date if there is one,
    /// otherwise the creation date.
    ///
    /// The error string describes why no usable date exists.
    pub fn effective_date(&self) -> Result<DateTime<Utc>, String> {
        let edited = self.edited()?;
        let created = self.created()?;
        edited
            .or(created)
            .ok_or_else(|| "missing both createdDate and editedDate".to_string())
    }

    /// Whether the post is tagged with the given category slug
    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c == slug)
    }
}

/// A taxonomy entry from `categories.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl CategoryRecord {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    /// The category's slug, derived from its name when the record has none
    pub fn slug(&self) -> String {
        if self.slug.trim().is_empty() {
            slug::slugify(&self.name)
        } else {
            self.slug.clone()
        }
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date_string(s)
            .map(Some)
            .ok_or_else(|| format!("unparseable date {:?}", s)),
    }
}

/// Parse a date string in the formats used by the post index.
/// Values without an offset are taken as UTC.
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_index_entry() {
        let json = r#"{
            "title": "Hello",
            "excerpt": "First post",
            "file": "hello",
            "createdDate": "2024-01-01",
            "editedDate": "2024-02-01",
            "categories": ["rust", "web"]
        }"#;
        let post: PostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(post.file, "hello");
        assert_eq!(post.edited_date.as_deref(), Some("2024-02-01"));
        assert!(post.has_category("web"));
        assert!(!post.has_category("go"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{"title": "T", "excerpt": "", "file": "t", "createdDate": "2024-01-01"}"#;
        let post: PostRecord = serde_json::from_str(json).unwrap();
        assert!(post.edited_date.is_none());
        assert!(post.categories.is_empty());
        assert_eq!(post.excerpt, "");
    }

    #[test]
    fn test_required_fields() {
        for json in [
            r#"{"file": "t", "excerpt": "", "createdDate": "2024-01-01"}"#,
            r#"{"title": "T", "file": "t", "createdDate": "2024-01-01"}"#,
            r#"{"title": "T", "excerpt": "", "createdDate": "2024-01-01"}"#,
        ] {
            assert!(serde_json::from_str::<PostRecord>(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn test_effective_date_prefers_edited() {
        let mut post = PostRecord::new("T", "t", "2024-03-01");
        post.edited_date = Some("2024-06-01".to_string());
        assert_eq!(
            post.effective_date().unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_blank_edited_date_falls_back() {
        let mut post = PostRecord::new("T", "t", "2024-03-01");
        post.edited_date = Some("  ".to_string());
        assert_eq!(
            post.effective_date().unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_no_date_is_an_error() {
        let mut post = PostRecord::new("T", "t", "");
        post.created_date = None;
        assert!(post.effective_date().is_err());
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let post = PostRecord::new("T", "t", "last tuesday");
        let err = post.effective_date().unwrap_err();
        assert!(err.contains("last tuesday"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_date_string("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(parse_date_string("2024/01/15 10:30"), Some(expected));
        assert_eq!(parse_date_string("2024-01-15T10:30:00"), Some(expected));
        assert_eq!(parse_date_string("2024-01-15T12:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_date_string("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date_string("not a date"), None);
    }

    #[test]
    fn test_category_slug_fallback() {
        let cat: CategoryRecord = serde_json::from_str(r#"{"name": "Web Dev"}"#).unwrap();
        assert_eq!(cat.slug(), "web-dev");
        assert_eq!(CategoryRecord::new("Rust", "rustlang").slug(), "rustlang");
    }
}
