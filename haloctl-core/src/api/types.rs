//! Halo admin API payloads.
//!
//! Only the fields haloctl displays are modelled; unknown fields are ignored.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Halo wraps every body as `{ status, message, data }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub full_path: String,
    /// Epoch milliseconds.
    pub create_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub original_content: Option<String>,
}

/// Filters for `GET /posts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub keyword: Option<String>,
    pub category_id: Option<u64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalType {
    #[default]
    Public,
    Intimate,
}

impl JournalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Intimate => "intimate",
        }
    }
}

impl fmt::Display for JournalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JournalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "intimate" => Ok(Self::Intimate),
            other => Err(format!("unknown journal type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    #[serde(default)]
    pub id: Option<u64>,
    pub source_content: String,
    #[serde(rename = "type", default)]
    pub kind: JournalType,
    #[serde(default)]
    pub create_time: Option<i64>,
}

/// Body of `POST /journals`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournal<'a> {
    pub source_content: &'a str,
    #[serde(rename = "type")]
    pub kind: JournalType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub thumb_path: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub create_time: i64,
}

impl Attachment {
    pub fn markdown_link(&self) -> String {
        format!("![{}]({})", self.name, self.path)
    }

    pub fn html_image(&self) -> String {
        format!(r#"<img src="{}" alt="{}" />"#, self.path, self.name)
    }
}

/// Running Halo instance, from `GET /environments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub version: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub start_time: Option<i64>,
}

/// Render epoch milliseconds as `YYYY-MM-DD` (UTC).
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
