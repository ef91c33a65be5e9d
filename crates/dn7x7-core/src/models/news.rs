use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest page the news API returns. It is also the effective default.
pub const MAX_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Indian,
    Global,
    Blog,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Indian => "indian",
            NewsCategory::Global => "global",
            NewsCategory::Blog => "blog",
        }
    }
}

impl FromStr for NewsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indian" => Ok(NewsCategory::Indian),
            "global" => Ok(NewsCategory::Global),
            "blog" => Ok(NewsCategory::Blog),
            other => Err(format!(
                "Unknown category '{}' (expected indian, global or blog)",
                other
            )),
        }
    }
}

/// List entry: excerpt instead of the full body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsSummary {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    #[serde(default)]
    pub image: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsArticle {
    pub id: i64,
    pub title: String,
    /// Rendered HTML
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsPage {
    pub results: Vec<NewsSummary>,
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl NewsPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Query for `GET /news/`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub category: Option<NewsCategory>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl NewsQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(category) = self.category {
            params.push(("category".to_string(), category.as_str().to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
            params.push(("page_size".to_string(), page_size.to_string()));
        }
        params
    }
}
