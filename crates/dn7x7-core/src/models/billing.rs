use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Daily call limit the backend assigns when none is requested
pub const DEFAULT_DAILY_LIMIT: u32 = 1000;

/// Credit balance (`/dashboard/credits/`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CreditBalance {
    pub daily_free_credits: i64,
    pub purchased_credits: i64,
    /// Free plus purchased, as computed by the backend
    pub remaining_credits: i64,
}

impl CreditBalance {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_credits <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub daily_limit: u32,
}

impl ApiKey {
    /// Key prefix safe to show in listings, e.g. `dn7x7_3f2a...`
    pub fn masked(&self) -> String {
        let visible: String = self.key.chars().take(10).collect();
        if visible.len() < self.key.len() {
            format!("{}...", visible)
        } else {
            visible
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewApiKey {
    pub name: String,
    pub daily_limit: u32,
}

impl NewApiKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }

    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }
}

/// One call made with one of the user's API keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ApiCallLog {
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ApiCallLog {
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// Generic `{"status": "..."}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum TimeRange {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    #[default]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::LastHour => "1h",
            TimeRange::LastDay => "24h",
            TimeRange::LastWeek => "7d",
            TimeRange::LastMonth => "30d",
            TimeRange::All => "all",
        }
    }

    /// Length of the window, `None` for `All`
    pub fn duration(&self) -> Option<Duration> {
        match self {
            TimeRange::LastHour => Some(Duration::hours(1)),
            TimeRange::LastDay => Some(Duration::hours(24)),
            TimeRange::LastWeek => Some(Duration::days(7)),
            TimeRange::LastMonth => Some(Duration::days(30)),
            TimeRange::All => None,
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeRange::LastHour),
            "24h" => Ok(TimeRange::LastDay),
            "7d" => Ok(TimeRange::LastWeek),
            "30d" => Ok(TimeRange::LastMonth),
            "all" => Ok(TimeRange::All),
            other => Err(format!(
                "Invalid time range '{}' (expected 1h, 24h, 7d, 30d or all)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Success,
    Error,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Success => "success",
            StatusFilter::Error => "error",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "success" => Ok(StatusFilter::Success),
            "error" => Ok(StatusFilter::Error),
            other => Err(format!(
                "Invalid status filter '{}' (expected all, success or error)",
                other
            )),
        }
    }
}

/// Usage log query. Both halves are sent to the backend and applied again
/// locally: the backend returns its latest calls regardless of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LogFilter {
    pub time_range: TimeRange,
    pub status_filter: StatusFilter,
}

impl LogFilter {
    pub fn matches(&self, log: &ApiCallLog) -> bool {
        self.matches_at(log, Utc::now())
    }

    /// Like [`matches`](Self::matches), with the window ending at `now`
    pub fn matches_at(&self, log: &ApiCallLog, now: DateTime<Utc>) -> bool {
        if let Some(window) = self.time_range.duration() {
            if log.timestamp < now - window {
                return false;
            }
        }
        match self.status_filter {
            StatusFilter::All => true,
            StatusFilter::Success => log.is_success(),
            StatusFilter::Error => !log.is_success(),
        }
    }

    pub fn apply(&self, logs: Vec<ApiCallLog>) -> Vec<ApiCallLog> {
        let now = Utc::now();
        logs.into_iter()
            .filter(|log| self.matches_at(log, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(status_code: u16) -> ApiCallLog {
        log_aged(status_code, Duration::zero())
    }

    fn log_aged(status_code: u16, age: Duration) -> ApiCallLog {
        ApiCallLog {
            endpoint: "/api/news/".to_string(),
            method: "GET".to_string(),
            status_code,
            ip_address: None,
            timestamp: Utc::now() - age,
        }
    }

    #[test]
    fn test_parse_api_key() {
        let json = r#"{"id": 3, "name": "Production", "key": "dn7x7_0123456789abcdef0123456789abcdef", "created_at": "2025-03-02T11:00:00.123456Z", "is_active": true, "daily_limit": 1000}"#;
        let key: ApiKey = serde_json::from_str(json).unwrap();

        assert_eq!(key.id, 3);
        assert!(key.is_active);
        assert_eq!(key.masked(), "dn7x7_0123...");
    }

    #[test]
    fn test_parse_call_log_without_ip() {
        let json = r#"{"endpoint": "/api/news/", "method": "GET", "status_code": 402, "ip_address": null, "timestamp": "2025-03-02T11:00:00Z"}"#;
        let entry: ApiCallLog = serde_json::from_str(json).unwrap();

        assert!(!entry.is_success());
        assert_eq!(entry.ip_address, None);
    }

    #[test]
    fn test_status_filter() {
        let logs = vec![log(200), log(304), log(402), log(500)];

        let errors = LogFilter {
            status_filter: StatusFilter::Error,
            ..LogFilter::default()
        };
        assert_eq!(errors.apply(logs.clone()).len(), 2);

        let successes = LogFilter {
            status_filter: StatusFilter::Success,
            ..LogFilter::default()
        };
        assert_eq!(successes.apply(logs.clone()).len(), 2);

        assert_eq!(LogFilter::default().apply(logs).len(), 4);
    }

    #[test]
    fn test_time_range_window() {
        let logs = vec![
            log_aged(200, Duration::minutes(5)),
            log_aged(500, Duration::hours(3)),
            log_aged(200, Duration::days(3)),
            log_aged(404, Duration::days(45)),
        ];

        let last_hour = LogFilter {
            time_range: TimeRange::LastHour,
            ..LogFilter::default()
        };
        assert_eq!(last_hour.apply(logs.clone()).len(), 1);

        let last_week_errors = LogFilter {
            time_range: TimeRange::LastWeek,
            status_filter: StatusFilter::Error,
        };
        let errors = last_week_errors.apply(logs.clone());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].status_code, 500);

        let everything = LogFilter {
            time_range: TimeRange::All,
            ..LogFilter::default()
        };
        assert_eq!(everything.apply(logs).len(), 4);
    }

    #[test]
    fn test_window_edge_is_inclusive() {
        let now = Utc::now();
        let filter = LogFilter {
            time_range: TimeRange::LastDay,
            ..LogFilter::default()
        };
        let mut entry = log(200);

        entry.timestamp = now - Duration::hours(24);
        assert!(filter.matches_at(&entry, now));

        entry.timestamp = now - Duration::hours(24) - Duration::seconds(1);
        assert!(!filter.matches_at(&entry, now));
    }

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::LastWeek);
        assert_eq!(TimeRange::default().as_str(), "24h");
        assert_eq!(TimeRange::All.duration(), None);
        assert!("2w".parse::<TimeRange>().is_err());
        assert_eq!(
            serde_json::to_string(&TimeRange::LastMonth).unwrap(),
            "\"30d\""
        );
    }

    #[test]
    fn test_new_key_defaults_limit() {
        assert_eq!(NewApiKey::new("CI").daily_limit, DEFAULT_DAILY_LIMIT);
        assert_eq!(NewApiKey::new("CI").with_daily_limit(50).daily_limit, 50);
    }
}
