use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::error::ConfigError;

pub const DEFAULT_SEARCH_URL: &str = "https://www.hannaford.com/search/product?form_state=searchForm&keyword=apples&ieDummyTextField=&productTypeId=P";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_SMTP_HOST: &str = "smtp-relay.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub threshold: ThresholdConfig,
    pub fetch: FetchConfig,
    pub listing: ListingConfig,
    pub email: EmailConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    pub max_price_per_unit: f64,
    pub seasonal_gate_enabled: bool,
    pub active_months: BTreeSet<u32>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_price_per_unit: 1.50,
            seasonal_gate_enabled: true,
            active_months: BTreeSet::from([8, 9, 10]), // Aug–Oct
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    Http,
    Curl,
}

impl FromStr for FetchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "native" => Ok(FetchBackend::Http),
            "curl" => Ok(FetchBackend::Curl),
            other => Err(format!("unknown fetch backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub search_url: String,
    pub backend: FetchBackend,
    pub curl_path: String,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    pub timeout: Duration,
    /// Randomized pause before each request, `None` disables it.
    pub pre_request_delay: Option<(Duration, Duration)>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            backend: FetchBackend::Http,
            curl_path: "curl".to_string(),
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(1000),
            timeout: Duration::from_secs(45),
            pre_request_delay: Some((Duration::from_millis(1000), Duration::from_millis(3000))),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// What to do with listings that are not priced per pound.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum UnitPolicy {
    Exclude,
    AssumeWeight { pounds: f64 },
}

impl FromStr for UnitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "exclude" {
            return Ok(UnitPolicy::Exclude);
        }
        if let Some(weight) = s.strip_prefix("assume-weight:") {
            let pounds: f64 = weight
                .trim()
                .parse()
                .map_err(|_| format!("invalid weight '{}'", weight))?;
            if !(pounds.is_finite() && pounds > 0.0) {
                return Err(format!("weight must be positive, got {}", pounds));
            }
            return Ok(UnitPolicy::AssumeWeight { pounds });
        }
        Err(format!("expected 'exclude' or 'assume-weight:<lbs>', got '{}'", s))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    pub keyword: String,
    pub unit_policy: UnitPolicy,
    pub require_listings: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            keyword: "apple".to_string(),
            unit_policy: UnitPolicy::Exclude,
            require_listings: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub to_address: String,
    pub smtp_username: String,
    pub smtp_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let threshold_defaults = ThresholdConfig::default();
        let threshold = ThresholdConfig {
            max_price_per_unit: parse_or(&get, "MAX_PRICE_PER_LB", threshold_defaults.max_price_per_unit)?,
            seasonal_gate_enabled: parse_bool_or(&get, "ONLY_IN_SEASON", true)?,
            active_months: match get("SEASON_MONTHS") {
                Some(raw) => parse_months(&raw)
                    .map_err(|reason| ConfigError::invalid("SEASON_MONTHS", &raw, reason))?,
                None => threshold_defaults.active_months,
            },
        };
        if !(threshold.max_price_per_unit.is_finite() && threshold.max_price_per_unit >= 0.0) {
            return Err(ConfigError::invalid(
                "MAX_PRICE_PER_LB",
                &threshold.max_price_per_unit.to_string(),
                "must be a non-negative number",
            ));
        }

        let fetch_defaults = FetchConfig::default();
        let max_attempts: u32 = parse_or(&get, "FETCH_MAX_ATTEMPTS", fetch_defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::invalid("FETCH_MAX_ATTEMPTS", "0", "must be at least 1"));
        }
        let timeout_secs: u64 = parse_or(&get, "FETCH_TIMEOUT_SECS", fetch_defaults.timeout.as_secs())?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("FETCH_TIMEOUT_SECS", "0", "must be at least 1"));
        }
        let fetch = FetchConfig {
            search_url: get("SEARCH_URL").unwrap_or(fetch_defaults.search_url),
            backend: parse_or(&get, "FETCH_BACKEND", fetch_defaults.backend)?,
            curl_path: get("CURL_PATH").unwrap_or(fetch_defaults.curl_path),
            max_attempts,
            base_delay: Duration::from_millis(parse_or(&get, "FETCH_BASE_DELAY_MS", 2000u64)?),
            max_jitter: Duration::from_millis(parse_or(&get, "FETCH_JITTER_MS", 1000u64)?),
            timeout: Duration::from_secs(timeout_secs),
            pre_request_delay: match get("FETCH_PRE_DELAY_MS") {
                Some(raw) => parse_delay_range(&raw)
                    .map_err(|reason| ConfigError::invalid("FETCH_PRE_DELAY_MS", &raw, reason))?,
                None => fetch_defaults.pre_request_delay,
            },
            user_agent: get("USER_AGENT").unwrap_or(fetch_defaults.user_agent),
        };

        let listing_defaults = ListingConfig::default();
        let listing = ListingConfig {
            keyword: get("PRODUCT_KEYWORD")
                .map(|k| k.trim().to_lowercase())
                .unwrap_or(listing_defaults.keyword),
            unit_policy: parse_or(&get, "PER_EACH_POLICY", listing_defaults.unit_policy)?,
            require_listings: parse_bool_or(&get, "REQUIRE_LISTINGS", true)?,
        };

        let enabled = parse_bool_or(&get, "EMAIL_ENABLED", true)?;
        let email = if enabled {
            let from_address = get("EMAIL_FROM").ok_or(ConfigError::Missing("EMAIL_FROM"))?;
            EmailConfig {
                enabled,
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or(&get, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                to_address: get("EMAIL_TO").ok_or(ConfigError::Missing("EMAIL_TO"))?,
                smtp_username: get("SMTP_USERNAME").unwrap_or_else(|| from_address.clone()),
                smtp_password: get("SMTP_PASSWORD").ok_or(ConfigError::Missing("SMTP_PASSWORD"))?,
                from_address,
            }
        } else {
            EmailConfig {
                enabled,
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or(&get, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from_address: get("EMAIL_FROM").unwrap_or_default(),
                to_address: get("EMAIL_TO").unwrap_or_default(),
                smtp_username: get("SMTP_USERNAME").unwrap_or_default(),
                smtp_password: String::new(),
            }
        };

        Ok(Config {
            threshold,
            fetch,
            listing,
            email,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, &raw, e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, &raw, "expected a boolean")),
        },
        None => Ok(default),
    }
}

fn parse_months(raw: &str) -> Result<BTreeSet<u32>, String> {
    let mut months = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let month: u32 = part
            .parse()
            .map_err(|_| format!("'{}' is not a month number", part))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month {} out of range 1-12", month));
        }
        months.insert(month);
    }
    Ok(months)
}

/// Accepts `0` (disabled), a fixed `ms`, or a `min-max` range in milliseconds.
fn parse_delay_range(raw: &str) -> Result<Option<(Duration, Duration)>, String> {
    let raw = raw.trim();
    let (lo, hi) = match raw.split_once('-') {
        Some((lo, hi)) => (lo.trim(), hi.trim()),
        None => (raw, raw),
    };
    let lo: u64 = lo.parse().map_err(|_| format!("'{}' is not milliseconds", lo))?;
    let hi: u64 = hi.parse().map_err(|_| format!("'{}' is not milliseconds", hi))?;
    if lo > hi {
        return Err("range minimum exceeds maximum".to_string());
    }
    if hi == 0 {
        return Ok(None);
    }
    Ok(Some((Duration::from_millis(lo), Duration::from_millis(hi))))
}
