use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CopilotError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    /// Company whose notifications this engine owns.
    #[serde(default = "default_company_id")]
    pub company_id: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub policy: CheckPolicy,
}

fn default_company_id() -> String { "default".to_string() }

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            company_id: default_company_id(),
            storage: StorageConfig::default(),
            scheduler: SchedulerConfig::default(),
            policy: CheckPolicy::default(),
        }
    }
}

impl CopilotConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `COPILOT_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("COPILOT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            company_id: profiled_env_or(p, "COPILOT_COMPANY_ID", "default"),
            storage: StorageConfig::from_env_profiled(p),
            scheduler: SchedulerConfig::from_env_profiled(p),
            policy: CheckPolicy::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Storage key of this company's persisted notification set.
    pub fn notifications_key(&self) -> String {
        format!("copilot-notifications-{}", self.company_id)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  company:     {}", self.company_id);
        tracing::info!("  storage:     data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  scheduler:   initial_delay={}s, interval={}s, min_interval={}s",
            self.scheduler.initial_delay_secs,
            self.scheduler.check_interval_secs,
            self.scheduler.min_interval_secs
        );
        tracing::info!(
            "  policy:      max_notifications={}, anomaly_ratio={}, duplicate_tolerance={}",
            self.policy.max_notifications,
            self.policy.anomaly_ratio,
            self.policy.duplicate_tolerance
        );
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "COPILOT_DATA_DIR", "data")),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

/// Cadence and throttle of the background check loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay before the first run after `start()`.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    /// Period between scheduled runs.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Minimum spacing between two admitted runs.
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
}

fn default_initial_delay() -> u64 { 5 }
fn default_check_interval() -> u64 { 1800 }
fn default_min_interval() -> u64 { 300 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            check_interval_secs: default_check_interval(),
            min_interval_secs: default_min_interval(),
        }
    }
}

impl SchedulerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            initial_delay_secs: profiled_env_parse(p, "COPILOT_INITIAL_DELAY_SECS", default_initial_delay()),
            check_interval_secs: profiled_env_parse(p, "COPILOT_CHECK_INTERVAL_SECS", default_check_interval()),
            min_interval_secs: profiled_env_parse(p, "COPILOT_MIN_INTERVAL_SECS", default_min_interval()),
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    /// Reject settings the check loop cannot run with.
    pub fn validate(&self) -> Result<(), CopilotError> {
        if self.check_interval_secs == 0 {
            return Err(CopilotError::Config(
                "check_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Check policy ──────────────────────────────────────────────

/// Fixed policy constants used by the check functions and the merge cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckPolicy {
    /// Upper bound on the persisted set.
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
    /// Latest invoice / mean of the others above which an amount is flagged.
    #[serde(default = "default_anomaly_ratio")]
    pub anomaly_ratio: f64,
    /// Minimum invoices per counterparty before anomaly detection applies.
    #[serde(default = "default_anomaly_min_invoices")]
    pub anomaly_min_invoices: usize,
    /// Relative amount difference under which a repeated invoice number is a duplicate.
    #[serde(default = "default_duplicate_tolerance")]
    pub duplicate_tolerance: f64,
    /// Payables due within this many days count as outgoing cash.
    #[serde(default = "default_cashflow_horizon")]
    pub cashflow_horizon_days: i64,
    /// Day of month on which VAT and employer contributions are due.
    #[serde(default = "default_deadline_day")]
    pub deadline_day: u32,
    /// VAT reminder turns critical at or below this many days left.
    #[serde(default = "default_vat_critical_days")]
    pub vat_critical_days: i64,
    /// Employer-contribution reminder appears at or below this many days left.
    #[serde(default = "default_employer_window_days")]
    pub employer_window_days: i64,
    /// Employer-contribution reminder turns warning at or below this many days left.
    #[serde(default = "default_employer_warning_days")]
    pub employer_warning_days: i64,
    /// Unreconciled periods at which the gap becomes a warning.
    #[serde(default = "default_reconciliation_warning")]
    pub reconciliation_warning_periods: usize,
}

fn default_max_notifications() -> usize { 20 }
fn default_anomaly_ratio() -> f64 { 3.0 }
fn default_anomaly_min_invoices() -> usize { 3 }
fn default_duplicate_tolerance() -> f64 { 0.05 }
fn default_cashflow_horizon() -> i64 { 30 }
fn default_deadline_day() -> u32 { 12 }
fn default_vat_critical_days() -> i64 { 3 }
fn default_employer_window_days() -> i64 { 5 }
fn default_employer_warning_days() -> i64 { 2 }
fn default_reconciliation_warning() -> usize { 3 }

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            max_notifications: default_max_notifications(),
            anomaly_ratio: default_anomaly_ratio(),
            anomaly_min_invoices: default_anomaly_min_invoices(),
            duplicate_tolerance: default_duplicate_tolerance(),
            cashflow_horizon_days: default_cashflow_horizon(),
            deadline_day: default_deadline_day(),
            vat_critical_days: default_vat_critical_days(),
            employer_window_days: default_employer_window_days(),
            employer_warning_days: default_employer_warning_days(),
            reconciliation_warning_periods: default_reconciliation_warning(),
        }
    }
}

impl CheckPolicy {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_notifications: profiled_env_parse(p, "COPILOT_MAX_NOTIFICATIONS", defaults.max_notifications),
            anomaly_ratio: profiled_env_parse(p, "COPILOT_ANOMALY_RATIO", defaults.anomaly_ratio),
            duplicate_tolerance: profiled_env_parse(p, "COPILOT_DUPLICATE_TOLERANCE", defaults.duplicate_tolerance),
            cashflow_horizon_days: profiled_env_parse(p, "COPILOT_CASHFLOW_HORIZON_DAYS", defaults.cashflow_horizon_days),
            ..defaults
        }
    }
}
