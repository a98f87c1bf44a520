use std::time::Duration;

use crate::fulfillment::money::DeductionRates;
use crate::recommendation::RecommendationConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/fulfillment | Working directory (ledger, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | LOCK_WAIT_MS | 5000 | Max wait for a per-aggregate lease |
/// | LOCK_TTL_MS | 30000 | Lease lifetime before auto-expiry |
/// | IDEMPOTENCY_RETENTION_DAYS | 30 | Idempotency record retention |
/// | MORTALITY_PENALTY | 25.0 | Deduction per lost bird |
/// | QUALITY_PENALTY_PERCENT | 10.0 | Subtotal percentage deducted on failed inspection |
/// | MAX_FARMS_PER_ORDER | 10 | Allocation cap per order |
/// | DISTRESS_BONUS_ENABLED | true | Bias allocation toward distressed farms |
/// | ENFORCE_SEPARATION_OF_DUTIES | true | Invoice approver must differ from creator |
/// | FARM_DIRECTORY_SEED | (unset) | JSON file seeding the static farm directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/fulfillment HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the ledger database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Concurrency ===
    /// Maximum wait for a per-aggregate lease before `ResourceLocked`
    pub lock_wait: Duration,
    /// Lease lifetime; expired leases may be taken over
    pub lock_ttl: Duration,

    // === Idempotency ===
    /// Retention window for idempotency records
    pub idempotency_retention: Duration,

    // === Financial rules ===
    pub deduction_rates: DeductionRates,
    /// Invoice approver must be a different actor than the creator
    pub enforce_separation_of_duties: bool,

    // === Allocation ===
    pub recommendation: RecommendationConfig,

    // === Collaborators ===
    /// Optional JSON seed file for the static farm directory
    pub farm_directory_seed: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, using defaults for
    /// anything unset
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/fulfillment".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            lock_wait: Duration::from_millis(env_parse("LOCK_WAIT_MS", 5000)),
            lock_ttl: Duration::from_millis(env_parse("LOCK_TTL_MS", 30_000)),
            idempotency_retention: Duration::from_secs(
                env_parse("IDEMPOTENCY_RETENTION_DAYS", 30u64) * 24 * 60 * 60,
            ),
            deduction_rates: DeductionRates {
                mortality_penalty_per_unit: env_parse("MORTALITY_PENALTY", 25.0),
                quality_penalty_percent: env_parse("QUALITY_PENALTY_PERCENT", 10.0),
            },
            enforce_separation_of_duties: env_parse("ENFORCE_SEPARATION_OF_DUTIES", true),
            recommendation: RecommendationConfig {
                max_farms: env_parse("MAX_FARMS_PER_ORDER", 10),
                distress_bonus_enabled: env_parse("DISTRESS_BONUS_ENABLED", true),
                ..RecommendationConfig::default()
            },
            farm_directory_seed: std::env::var("FARM_DIRECTORY_SEED").ok(),
        }
    }

    /// Override the paths/ports that matter in tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Path of the ledger database file
    pub fn ledger_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("ledger.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
