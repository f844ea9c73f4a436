use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub database_url: Option<String>,
    pub db_pool_max_connections: u32,
    pub db_pool_min_connections: u32,
    pub db_pool_acquire_timeout_seconds: u64,
    pub db_pool_idle_timeout_seconds: u64,
    pub platform_fee_percent: f64,
    pub service_fee_percent: f64,
    pub tax_percent: f64,
    pub auto_release_hours: i64,
    pub auto_release_sweep_interval_minutes: u64,
    pub auto_release_batch_size: i64,
    pub payout_provider_base_url: String,
    pub payout_provider_api_key: Option<String>,
    pub payout_provider_timeout_seconds: u64,
    pub payment_webhook_secret: Option<String>,
    pub notification_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Lodgia API"),
            environment: env_or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&env_or("API_PREFIX", "/v1")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8000),
            cors_origins: parse_csv(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            rate_limit_per_second: env_parse_or("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: env_parse_or("RATE_LIMIT_BURST_SIZE", 100),
            database_url: env_opt("DATABASE_URL"),
            db_pool_max_connections: env_parse_or("DB_POOL_MAX_CONNECTIONS", 5),
            db_pool_min_connections: env_parse_or("DB_POOL_MIN_CONNECTIONS", 1),
            db_pool_acquire_timeout_seconds: env_parse_or("DB_POOL_ACQUIRE_TIMEOUT_SECONDS", 5),
            db_pool_idle_timeout_seconds: env_parse_or("DB_POOL_IDLE_TIMEOUT_SECONDS", 600),
            platform_fee_percent: env_parse_or("PLATFORM_FEE_PERCENT", 7.0),
            service_fee_percent: env_parse_or("SERVICE_FEE_PERCENT", 10.0),
            tax_percent: env_parse_or("TAX_PERCENT", 18.0),
            auto_release_hours: env_parse_or("AUTO_RELEASE_HOURS", 24),
            auto_release_sweep_interval_minutes: env_parse_or(
                "AUTO_RELEASE_SWEEP_INTERVAL_MINUTES",
                15,
            ),
            auto_release_batch_size: env_parse_or("AUTO_RELEASE_BATCH_SIZE", 10),
            payout_provider_base_url: env_or(
                "PAYOUT_PROVIDER_BASE_URL",
                "https://api.payouts.example.com",
            ),
            payout_provider_api_key: env_opt("PAYOUT_PROVIDER_API_KEY"),
            payout_provider_timeout_seconds: env_parse_or("PAYOUT_PROVIDER_TIMEOUT_SECONDS", 15),
            payment_webhook_secret: env_opt("PAYMENT_WEBHOOK_SECRET"),
            notification_webhook_url: env_opt("NOTIFICATION_WEBHOOK_URL"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::normalize_prefix;

    #[test]
    fn normalizes_prefix() {
        assert_eq!(normalize_prefix("v1"), "/v1");
        assert_eq!(normalize_prefix("/v1/"), "/v1");
        assert_eq!(normalize_prefix(""), "/v1");
    }
}
