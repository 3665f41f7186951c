use log::*;

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual service, e.g. `http://localhost:8078`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

const DEFAULT_ACCRUAL_URL: &str = "http://localhost:8078";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_ACCRUAL_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

impl AccrualConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        // A trailing slash would produce `//api/orders/..` urls, which some routers 404 on.
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, ..Default::default() }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("LOYALTY_ACCRUAL_URL").unwrap_or_else(|_| {
            warn!("LOYALTY_ACCRUAL_URL not set, using {DEFAULT_ACCRUAL_URL} as default");
            DEFAULT_ACCRUAL_URL.to_string()
        });
        Self::new(base_url)
    }
}
