//! Runtime configuration
//!
//! All knobs come from environment variables with working defaults, the
//! same way the rest of the service configures itself. Threshold values
//! feed the analyzers' classification guidance; the call policy bounds
//! every store and generation call.

use std::time::Duration;

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// ANALYZER THRESHOLDS
// ============================================================================

/// Classification thresholds shared by the domain analyzers.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Days-to-expiry at or below which expiry risk is CRITICAL.
    pub critical_expiry_days: i64,
    /// Days-to-expiry at or below which expiry risk is HIGH.
    pub high_expiry_days: i64,
    /// Days-to-expiry at or below which expiry risk is MEDIUM; also the
    /// horizon of the expiry projection query.
    pub expiry_warning_days: i64,
    /// Forecast horizon in weeks for demand cover analysis. Rows with more
    /// cover than this are filtered out server-side.
    pub demand_forecast_weeks: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_expiry_days: 30,
            high_expiry_days: 60,
            expiry_warning_days: 90,
            demand_forecast_weeks: 8.0,
        }
    }
}

impl Thresholds {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            critical_expiry_days: env_i64(
                "VIGIL_CRITICAL_EXPIRY_DAYS",
                defaults.critical_expiry_days,
            ),
            high_expiry_days: env_i64("VIGIL_HIGH_EXPIRY_DAYS", defaults.high_expiry_days),
            expiry_warning_days: env_i64(
                "VIGIL_EXPIRY_WARNING_DAYS",
                defaults.expiry_warning_days,
            ),
            demand_forecast_weeks: env_f64(
                "VIGIL_DEMAND_FORECAST_WEEKS",
                defaults.demand_forecast_weeks,
            ),
        }
    }
}

// ============================================================================
// CALL POLICY
// ============================================================================

/// Timeout and retry bounds applied to every blocking network call
/// (store queries and generation requests). At most one retry; exhaustion
/// routes into the degraded-decision path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl CallPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: Duration::from_secs(
                env_i64("VIGIL_CALL_TIMEOUT_SECS", defaults.timeout.as_secs() as i64).max(1)
                    as u64,
            ),
            max_retries: env_i64("VIGIL_CALL_MAX_RETRIES", defaults.max_retries as i64)
                .clamp(0, 1) as u32,
        }
    }
}

// ============================================================================
// GENERATION PROVIDER CONFIGURATION
// ============================================================================

/// Connection settings for the OpenAI-compatible generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co/v1".to_string(),
            api_key: String::new(),
            model: "meta-llama/Llama-3.3-70B-Instruct:groq".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VIGIL_LLM_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("VIGIL_LLM_API_KEY").unwrap_or_default(),
            model: std::env::var("VIGIL_LLM_MODEL").unwrap_or(defaults.model),
        }
    }

    /// A provider cannot be constructed without credentials.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_defaults() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.critical_expiry_days, 30);
        assert_eq!(thresholds.high_expiry_days, 60);
        assert_eq!(thresholds.expiry_warning_days, 90);
        assert_eq!(thresholds.demand_forecast_weeks, 8.0);
    }

    #[test]
    fn test_call_policy_defaults() {
        let policy = CallPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(30));
        assert_eq!(policy.max_retries, 1);
    }

    #[test]
    fn test_llm_config_requires_api_key() {
        let config = LlmConfig::default();
        assert!(!config.is_configured());

        let configured = LlmConfig {
            api_key: "hf_token".to_string(),
            ..LlmConfig::default()
        };
        assert!(configured.is_configured());
    }
}
