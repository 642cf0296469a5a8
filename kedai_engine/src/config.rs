//! Engine configuration.
//!
//! Everything is read from the environment (a `.env` file is honoured via `dotenvy`). Missing or malformed values are
//! logged and replaced with defaults; loading configuration never fails.
use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use kedai_common::Rupiah;
use log::*;

use crate::helpers::MerchantProfile;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/kedai.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_PAYMENT_VALIDITY_MINUTES: i64 = 15;
const DEFAULT_PAYMENT_REUSE_MINUTES: i64 = 60;
const DEFAULT_PAYMENT_TOLERANCE: i64 = 100;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    /// Upper bound on pooled database connections. Callers wait for a free connection once it is reached.
    pub max_connections: u32,
    pub payments: PaymentSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            payments: PaymentSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            debug!("🪛️ No .env file loaded. {e}");
        }
        let database_url = env::var("KEDAI_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ KEDAI_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env_or_default("KEDAI_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let max_connections = if max_connections == 0 {
            warn!("🪛️ KEDAI_DB_MAX_CONNECTIONS must be at least 1. Using the default, {DEFAULT_MAX_CONNECTIONS}.");
            DEFAULT_MAX_CONNECTIONS
        } else {
            max_connections
        };
        let payments = PaymentSettings::from_env_or_default();
        Self { database_url, max_connections, payments }
    }
}

/// Rules governing QR payments.
#[derive(Clone, Debug)]
pub struct PaymentSettings {
    /// How long a newly issued (or refreshed) payment may be paid.
    pub validity: Duration,
    /// A live payment created within this window is handed out again instead of issuing a new one.
    pub reuse_window: Duration,
    /// The largest accepted difference between the requested amount and the order total.
    pub tolerance: Rupiah,
    pub merchant: MerchantProfile,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            validity: Duration::minutes(DEFAULT_PAYMENT_VALIDITY_MINUTES),
            reuse_window: Duration::minutes(DEFAULT_PAYMENT_REUSE_MINUTES),
            tolerance: Rupiah::from(DEFAULT_PAYMENT_TOLERANCE),
            merchant: MerchantProfile::default(),
        }
    }
}

impl PaymentSettings {
    pub fn from_env_or_default() -> Self {
        let validity = positive_minutes("KEDAI_PAYMENT_VALIDITY_MINUTES", DEFAULT_PAYMENT_VALIDITY_MINUTES);
        let reuse_window = positive_minutes("KEDAI_PAYMENT_REUSE_MINUTES", DEFAULT_PAYMENT_REUSE_MINUTES);
        let tolerance = env_or_default("KEDAI_PAYMENT_TOLERANCE", DEFAULT_PAYMENT_TOLERANCE);
        let tolerance = if tolerance < 0 {
            warn!("🪛️ KEDAI_PAYMENT_TOLERANCE cannot be negative. Using the default, {DEFAULT_PAYMENT_TOLERANCE}.");
            Rupiah::from(DEFAULT_PAYMENT_TOLERANCE)
        } else {
            Rupiah::from(tolerance)
        };
        let defaults = MerchantProfile::default();
        let merchant = MerchantProfile {
            name: non_empty_or_default("KEDAI_MERCHANT_NAME", defaults.name),
            city: non_empty_or_default("KEDAI_MERCHANT_CITY", defaults.city),
            category_code: non_empty_or_default("KEDAI_MERCHANT_CATEGORY", defaults.category_code),
            country_code: defaults.country_code,
        };
        Self { validity, reuse_window, tolerance, merchant }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e}. Using the default, {default}.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

fn positive_minutes(name: &str, default: i64) -> Duration {
    let minutes = env_or_default(name, default);
    if minutes <= 0 {
        warn!("🪛️ {name} must be a positive number of minutes. Using the default, {default}.");
        return Duration::minutes(default);
    }
    Duration::minutes(minutes)
}

fn non_empty_or_default(name: &str, default: String) -> String {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).unwrap_or(default)
}
