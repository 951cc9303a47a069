use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub pricing: PricingConfig,
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<u32>,
    pub default_limit: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. When absent the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Optional admin account created at startup when missing.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percent,
    Flat,
}

/// One entry of the coupon table: `{code: {type, value}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRule {
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(with = "rust_decimal::serde::float")]
    pub free_shipping_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub express_surcharge: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
    pub coupons: BTreeMap<String, CouponRule>,
    pub standard_delivery_days: i64,
    pub express_delivery_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub low_stock_threshold: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,

    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
}

const DEV_JWT_SECRET: &str = "surprise-tokri-dev-secret";

// bcrypt accepts work factors 4 through 31
const MIN_PASSWORD_COST: u32 = 4;
const MAX_PASSWORD_COST: u32 = 31;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Reject configurations that would run insecurely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development && self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if self.pricing.tax_rate.is_sign_negative() {
            return Err(ConfigError::InvalidValue("PRICING_TAX_RATE"));
        }
        if self.filter.default_limit == 0 {
            return Err(ConfigError::InvalidValue("FILTER_DEFAULT_LIMIT"));
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("TOKRI_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_COST") {
            self.security.password_cost = v
                .parse::<u32>()
                .ok()
                .filter(|c| (MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(c))
                .unwrap_or(self.security.password_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let (Ok(email), Ok(password)) = (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            self.security.bootstrap_admin = Some(BootstrapAdmin { email, password });
        }

        // Pricing overrides
        if let Ok(v) = env::var("PRICING_FREE_SHIPPING_THRESHOLD") {
            self.pricing.free_shipping_threshold = v.parse().unwrap_or(self.pricing.free_shipping_threshold);
        }
        if let Ok(v) = env::var("PRICING_SHIPPING_FEE") {
            self.pricing.shipping_fee = v.parse().unwrap_or(self.pricing.shipping_fee);
        }
        if let Ok(v) = env::var("PRICING_EXPRESS_SURCHARGE") {
            self.pricing.express_surcharge = v.parse().unwrap_or(self.pricing.express_surcharge);
        }
        if let Ok(v) = env::var("PRICING_TAX_RATE") {
            self.pricing.tax_rate = v.parse().unwrap_or(self.pricing.tax_rate);
        }
        if let Ok(v) = env::var("PRICING_COUPONS") {
            match serde_json::from_str::<BTreeMap<String, CouponRule>>(&v) {
                Ok(coupons) => self.pricing.coupons = coupons,
                Err(e) => tracing::warn!("Ignoring PRICING_COUPONS: {}", e),
            }
        }

        // Inventory overrides
        if let Ok(v) = env::var("INVENTORY_LOW_STOCK_THRESHOLD") {
            self.inventory.low_stock_threshold = v.parse().unwrap_or(self.inventory.low_stock_threshold);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            filter: FilterConfig {
                max_limit: Some(100),
                default_limit: 12,
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                password_cost: MIN_PASSWORD_COST,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                bootstrap_admin: None,
            },
            pricing: PricingConfig::default(),
            inventory: InventoryConfig { low_stock_threshold: 5 },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.filter.max_limit = Some(50);
        config.filter.debug_logging = false;
        config.database.max_connections = 20;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24;
        config.security.password_cost = bcrypt::DEFAULT_COST;
        config.security.cors_origins = vec!["https://staging.surprisetokri.in".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.filter.max_limit = Some(50);
        config.filter.debug_logging = false;
        config.database.max_connections = 50;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24;
        config.security.password_cost = bcrypt::DEFAULT_COST;
        config.security.cors_origins = vec!["https://surprisetokri.in".to_string()];
        config
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let mut coupons = BTreeMap::new();
        coupons.insert("WELCOME10".to_string(), CouponRule { kind: CouponKind::Percent, value: Decimal::from(10) });
        coupons.insert("SURPRISE20".to_string(), CouponRule { kind: CouponKind::Percent, value: Decimal::from(20) });
        coupons.insert("FLAT100".to_string(), CouponRule { kind: CouponKind::Flat, value: Decimal::from(100) });
        coupons.insert("TOKRI50".to_string(), CouponRule { kind: CouponKind::Flat, value: Decimal::from(50) });

        Self {
            free_shipping_threshold: Decimal::from(500),
            shipping_fee: Decimal::from(50),
            express_surcharge: Decimal::from(100),
            tax_rate: Decimal::new(5, 2),
            coupons,
            standard_delivery_days: 5,
            express_delivery_days: 2,
        }
    }
}

// Global config for the binaries - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
