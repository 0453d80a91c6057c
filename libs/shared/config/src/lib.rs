use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_AVAILABILITY_HORIZON_DAYS: u32 = 14;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub default_slot_duration_minutes: u32,
    pub availability_horizon_days: u32,
    pub port: u16,
}

fn required_var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn numeric_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={} is not a valid number, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required_var("SUPABASE_URL"),
            supabase_anon_key: required_var("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: required_var("SUPABASE_JWT_SECRET"),
            default_slot_duration_minutes: numeric_var(
                "DEFAULT_SLOT_DURATION_MINUTES",
                DEFAULT_SLOT_DURATION_MINUTES,
            ),
            availability_horizon_days: numeric_var(
                "AVAILABILITY_HORIZON_DAYS",
                DEFAULT_AVAILABILITY_HORIZON_DAYS,
            ),
            port: numeric_var("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}
