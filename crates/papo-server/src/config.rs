use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::TimeDelta;

use papo_core::SweepConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite file, or `:memory:` for a non-persistent store.
    pub db_path: String,
    pub sweep: SweepConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("PAPO_HOST", "0.0.0.0");
        let port: u16 = var("PAPO_PORT", "5000")
            .parse()
            .context("PAPO_PORT must be a port number")?;
        let db_path = var("PAPO_DB_PATH", "papo.db");

        let interval_secs: u64 = var("PAPO_SWEEP_INTERVAL_SECS", "15")
            .parse()
            .context("PAPO_SWEEP_INTERVAL_SECS must be a whole number of seconds")?;
        let ttl_secs: i64 = var("PAPO_PARTICIPANT_TTL_SECS", "10")
            .parse()
            .context("PAPO_PARTICIPANT_TTL_SECS must be a whole number of seconds")?;

        if interval_secs == 0 {
            return Err(anyhow!("PAPO_SWEEP_INTERVAL_SECS must be greater than zero"));
        }
        let ttl = TimeDelta::try_seconds(ttl_secs)
            .filter(|ttl| *ttl >= TimeDelta::zero())
            .ok_or_else(|| anyhow!("PAPO_PARTICIPANT_TTL_SECS out of range: {}", ttl_secs))?;

        Ok(Self {
            host,
            port,
            db_path,
            sweep: SweepConfig {
                interval: Duration::from_secs(interval_secs),
                ttl,
            },
        })
    }
}
