use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use btleplug::api::BDAddr;
use clap::Parser;

use crate::constants::{UnitPreference, DEFAULT_ADDRESS, STABILIZATION_CHECK_INTERVAL};
use crate::error::{Result, ScaleError};
use crate::poll::RetryPolicy;
use crate::session::SessionSettings;

/// Records readings from a QN-protocol bluetooth scale
#[derive(Parser, Debug, Clone)]
#[command(name = "rust-qn-scale", version, about, long_about = None)]
pub struct Cli {
    /// Bluetooth address of the scale
    #[arg(long, env = "QN_SCALE_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Unit shown on the scale's display
    #[arg(long, env = "QN_SCALE_UNIT", value_enum, default_value_t = UnitPreference::Pounds)]
    pub unit: UnitPreference,

    /// Seconds to wait for a stable reading
    #[arg(long, env = "QN_SCALE_STABILIZATION_TIMEOUT", default_value_t = 10)]
    pub stabilization_timeout: u64,

    /// Seconds to wait after a successful reading
    #[arg(long, env = "QN_SCALE_POLL_INTERVAL", default_value_t = 10)]
    pub poll_interval: u64,

    /// Seconds to wait after an unexpected error
    #[arg(long, env = "QN_SCALE_RETRY_COOLDOWN", default_value_t = 10)]
    pub retry_cooldown: u64,

    /// Seconds to scan for the scale before giving up on an attempt
    #[arg(long, env = "QN_SCALE_DISCOVERY_TIMEOUT", default_value_t = 10)]
    pub discovery_timeout: u64,

    /// Seconds each result sink may take
    #[arg(long, env = "QN_SCALE_SINK_TIMEOUT", default_value_t = 5)]
    pub sink_timeout: u64,

    /// Record readings to this SQLite database
    #[arg(short, long, env = "QN_SCALE_SQLITE_PATH", value_name = "FILE")]
    pub sqlite_path: Option<PathBuf>,

    /// File containing a Discord webhook URL to post readings to
    #[arg(short, long, env = "QN_SCALE_DISCORD_WEBHOOK_FILE", value_name = "FILE")]
    pub discord_webhook_file: Option<PathBuf>,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionSettings,
    pub retry: RetryPolicy,
    pub discovery_timeout: Duration,
    pub sink_timeout: Duration,
    pub sqlite_path: Option<PathBuf>,
    pub discord_webhook_file: Option<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        BDAddr::from_str(&cli.address).map_err(|_| ScaleError::InvalidAddress(cli.address.clone()))?;
        if cli.stabilization_timeout == 0 {
            return Err(ScaleError::Other(
                "stabilization timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            session: SessionSettings {
                address: cli.address.clone(),
                unit: cli.unit,
                stabilization_timeout: Duration::from_secs(cli.stabilization_timeout),
                check_interval: STABILIZATION_CHECK_INTERVAL,
            },
            retry: RetryPolicy {
                poll_interval: Duration::from_secs(cli.poll_interval),
                retry_cooldown: Duration::from_secs(cli.retry_cooldown),
            },
            discovery_timeout: Duration::from_secs(cli.discovery_timeout),
            sink_timeout: Duration::from_secs(cli.sink_timeout),
            sqlite_path: cli.sqlite_path.clone(),
            discord_webhook_file: cli.discord_webhook_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_device_timings() {
        let cli = Cli::try_parse_from(["rust-qn-scale"]).unwrap();
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.session.address, DEFAULT_ADDRESS);
        assert_eq!(config.session.unit, UnitPreference::Pounds);
        assert_eq!(config.session.stabilization_timeout, Duration::from_secs(10));
        assert_eq!(config.session.check_interval, Duration::from_secs(1));
        assert_eq!(config.retry.poll_interval, Duration::from_secs(10));
        assert_eq!(config.retry.retry_cooldown, Duration::from_secs(10));
        assert!(config.sqlite_path.is_none());
        assert!(config.discord_webhook_file.is_none());
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "rust-qn-scale",
            "--address",
            "AA:BB:CC:DD:EE:FF",
            "--unit",
            "kilograms",
            "--stabilization-timeout",
            "20",
            "-s",
            "weights.db",
        ])
        .unwrap();
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.session.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(config.session.unit, UnitPreference::Kilograms);
        assert_eq!(config.session.stabilization_timeout, Duration::from_secs(20));
        assert_eq!(config.sqlite_path, Some(PathBuf::from("weights.db")));
    }

    #[test]
    fn rejects_bad_address() {
        let cli = Cli::try_parse_from(["rust-qn-scale", "--address", "not-an-address"]).unwrap();
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ScaleError::InvalidAddress(_))
        ));
    }

    #[test]
    fn rejects_zero_stabilization_timeout() {
        let cli =
            Cli::try_parse_from(["rust-qn-scale", "--stabilization-timeout", "0"]).unwrap();
        assert!(Config::from_cli(&cli).is_err());
    }
}
