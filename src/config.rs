//! Runtime configuration
//!
//! Every value can come from a CLI flag or an environment variable; the
//! flag wins when both are set. Durations accept humantime syntax
//! (`500ms`, `1s`, `720h`).

use std::net::ToSocketAddrs;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use rand::RngCore;

#[derive(Debug, Clone, Parser)]
#[command(name = "pointbook", about = "Loyalty-point ledger service")]
pub struct AppConfig {
    /// Address and port to serve the HTTP API on
    #[arg(
        short = 'a',
        long = "address",
        env = "RUN_ADDRESS",
        default_value = "0.0.0.0:8080"
    )]
    pub run_address: String,

    /// PostgreSQL connection string
    #[arg(short = 'd', long = "database-uri", env = "DATABASE_URI")]
    pub database_uri: String,

    /// Base URL of the accrual oracle
    #[arg(short = 'r', long = "accrual-address", env = "ACCRUAL_SYSTEM_ADDRESS")]
    pub accrual_address: String,

    /// Base delay between accrual oracle polls
    #[arg(
        short = 'p',
        long = "accrual-poll-interval",
        env = "ACCRUAL_SYSTEM_POLL_INTERVAL",
        default_value = "500ms",
        value_parser = humantime::parse_duration
    )]
    pub accrual_poll_interval: Duration,

    /// Per-request deadline for accrual oracle calls
    #[arg(
        short = 'm',
        long = "accrual-timeout",
        env = "ACCRUAL_SYSTEM_TIMEOUT",
        default_value = "1s",
        value_parser = humantime::parse_duration
    )]
    pub accrual_timeout: Duration,

    /// Access-token lifetime
    #[arg(
        short = 't',
        long = "auth-ttl",
        env = "AUTH_TTL",
        default_value = "720h",
        value_parser = humantime::parse_duration
    )]
    pub auth_ttl: Duration,

    /// Token signing secret; a random one is generated when unset
    #[arg(long = "auth-secret", env = "AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Token signing algorithm
    #[arg(long = "auth-alg", env = "AUTH_ALG", default_value = "HS512")]
    pub auth_alg: String,
}

impl AppConfig {
    /// Parse from the process arguments and environment, then validate.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Self::parse();
        cfg.finalize()?;
        Ok(cfg)
    }

    /// Validate the composed configuration and fill the generated secret.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        if self.run_address.is_empty() {
            bail!("empty server address");
        }
        self.run_address
            .to_socket_addrs()
            .context("invalid server address")?;
        if self.database_uri.is_empty() {
            bail!("empty database uri");
        }
        if self.auth_secret.as_deref().is_none_or(str::is_empty) {
            self.auth_secret = Some(random_secret(64));
        }
        Ok(())
    }

    /// The signing secret. Only valid after [`AppConfig::finalize`].
    pub fn auth_secret(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or_default()
    }
}

/// Hex-encoded random secret of `bytes` entropy bytes.
fn random_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["pointbook"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).expect("parse failed")
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["-d", "postgres://localhost/ledger", "-r", "http://oracle"]);
        assert_eq!(cfg.run_address, "0.0.0.0:8080");
        assert_eq!(cfg.accrual_poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.accrual_timeout, Duration::from_secs(1));
        assert_eq!(cfg.auth_ttl, Duration::from_secs(720 * 3600));
        assert_eq!(cfg.auth_alg, "HS512");
    }

    #[test]
    fn test_flags_override_defaults() {
        let cfg = parse(&[
            "-a",
            "127.0.0.1:9999",
            "-d",
            "postgres://localhost/ledger",
            "-r",
            "http://oracle",
            "-p",
            "2s",
            "-m",
            "250ms",
            "-t",
            "1h",
        ]);
        assert_eq!(cfg.run_address, "127.0.0.1:9999");
        assert_eq!(cfg.accrual_poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.accrual_timeout, Duration::from_millis(250));
        assert_eq!(cfg.auth_ttl, Duration::from_secs(3600));
    }

    fn base_config() -> AppConfig {
        AppConfig {
            run_address: "0.0.0.0:8080".to_string(),
            database_uri: "postgres://localhost/ledger".to_string(),
            accrual_address: "http://oracle".to_string(),
            accrual_poll_interval: Duration::from_millis(500),
            accrual_timeout: Duration::from_secs(1),
            auth_ttl: Duration::from_secs(720 * 3600),
            auth_secret: None,
            auth_alg: "HS512".to_string(),
        }
    }

    #[test]
    fn test_finalize_generates_secret() {
        let mut cfg = base_config();
        cfg.finalize().expect("finalize failed");
        // 64 random bytes, hex-encoded
        assert_eq!(cfg.auth_secret().len(), 128);
    }

    #[test]
    fn test_finalize_keeps_configured_secret() {
        let mut cfg = base_config();
        cfg.auth_secret = Some("configured".to_string());
        cfg.finalize().expect("finalize failed");
        assert_eq!(cfg.auth_secret(), "configured");
    }

    #[test]
    fn test_finalize_rejects_bad_address() {
        let mut cfg = base_config();
        cfg.run_address = "not-an-address".to_string();
        assert!(cfg.finalize().is_err());

        cfg.run_address = String::new();
        assert!(cfg.finalize().is_err());
    }
}
