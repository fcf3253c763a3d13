// # sigdnsd - Verifier Daemon
//
// The sigdnsd daemon is the receiving end of the signed-update protocol.
// It is a THIN integration layer: it reads configuration from the
// environment, constructs the secret store and DNS provider clients, and
// hands every inbound request to the verifier pipeline in sigdns-core.
// No verification or DNS logic lives here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Protocol
// - `PARAMETER_NAME`: Secret store key holding the shared secret (required)
// - `TIMESTAMP_POLICY`: `reject` (default) or `server-clock` for requests
//   that omit the timestamp header
//
// ### DNS Record
// - `HOSTED_ZONE_ID`: Cloudflare zone to mutate (required)
// - `RECORD_NAME`: A record to upsert (required)
// - `RECORD_TTL`: Record TTL in seconds (default 300)
// - `CLOUDFLARE_API_TOKEN`: API token with Zone:DNS:Edit (required)
//
// ### Secret Store
// - `VAULT_ADDR`: Vault base address (required)
// - `VAULT_TOKEN`: Vault token (required)
// - `VAULT_MOUNT`: KV v2 mount point (default "secret")
// - `VAULT_FIELD`: Field holding the secret value (default "value")
//
// ### Server
// - `BIND_ADDR`: Listen address (default "0.0.0.0:8080")
// - `LOG_LEVEL`: trace, debug, info, warn, error (default "info")
//
// ## Example
//
// ```bash
// export PARAMETER_NAME=ddns-shared-secret
// export HOSTED_ZONE_ID=9de4e45cd0e5e92c9bad7b1f93f3c29c
// export RECORD_NAME=home.example.com
// export CLOUDFLARE_API_TOKEN=your_token
// export VAULT_ADDR=https://vault.internal:8200
// export VAULT_TOKEN=s.xxxx
//
// sigdnsd
// ```

mod server;

use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use sigdns_core::{RecordConfig, TimestampPolicy, Verifier, VerifierConfig};
use sigdns_provider_cloudflare::CloudflareProvider;
use sigdns_secret_vault::VaultSecretStore;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SigdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SigdnsExitCode> for ExitCode {
    fn from(code: SigdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    parameter_name: String,
    hosted_zone_id: String,
    record_name: String,
    record_ttl: u32,
    cloudflare_api_token: String,
    vault_addr: String,
    vault_token: String,
    vault_mount: Option<String>,
    vault_field: Option<String>,
    bind_addr: String,
    timestamp_policy: TimestampPolicy,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, sigdns_core::Error> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// The pre-flight check runs before anything else: every required key
    /// that is absent is reported in one pass, so a misconfigured unit
    /// fails with the complete list instead of one key at a time.
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, sigdns_core::Error> {
        const REQUIRED: &[&str] = &[
            "PARAMETER_NAME",
            "HOSTED_ZONE_ID",
            "RECORD_NAME",
            "CLOUDFLARE_API_TOKEN",
            "VAULT_ADDR",
            "VAULT_TOKEN",
        ];

        let missing: Vec<String> = REQUIRED
            .iter()
            .copied()
            .filter(|&key| lookup(key).is_none_or(|v| v.is_empty()))
            .map(String::from)
            .collect();

        if !missing.is_empty() {
            return Err(sigdns_core::Error::config_missing(missing));
        }

        let record_ttl = match lookup("RECORD_TTL") {
            Some(raw) => raw.parse().map_err(|_| {
                sigdns_core::Error::config(format!("RECORD_TTL must be an integer. Got: {}", raw))
            })?,
            None => sigdns_core::config::DEFAULT_RECORD_TTL,
        };

        let timestamp_policy = match lookup("TIMESTAMP_POLICY") {
            Some(raw) => raw.parse()?,
            None => TimestampPolicy::default(),
        };

        Ok(Self {
            parameter_name: lookup("PARAMETER_NAME").unwrap_or_default(),
            hosted_zone_id: lookup("HOSTED_ZONE_ID").unwrap_or_default(),
            record_name: lookup("RECORD_NAME").unwrap_or_default(),
            record_ttl,
            cloudflare_api_token: lookup("CLOUDFLARE_API_TOKEN").unwrap_or_default(),
            vault_addr: lookup("VAULT_ADDR").unwrap_or_default(),
            vault_token: lookup("VAULT_TOKEN").unwrap_or_default(),
            vault_mount: lookup("VAULT_MOUNT"),
            vault_field: lookup("VAULT_FIELD"),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            timestamp_policy,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), sigdns_core::Error> {
        sigdns_core::config::validate_domain_name(&self.record_name)?;

        if self.record_ttl == 0 {
            return Err(sigdns_core::Error::config("RECORD_TTL must be > 0"));
        }

        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(sigdns_core::Error::config(format!(
                "BIND_ADDR is not a valid socket address. Got: {}",
                self.bind_addr
            )));
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(sigdns_core::Error::config(format!(
                    "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                    other
                )));
            }
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SigdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SigdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SigdnsExitCode::ConfigError.into();
    }

    info!("Starting sigdnsd daemon");
    info!("Managing record: {}", config.record_name);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SigdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            SigdnsExitCode::RuntimeError
        } else {
            SigdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    // Construct the collaborators explicitly; the pipeline only ever sees
    // the injected trait objects
    let mut secrets = VaultSecretStore::new(&config.vault_addr, &config.vault_token)?;
    if let Some(ref mount) = config.vault_mount {
        secrets = secrets.with_mount(mount);
    }
    if let Some(ref field) = config.vault_field {
        secrets = secrets.with_field(field);
    }

    let provider = CloudflareProvider::new(&config.cloudflare_api_token, &config.hosted_zone_id)?;

    let verifier_config = VerifierConfig::new(
        &config.parameter_name,
        RecordConfig::new(&config.record_name).with_ttl(config.record_ttl),
    )
    .with_timestamp_policy(config.timestamp_policy);

    let verifier = Arc::new(Verifier::new(
        Arc::new(secrets),
        Arc::new(provider),
        verifier_config,
    )?);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let routes = server::routes(verifier);

    let (bound, serving) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());

    info!("Listening on {}", bound);
    serving.await;

    info!("Shutting down daemon");
    Ok(())
}

/// Resolve when a shutdown signal (SIGTERM, SIGINT) arrives
#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    info!("Received shutdown signal: {}", received);
}

/// Resolve when CTRL-C arrives (non-Unix fallback)
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
        return;
    }

    info!("Received shutdown signal: SIGINT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("PARAMETER_NAME", "ddns-shared-secret"),
            ("HOSTED_ZONE_ID", "zone1"),
            ("RECORD_NAME", "home.example.com"),
            ("CLOUDFLARE_API_TOKEN", "cf-token"),
            ("VAULT_ADDR", "http://127.0.0.1:8200"),
            ("VAULT_TOKEN", "root-token"),
        ])
    }

    fn lookup_in<'a>(vars: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        |key| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn full_environment_loads_with_defaults() {
        let vars = full_env();
        let config = Config::from_vars(lookup_in(&vars)).expect("config loads");

        assert_eq!(config.record_ttl, 300);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.timestamp_policy, TimestampPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn all_missing_keys_are_reported_at_once() {
        let mut vars = full_env();
        vars.remove("PARAMETER_NAME");
        vars.remove("VAULT_TOKEN");

        let err = Config::from_vars(lookup_in(&vars)).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("PARAMETER_NAME"));
        assert!(message.contains("VAULT_TOKEN"));
        assert!(!message.contains("RECORD_NAME"));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let mut vars = full_env();
        vars.insert("HOSTED_ZONE_ID", "");

        let err = Config::from_vars(lookup_in(&vars)).unwrap_err();
        assert!(err.to_string().contains("HOSTED_ZONE_ID"));
    }

    #[test]
    fn ttl_and_policy_overrides_apply() {
        let mut vars = full_env();
        vars.insert("RECORD_TTL", "60");
        vars.insert("TIMESTAMP_POLICY", "server-clock");

        let config = Config::from_vars(lookup_in(&vars)).expect("config loads");
        assert_eq!(config.record_ttl, 60);
        assert_eq!(config.timestamp_policy, TimestampPolicy::ServerClock);
    }

    #[test]
    fn bad_ttl_is_a_config_error() {
        let mut vars = full_env();
        vars.insert("RECORD_TTL", "five minutes");

        assert!(Config::from_vars(lookup_in(&vars)).is_err());
    }

    #[test]
    fn bad_record_name_fails_validation() {
        let mut vars = full_env();
        vars.insert("RECORD_NAME", "not a domain");

        let config = Config::from_vars(lookup_in(&vars)).expect("config loads");
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_bind_addr_fails_validation() {
        let mut vars = full_env();
        vars.insert("BIND_ADDR", "localhost");

        let config = Config::from_vars(lookup_in(&vars)).expect("config loads");
        assert!(config.validate().is_err());
    }
}
