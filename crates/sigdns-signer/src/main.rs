// # sigdns-signer - Update Trigger
//
// One-shot client side of the signed-update protocol, meant to run from
// cron or a systemd timer. Each invocation fetches the shared secret,
// signs the current time, POSTs the signed request to the verifier
// endpoint and exits.
//
// There is no retry: the next scheduled run is the retry. A rejected
// response is logged but does not fail the process; only configuration
// and secret-store problems do.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `PARAMETER_NAME`: Secret store key holding the shared secret (required)
// - `LAMBDA_ENDPOINT`: Verifier endpoint URL (required)
// - `VAULT_ADDR`: Vault base address (required)
// - `VAULT_TOKEN`: Vault token (required)
// - `VAULT_MOUNT`: KV v2 mount point (default "secret")
// - `VAULT_FIELD`: Field holding the secret value (default "value")
// - `HTTP_TIMEOUT_SECS`: Timeout for the endpoint call (default 30)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default "info")
//
// ## Example
//
// ```bash
// export PARAMETER_NAME=ddns-shared-secret
// export LAMBDA_ENDPOINT=https://ddns.example.com/
// export VAULT_ADDR=https://vault.internal:8200
// export VAULT_TOKEN=s.xxxx
//
// sigdns-signer
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use sigdns_core::protocol::{self, SignedRequest};
use sigdns_core::traits::SecretStore;
use sigdns_secret_vault::VaultSecretStore;

/// Default timeout for the endpoint call (seconds)
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum SignerExitCode {
    /// The trigger ran (whatever the endpoint answered)
    Done = 0,
    /// Configuration error, caught before any network call
    ConfigError = 1,
    /// Runtime error (secret store or transport failure)
    RuntimeError = 2,
}

impl From<SignerExitCode> for ExitCode {
    fn from(code: SignerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    parameter_name: String,
    endpoint: String,
    vault_addr: String,
    vault_token: String,
    vault_mount: Option<String>,
    vault_field: Option<String>,
    http_timeout: Duration,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, sigdns_core::Error> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// The pre-flight check reports every missing required key in one
    /// pass, before anything with a side effect runs.
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, sigdns_core::Error> {
        const REQUIRED: &[&str] = &[
            "PARAMETER_NAME",
            "LAMBDA_ENDPOINT",
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

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    sigdns_core::Error::config(format!(
                        "HTTP_TIMEOUT_SECS must be an integer. Got: {}",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            parameter_name: lookup("PARAMETER_NAME").unwrap_or_default(),
            endpoint: lookup("LAMBDA_ENDPOINT").unwrap_or_default(),
            vault_addr: lookup("VAULT_ADDR").unwrap_or_default(),
            vault_token: lookup("VAULT_TOKEN").unwrap_or_default(),
            vault_mount: lookup("VAULT_MOUNT"),
            vault_field: lookup("VAULT_FIELD"),
            http_timeout,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), sigdns_core::Error> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(sigdns_core::Error::config(format!(
                "LAMBDA_ENDPOINT must use HTTP or HTTPS scheme. Got: {}",
                self.endpoint
            )));
        }

        if self.http_timeout.is_zero() {
            return Err(sigdns_core::Error::config("HTTP_TIMEOUT_SECS must be > 0"));
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(sigdns_core::Error::config(format!(
                "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                other
            ))),
        }
    }
}

fn main() -> ExitCode {
    // Fail fast on configuration, before any network call
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SignerExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SignerExitCode::ConfigError.into();
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
        return SignerExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SignerExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => SignerExitCode::Done,
            Err(e) => {
                error!("Trigger failed: {}", e);
                SignerExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Construct the collaborators and fire the trigger once
async fn run(config: Config) -> Result<()> {
    let mut store = VaultSecretStore::new(&config.vault_addr, &config.vault_token)?;
    if let Some(ref mount) = config.vault_mount {
        store = store.with_mount(mount);
    }
    if let Some(ref field) = config.vault_field {
        store = store.with_field(field);
    }

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    trigger_update(&store, &client, &config.parameter_name, &config.endpoint).await
}

/// One signed trigger: fetch the secret, sign the current time, POST
///
/// A secret-store or transport failure propagates to the caller. A
/// non-2xx answer from the endpoint is logged and swallowed: the next
/// scheduled run is the retry, and the process exit code stays 0.
async fn trigger_update(
    store: &dyn SecretStore,
    client: &reqwest::Client,
    parameter_name: &str,
    endpoint: &str,
) -> Result<()> {
    let secret = store.fetch_secret(parameter_name).await?;
    let request = SignedRequest::over_current_time(secret.as_bytes())?;

    info!("Triggering update at {}", endpoint);

    let response = client
        .post(endpoint)
        .header(protocol::SIGNATURE_HEADER, &request.signature)
        .header(protocol::TIMESTAMP_HEADER, &request.timestamp)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        info!("Endpoint accepted the update ({})", status);
    } else {
        error!("Endpoint rejected the update: {}", status);
    }

    Ok(())
}
