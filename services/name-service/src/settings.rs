use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{Context, anyhow};
use nm_chain_rpc::{DEFAULT_RECEIPT_POLL, DEFAULT_WALLET_RPC_URL};
use nm_session::SessionConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "namemint.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// JSON-RPC wallet endpoint.
    Rpc,
    /// In-process demo chain.
    Memory,
}

impl FromStr for GatewayMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rpc" => Ok(Self::Rpc),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown gateway mode '{other}', expected rpc or memory")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub bind: SocketAddr,
    pub wallet_rpc_url: String,
    pub receipt_poll: Duration,
    pub chain_poll: Duration,
    pub gateway: GatewayMode,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            wallet_rpc_url: DEFAULT_WALLET_RPC_URL.to_owned(),
            receipt_poll: DEFAULT_RECEIPT_POLL,
            chain_poll: Duration::from_secs(2),
            gateway: GatewayMode::Rpc,
        }
    }
}

#[derive(Debug)]
pub struct Settings {
    pub service: ServiceSettings,
    pub session: SessionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    service: ServiceSection,
    session: SessionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceSection {
    bind: Option<String>,
    wallet_rpc_url: Option<String>,
    receipt_poll_ms: Option<u64>,
    chain_poll_ms: Option<u64>,
    gateway: Option<GatewayMode>,
}

/// Defaults, then the TOML file, then `NAMEMINT_*` environment variables.
///
/// The file is `$NAMEMINT_CONFIG` when set (and must exist), otherwise
/// `namemint.toml` in the working directory if present.
pub fn load_settings() -> anyhow::Result<Settings> {
    let file = match std::env::var("NAMEMINT_CONFIG") {
        Ok(path) => Some(read_file(Path::new(&path))?),
        Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Some(read_file(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        Err(_) => None,
    };
    resolve(file, |key| std::env::var(key).ok())
}

fn read_file(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    parse_file(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

fn parse_file(raw: &str) -> anyhow::Result<FileConfig> {
    Ok(toml::from_str(raw)?)
}

fn resolve(
    file: Option<FileConfig>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let FileConfig {
        service: section,
        session,
    } = file.unwrap_or_default();
    let mut service = ServiceSettings::default();

    let bind = env("NAMEMINT_BIND").or(section.bind);
    if let Some(v) = bind {
        service.bind = v
            .parse()
            .with_context(|| format!("invalid bind address '{v}'"))?;
    }

    if let Some(v) = env("NAMEMINT_WALLET_RPC_URL").or(section.wallet_rpc_url) {
        service.wallet_rpc_url = v;
    }

    if let Some(ms) = millis(&env, "NAMEMINT_RECEIPT_POLL_MS")?.or(section.receipt_poll_ms) {
        service.receipt_poll = Duration::from_millis(ms);
    }
    if let Some(ms) = millis(&env, "NAMEMINT_CHAIN_POLL_MS")?.or(section.chain_poll_ms) {
        service.chain_poll = Duration::from_millis(ms);
    }

    match env("NAMEMINT_GATEWAY") {
        Some(v) => service.gateway = v.parse()?,
        None => {
            if let Some(mode) = section.gateway {
                service.gateway = mode;
            }
        }
    }

    if service.receipt_poll.is_zero() || service.chain_poll.is_zero() {
        return Err(anyhow!("poll intervals must be greater than zero"));
    }
    session.validate().context("invalid session configuration")?;

    Ok(Settings { service, session })
}

fn millis(env: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<u64>> {
    env(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .with_context(|| format!("{key} must be a number of milliseconds, got '{v}'"))
        })
        .transpose()
}

/// Where the config came from, for the startup log line.
pub fn config_source() -> Option<PathBuf> {
    std::env::var("NAMEMINT_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        })
}
