//! Server configuration: command line and environment resolution.
//!
//! Settings are parsed with clap so every toggle is addressable both as a
//! flag and as an environment variable.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use actix_web::cookie::Key;
use clap::Parser;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

/// Session signing keys shorter than this are rejected.
const SESSION_KEY_MIN_LEN: usize = 64;

/// Command-line and environment options.
#[derive(Debug, Parser)]
#[command(name = "fest-backend", about = "Campus fest event management backend")]
pub struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// File holding the session signing key material (at least 64 bytes).
    #[arg(long, env = "SESSION_KEY_FILE")]
    pub session_key_file: Option<PathBuf>,

    /// Permit a generated, process-lifetime session key when no key file is
    /// available. Sessions do not survive a restart.
    #[arg(long, env = "SESSION_ALLOW_EPHEMERAL")]
    pub allow_ephemeral_key: bool,

    /// Whether session cookies are marked `Secure`.
    #[arg(long, env = "SESSION_COOKIE_SECURE", action = clap::ArgAction::Set, default_value_t = true)]
    pub cookie_secure: bool,

    /// Email for the seeded admin account.
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password for the seeded admin account.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

/// Bootstrap credentials for the seeded admin account.
pub struct AdminSeed {
    pub email: String,
    pub password: Zeroizing<String>,
}

/// Errors raised while resolving the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {value}: {source}")]
    InvalidBindAddr {
        value: String,
        source: AddrParseError,
    },
    #[error("failed to read session key at {path}: {source}")]
    UnreadableKey {
        path: String,
        source: std::io::Error,
    },
    #[error("session key at {path} is {len} bytes; at least {SESSION_KEY_MIN_LEN} required")]
    ShortKey { path: String, len: usize },
    #[error("no session key file configured; pass --allow-ephemeral-key to run without one")]
    MissingKey,
    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")]
    PartialAdminSeed,
}

/// Resolved configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) admin_seed: Option<AdminSeed>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .field("bind_addr", &self.bind_addr)
            .field("admin_seed", &self.admin_seed.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServerConfig {
    /// Validate the parsed options into a usable configuration.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let bind_addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse().map_err(
            |source: AddrParseError| ConfigError::InvalidBindAddr {
                value: format!("{}:{}", cli.host, cli.port),
                source,
            },
        )?;

        let key = match &cli.session_key_file {
            Some(path) => {
                let display = path.display().to_string();
                let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| {
                    ConfigError::UnreadableKey {
                        path: display.clone(),
                        source,
                    }
                })?);
                if bytes.len() < SESSION_KEY_MIN_LEN {
                    return Err(ConfigError::ShortKey {
                        path: display,
                        len: bytes.len(),
                    });
                }
                Key::derive_from(&bytes)
            }
            None if cli.allow_ephemeral_key || cfg!(debug_assertions) => {
                warn!("using ephemeral session key; sessions will not survive a restart");
                Key::generate()
            }
            None => return Err(ConfigError::MissingKey),
        };

        let admin_seed = match (cli.admin_email, cli.admin_password) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password: Zeroizing::new(password),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdminSeed),
        };

        Ok(Self {
            key,
            cookie_secure: cli.cookie_secure,
            bind_addr,
            admin_seed,
        })
    }

    /// The socket address the server will bind to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
