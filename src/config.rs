//! Layered application configuration.
//!
//! Priority, lowest first: built-in defaults, YAML file, `ENERGYWISE_*`
//! environment variables, explicit CLI flags.

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `ENERGYWISE_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "ENERGYWISE";

/// Config file picked up from the working directory when no path is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the bill-analysis and chatbot backend
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static`.
    pub static_dir: String,
    /// Request body cap, applied to file uploads.
    pub max_upload_bytes: usize,
}

/// Where the analysis and chatbot endpoints live.
///
/// Paths are joined onto `base_url`, so absolute paths replace any path
/// component of the base.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub message_path: String,
    pub upload_path: String,
    pub analyze_path: String,
    pub compare_path: String,
    /// Per-request timeout. Unset means requests may wait forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Idle widgets are evicted after this many seconds.
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("server.max_upload_bytes", 16 * 1024 * 1024)?
            .set_default("backend.base_url", "http://127.0.0.1:5000")?
            .set_default("backend.message_path", "/api/chatbot")?
            .set_default("backend.upload_path", "/api/chatbot/upload")?
            .set_default("backend.analyze_path", "/upload")?
            .set_default("backend.compare_path", "/compare")?
            .set_default("chat.idle_timeout_secs", 30 * 60)?
            .set_default("logging.json", false)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml)),
            None => builder.add_source(File::new(CWD_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        // Flags (and their plain env aliases handled by clap) win over everything.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Socket address string for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
