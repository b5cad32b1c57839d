use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use tokio::time::Duration;

/// Default base URL of the downstream appointment API used when
/// `APPOINTMENT_API_BASE_URL` is not set.
pub const DEFAULT_APPOINTMENT_API_BASE_URL: &str = "https://service.mcpgod.com.br/api";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8080)]
    pub port: u16,

    /// The base URL of the downstream appointment API that tool calls are relayed to
    #[arg(long, env, default_value = DEFAULT_APPOINTMENT_API_BASE_URL)]
    appointment_api_base_url: String,

    /// Maximum time in milliseconds an SSE connection may stay idle before the
    /// health-check sweep closes it
    #[arg(long, env, default_value_t = 300_000)]
    pub sse_timeout_millis: u64,

    /// Interval in milliseconds between heartbeat events pushed to every open
    /// SSE connection. Set to 0 to disable heartbeats.
    #[arg(long, env, default_value_t = 30_000)]
    pub heartbeat_interval_millis: u64,

    /// Flag to completely enable or disable SSE heartbeats
    #[arg(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub heartbeat_enabled: bool,

    /// Interval in milliseconds between health-check sweeps that close idle
    /// SSE connections
    #[arg(long, env, default_value_t = 60_000)]
    pub health_check_interval_millis: u64,

    /// Maximum age in minutes of an IP-to-credential affinity entry before the
    /// cleanup sweep purges it
    #[arg(long, env, default_value_t = 30)]
    pub affinity_max_age_minutes: u64,

    /// Interval in milliseconds between affinity cache cleanup sweeps
    #[arg(long, env, default_value_t = 600_000)]
    pub affinity_cleanup_interval_millis: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        // Parse with no CLI arguments so tests and embedding callers get the
        // documented defaults plus any environment overrides.
        Config::parse_from::<[&str; 1], &str>(["mcp_calendar_server"])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn appointment_api_base_url(&self) -> &str {
        &self.appointment_api_base_url
    }

    pub fn set_appointment_api_base_url(mut self, base_url: String) -> Self {
        self.appointment_api_base_url = base_url;
        self
    }

    /// Idle timeout after which an SSE connection is considered dead.
    pub fn sse_timeout(&self) -> Duration {
        Duration::from_millis(self.sse_timeout_millis)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_millis)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_millis)
    }

    pub fn affinity_max_age(&self) -> Duration {
        Duration::from_secs(self.affinity_max_age_minutes * 60)
    }

    pub fn affinity_cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.affinity_cleanup_interval_millis)
    }

    /// Heartbeats run only when the flag is on and the interval is non-zero.
    pub fn heartbeats_active(&self) -> bool {
        self.heartbeat_enabled && self.heartbeat_interval_millis > 0
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
