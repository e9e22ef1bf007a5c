/// Connection and editor settings.
///
/// Every field can be given as a flag or through the environment.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// Base URL of the model service, without a trailing slash.
    #[arg(long, env = "GRAPH_BUILDER_API_URL", default_value = "http://localhost:3000/api")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "GRAPH_BUILDER_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Undo entries kept per session.
    #[arg(long, env = "GRAPH_BUILDER_HISTORY_LIMIT", default_value_t = 100)]
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 10,
            history_limit: 100,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
