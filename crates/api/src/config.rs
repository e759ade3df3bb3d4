use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub graphql: GraphQLConfig,
    pub docker: DockerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQLConfig {
    pub enable_graphiql: bool,
    pub max_depth: usize,
    pub max_complexity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DockerConfig {
    /// Daemon socket. Empty uses the platform default (or DOCKER_HOST).
    #[serde(default)]
    pub socket_path: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON file of initial documents, keyed by collection name.
    pub seed_file: Option<String>,
}

impl ApiConfig {
    /// Load configuration from api.toml and environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        // Compiled defaults fill any key the files and environment leave out
        let defaults = config::Config::try_from(&ApiConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder()
            .add_source(defaults);

        // 1. /etc/deployer/api.toml (container image)
        // 2. config/api.toml (local development)
        // 3. crates/api/config/api.toml (workspace root)
        let config_paths = [
            "/etc/deployer/api",
            "config/api",
            "crates/api/config/api",
        ];

        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // DEPLOYER_SERVER__BIND_ADDRESS, DEPLOYER_GRAPHQL__MAX_DEPTH, ...
        builder = builder.add_source(
            config::Environment::with_prefix("DEPLOYER")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.server.bind_address.parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be greater than zero");
        }

        if let Some(seed_file) = &self.storage.seed_file {
            let p = std::path::Path::new(seed_file);
            if !p.exists() {
                anyhow::bail!(
                    "Seed file not found: {} (resolved: {})",
                    seed_file,
                    p.canonicalize()
                        .map(|c| c.display().to_string())
                        .unwrap_or_else(|_| "unresolvable".to_string())
                );
            }
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 30,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            logging: LoggingConfig {
                level: "info,api=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
            graphql: GraphQLConfig {
                enable_graphiql: false,
                max_depth: 15,
                max_complexity: 1000,
            },
            docker: DockerConfig {
                socket_path: String::new(),
            },
            storage: StorageConfig::default(),
        }
    }
}
