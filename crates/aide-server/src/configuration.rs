use crate::error::{to_env_var, ConfigError};
use aide::agent::DEFAULT_MAX_FUNCTION_CALLS;
use aide::graph::DEFAULT_GRAPH_ENDPOINT;
use aide::providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL};
use config::{Config, Environment};
use serde::Deserialize;
use std::fmt;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig::new(self.api_key)
            .with_host(self.host)
            .with_model(self.model)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("host", &self.host)
            .field("api_key", &"***")
            .field("model", &self.model)
            .finish()
    }
}

/// The bot's Entra ID app registration, used for the on-behalf-of exchange
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Space separated Graph scopes requested for the user
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

impl AuthSettings {
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("authority_host", &self.authority_host)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_graph_endpoint")]
    pub endpoint: String,
    /// Time zone Graph reports and creates calendar events in
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            endpoint: default_graph_endpoint(),
            time_zone: default_time_zone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_function_calls")]
    pub max_function_calls: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_function_calls: default_max_function_calls(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", default_openai_host())?
            .set_default("provider.model", default_model())?
            .set_default("auth.authority_host", default_authority_host())?
            .set_default("auth.scopes", default_scopes())?
            .set_default("graph.endpoint", default_graph_endpoint())?
            .set_default("graph.time_zone", default_time_zone())?
            .set_default("agent.max_function_calls", default_max_function_calls() as i64)?
            .add_source(
                Environment::with_prefix("AIDE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Missing fields surface either as a serde message or as NotFound
                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3978
}

fn default_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_scopes() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_graph_endpoint() -> String {
    DEFAULT_GRAPH_ENDPOINT.to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_max_function_calls() -> usize {
    DEFAULT_MAX_FUNCTION_CALLS
}
