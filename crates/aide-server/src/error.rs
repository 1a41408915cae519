use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Failure to turn the user's SSO token into a Graph credential
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Token exchange rejected ({status}): {error}: {description}")]
    Rejected {
        status: StatusCode,
        error: String,
        description: String,
    },
    #[error("Token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

// Required fields and the settings section they live in
const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("api_key", "provider"),
    ("tenant_id", "auth"),
    ("client_id", "auth"),
    ("client_secret", "auth"),
];

/// Environment variable for a settings field, e.g. `auth.client_id` -> `AIDE_AUTH__CLIENT_ID`.
/// Bare field names of required settings are resolved to their section.
pub fn to_env_var(field_path: &str) -> String {
    let path = match REQUIRED_FIELDS.iter().find(|(field, _)| *field == field_path) {
        Some((field, section)) => format!("{}.{}", section, field),
        None => field_path.to_string(),
    };
    format!("AIDE_{}", path.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("server.port"), "AIDE_SERVER__PORT");
        assert_eq!(to_env_var("api_key"), "AIDE_PROVIDER__API_KEY");
        assert_eq!(to_env_var("client_secret"), "AIDE_AUTH__CLIENT_SECRET");
        assert_eq!(to_env_var("auth"), "AIDE_AUTH");
    }
}
