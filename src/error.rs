#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TrialScoutError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "API key required: {api} requires {env_var} environment variable.\n\nTo set:\n  export {env_var}=your-key\n\nMore info: {docs_url}"
    )]
    ApiKeyRequired {
        api: String,
        env_var: String,
        docs_url: String,
    },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::TrialScoutError;

    #[test]
    fn api_key_required_display_includes_env_var_and_docs() {
        let err = TrialScoutError::ApiKeyRequired {
            api: "openai".to_string(),
            env_var: "OPENAI_API_KEY".to_string(),
            docs_url: "https://platform.openai.com/api-keys".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(msg.contains("https://platform.openai.com/api-keys"));
    }

    #[test]
    fn api_error_display_includes_api_name() {
        let err = TrialScoutError::Api {
            api: "ctgov-classic".to_string(),
            message: "HTTP 503".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("ctgov-classic"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn invalid_argument_display() {
        let err = TrialScoutError::InvalidArgument("Transcript is required".into());
        assert!(err.to_string().contains("Transcript is required"));
    }
}
