use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::constants::HEALTH_CHECK_TIMEOUT_SECS;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Check if the Ollama binary is on PATH
pub fn is_installed() -> bool {
    which::which("ollama").is_ok()
}

/// Models installed on the Ollama server at `base_url`
pub async fn list_models(base_url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
        .build()?;

    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Ollama is not reachable at {}", base_url))?
        .error_for_status()?;

    let tags: TagsResponse = response
        .json()
        .await
        .context("Unexpected response from Ollama /api/tags")?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// Whether `model` is among `installed`. A tag without a version matches `:latest`.
pub fn has_model(installed: &[String], model: &str) -> bool {
    installed.iter().any(|name| {
        name == model
            || (!model.contains(':') && name.strip_suffix(":latest") == Some(model))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_has_model_matches_latest() {
        let installed = vec!["bge-m3:latest".to_string(), "llama3.2:3b".to_string()];
        assert!(has_model(&installed, "bge-m3"));
        assert!(has_model(&installed, "bge-m3:latest"));
        assert!(has_model(&installed, "llama3.2:3b"));
        assert!(!has_model(&installed, "llama3.2"));
        assert!(!has_model(&installed, "mistral"));
    }

    #[tokio::test]
    async fn test_list_models_reads_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    { "name": "llama3.2:3b", "size": 2019393189 },
                    { "name": "bge-m3:latest", "size": 1157672605 }
                ]
            })))
            .mount(&server)
            .await;

        let models = list_models(&server.uri()).await.unwrap();
        assert_eq!(models, vec!["llama3.2:3b", "bge-m3:latest"]);
    }

    #[tokio::test]
    async fn test_list_models_unreachable() {
        assert!(list_models("http://127.0.0.1:9").await.is_err());
    }
}
