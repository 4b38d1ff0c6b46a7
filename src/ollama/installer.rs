use anyhow::Result;
use colored::Colorize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use super::detector::{self, has_model};
use super::guide;
use crate::models::strip_provider;

/// Pull an Ollama model, streaming `ollama pull` progress to the terminal
pub async fn install_model(model: &str) -> Result<()> {
    println!("[DOWNLOADING] Pulling {} model...", model.cyan());

    let status = Command::new("ollama")
        .arg("pull")
        .arg(model)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await?;

    if !status.success() {
        anyhow::bail!("Failed to install {} model", model);
    }

    info!(model, "Pulled Ollama model");
    Ok(())
}

/// Make sure every model in `models` is available on the Ollama server,
/// pulling missing ones unless `no_auto_install` is set
pub async fn ensure_models(base_url: &str, models: &[&str], no_auto_install: bool) -> Result<()> {
    let installed = match detector::list_models(base_url).await {
        Ok(installed) => installed,
        Err(e) => {
            if !detector::is_installed() {
                guide::detect_and_guide();
                anyhow::bail!("Ollama is not installed");
            }
            return Err(e.context("Start the server with `ollama serve`"));
        }
    };

    for model in models {
        let model = strip_provider(model);
        if has_model(&installed, model) {
            continue;
        }

        if no_auto_install {
            println!("[WARNING] Model '{}' not found locally.", model);
            println!("   Run: ollama pull {}", model);
            anyhow::bail!("Model '{}' is not installed", model);
        }

        println!("[SETUP] Model '{}' not found locally, installing it now.", model);
        println!("   This is a one-time download. Use --no-auto-install to skip.\n");
        install_model(model).await?;
        println!("\n[OK] {} installed successfully!", model);
    }

    Ok(())
}

/// Single-model form of [`ensure_models`]
pub async fn ensure_model(base_url: &str, model: &str, no_auto_install: bool) -> Result<()> {
    ensure_models(base_url, &[model], no_auto_install).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(models: &[&str]) -> MockServer {
        let server = MockServer::start().await;
        let entries: Vec<_> = models.iter().map(|m| json!({ "name": m })).collect();
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": entries })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_present_models_need_nothing() {
        let server = server_with(&["llama3.2:3b", "bge-m3:latest"]).await;
        ensure_models(&server.uri(), &["ollama/llama3.2:3b", "bge-m3"], true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_model_without_auto_install_fails() {
        let server = server_with(&["llama3.2:3b"]).await;
        let err = ensure_model(&server.uri(), "bge-m3", true).await.unwrap_err();
        assert!(err.to_string().contains("bge-m3"));
    }
}
