use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{get_config_dir, init_config, Config},
    models::strip_provider,
    ollama::{has_model, is_installed as is_ollama_installed, list_models as get_ollama_models},
    vectorstore::{QdrantStore, VectorStore},
};

use super::Commands;

/// Handle the subcommands that do not need the document pipeline.
/// Returns false when the caller should continue (chat, ingest, ask).
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing docchat configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::Status => {
            show_status(config).await?;
            Ok(true)
        }
        Commands::Chat | Commands::Ingest { .. } | Commands::Ask { .. } => Ok(false),
    }
}

/// Show version information
pub fn show_version() {
    println!("docchat v{}", env!("CARGO_PKG_VERSION"));
    println!("   Chat with your PDF documents using local models and Qdrant");
}

/// Show status of all dependencies
async fn show_status(config: &Config) -> Result<()> {
    show_version();
    println!();
    println!("{}", "Status:".bold());

    // Ollama
    let ollama_url = config.ollama.base_url();
    match get_ollama_models(&ollama_url).await {
        Ok(models) => {
            println!(
                "  {} Ollama: Running at {} ({} models installed)",
                "[OK]".green(),
                ollama_url,
                models.len()
            );
            for wanted in config.ollama_models() {
                let name = strip_provider(wanted);
                if has_model(&models, name) {
                    println!("      • {} {}", name, "installed".green());
                } else {
                    println!("      • {} {} (ollama pull {})", name, "missing".yellow(), name);
                }
            }
        }
        Err(_) if is_ollama_installed() => {
            println!(
                "  {} Ollama: Installed but not running at {} (run `ollama serve`)",
                "[WARNING]".yellow(),
                ollama_url
            );
        }
        Err(_) => println!("  {} Ollama: Not installed", "[ERROR]".red()),
    }

    // Qdrant
    let store = QdrantStore::from_config(&config.qdrant)?;
    if store.health_check().await {
        match store.collection_vector_size().await {
            Ok(Some(size)) => println!(
                "  {} Qdrant: Running at {} (collection '{}', {} dims)",
                "[OK]".green(),
                config.qdrant.url,
                store.collection(),
                size
            ),
            _ => println!(
                "  {} Qdrant: Running at {} (collection '{}' not created yet)",
                "[OK]".green(),
                config.qdrant.url,
                store.collection()
            ),
        }
    } else {
        println!(
            "  {} Qdrant: Not reachable at {}",
            "[ERROR]".red(),
            config.qdrant.url
        );
    }

    // Configuration
    match get_config_dir() {
        Ok(dir) => {
            let config_path = dir.join("config.toml");
            if config_path.exists() {
                println!("  {} Configuration: {}", "[OK]".green(), config_path.display());
            } else {
                println!(
                    "  {} Configuration: Not found (using defaults, run `docchat init`)",
                    "[WARNING]".yellow()
                );
            }
        }
        Err(e) => println!("  {} Configuration: {}", "[ERROR]".red(), e),
    }

    // Container runtime for Qdrant
    if which::which("podman").is_ok() {
        println!("  {} Container Runtime: Podman", "[OK]".green());
    } else if which::which("docker").is_ok() {
        println!("  {} Container Runtime: Docker", "[OK]".green());
    } else {
        println!(
            "  {} Container Runtime: Not found (needed to run Qdrant locally)",
            "[WARNING]".yellow()
        );
    }

    println!();
    println!("  Models:");
    println!("    • Chat: {}", config.llm.model);
    println!(
        "    • Embeddings: {} ({:?})",
        config.embeddings.model, config.embeddings.provider
    );
    println!();
    Ok(())
}
