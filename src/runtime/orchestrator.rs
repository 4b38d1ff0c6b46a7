use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::{
    app::{get_data_dir, load_config, load_config_file, Config, EmbeddingProvider},
    cli::{handle_command, Cli, Commands, OutputFormat},
    ollama::{ensure_model, ensure_models, qdrant_guide},
    rag::{ChatbotManager, EmbeddingsManager},
    tui::{run_ui, App, AppServices, ChatbotFactory},
    utils::{init_file_logger, init_logger, log_info, log_progress},
    vectorstore::{QdrantStore, VectorStore},
};

use super::non_interactive::{format_result, NonInteractiveRunner};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = if let Some(config_path) = &cli.config {
            load_config_file(config_path)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("⚠️  Failed to load config: {}. Using defaults.", e);
                    Config::default()
                }
            }
        };

        apply_overrides(&mut config, &cli);
        config.validate().context("Invalid configuration")?;

        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        match self.cli.command.clone() {
            None | Some(Commands::Chat) => self.run_chat().await,
            Some(command) => {
                init_logger(self.cli.verbose);

                if handle_command(&command, &self.config).await? {
                    return Ok(());
                }

                match command {
                    Commands::Ingest { pdf } => self.run_ingest(&pdf).await,
                    Commands::Ask {
                        question,
                        output_format,
                    } => self.run_ask(question, output_format).await,
                    _ => Ok(()),
                }
            }
        }
    }

    async fn run_ingest(&self, pdf: &Path) -> Result<()> {
        // Ingest only needs the embedding model
        if self.config.embeddings.provider == EmbeddingProvider::Ollama {
            ensure_model(
                &self.config.ollama.base_url(),
                &self.config.embeddings.model,
                self.cli.no_auto_install,
            )
            .await?;
        }
        self.ensure_qdrant().await?;

        let runner = NonInteractiveRunner::new(self.config.clone());
        let result = runner.ingest(pdf).await;

        if result.success {
            println!("{} {}", "✅".green(), result.message);
            Ok(())
        } else {
            anyhow::bail!(result.message)
        }
    }

    async fn run_ask(&self, question: String, format: OutputFormat) -> Result<()> {
        ensure_models(
            &self.config.ollama.base_url(),
            &self.config.ollama_models(),
            self.cli.no_auto_install,
        )
        .await?;

        let runner = NonInteractiveRunner::new(self.config.clone());
        let result = runner.ask(question).await;
        println!("{}", format_result(&result, format));

        if !result.errors.is_empty() {
            anyhow::bail!("Question could not be answered");
        }
        Ok(())
    }

    async fn run_chat(self) -> Result<()> {
        // The TUI owns the terminal, so logs go to a file
        let log_path = get_data_dir()?.join("docchat.log");
        if let Err(e) = init_file_logger(&log_path, self.cli.verbose) {
            eprintln!("⚠️  Failed to open log file {}: {}", log_path.display(), e);
        }

        println!(
            "📄 Starting docchat with model: {}",
            self.config.llm.model.green()
        );

        log_progress(1, 3, "Checking Ollama models");
        ensure_models(
            &self.config.ollama.base_url(),
            &self.config.ollama_models(),
            self.cli.no_auto_install,
        )
        .await?;

        log_progress(2, 3, format!("Connecting to Qdrant at {}", self.config.qdrant.url));
        self.ensure_qdrant().await?;
        let embeddings = EmbeddingsManager::from_config(&self.config)
            .context("Failed to initialize the embeddings pipeline")?;

        let chatbot_config = self.config.clone();
        let chatbot_factory: ChatbotFactory =
            Arc::new(move || ChatbotManager::from_config(&chatbot_config));

        let services = AppServices {
            embeddings: Arc::new(embeddings),
            chatbot_factory,
            upload_path: self.config.ingest.resolved_upload_path()?,
            max_file_size: self.config.ingest.max_file_size,
            contact_email: self.config.ui.contact_email.clone(),
            llm_model: self.config.llm.model.clone(),
            embedding_model: self.config.embeddings.model.clone(),
        };

        log_progress(3, 3, "Starting interface");
        log_info(
            "📄",
            format!(
                "docchat ready (chat: {}, embeddings: {}, collection: {})",
                self.config.llm.model, self.config.embeddings.model, self.config.qdrant.collection
            ),
        );

        let app = App::new(services, self.config.ui.show_sidebar);
        run_ui(app).await
    }

    async fn ensure_qdrant(&self) -> Result<()> {
        let store = QdrantStore::from_config(&self.config.qdrant)?;
        if !store.health_check().await {
            qdrant_guide(&self.config.qdrant.url);
            anyhow::bail!("Qdrant is not reachable at {}", self.config.qdrant.url);
        }
        Ok(())
    }
}

/// Apply command line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.llm_model {
        config.llm.model = model.clone();
    }
    if let Some(model) = &cli.embedding_model {
        config.embeddings.model = model.clone();
    }
    if let Some(url) = &cli.qdrant_url {
        config.qdrant.url = url.clone();
    }
    if let Some(collection) = &cli.collection {
        config.qdrant.collection = collection.clone();
    }
}
