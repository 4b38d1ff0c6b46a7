use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(version)]
#[command(about = "Chat with your PDF documents using local models and Qdrant", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Chat model to use (e.g., llama3.2:3b or ollama/llama3.2:3b)
    #[arg(long, global = true)]
    pub llm_model: Option<String>,

    /// Embedding model to use (e.g., bge-m3)
    #[arg(long, global = true)]
    pub embedding_model: Option<String>,

    /// Qdrant REST endpoint
    #[arg(long, global = true)]
    pub qdrant_url: Option<String>,

    /// Qdrant collection holding the document chunks
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Skip automatic model installation
    #[arg(long, global = true)]
    pub no_auto_install: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Check status of Ollama, Qdrant and the configuration
    Status,
    /// Start the interactive document chat (default)
    Chat,
    /// Upload a PDF and create its embeddings
    Ingest {
        /// PDF to embed
        pdf: PathBuf,
    },
    /// Answer one question from the stored document
    Ask {
        /// The question
        question: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
    /// Markdown formatted output
    Markdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::try_parse_from(["docchat"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_ask_with_format_and_global_flags() {
        let cli = Cli::try_parse_from([
            "docchat",
            "ask",
            "What is this about?",
            "--output-format",
            "json",
            "--collection",
            "papers",
        ])
        .unwrap();

        assert_eq!(cli.collection.as_deref(), Some("papers"));
        assert_eq!(
            cli.command,
            Some(Commands::Ask {
                question: "What is this about?".to_string(),
                output_format: OutputFormat::Json,
            })
        );
    }

    #[test]
    fn test_ingest_requires_path() {
        assert!(Cli::try_parse_from(["docchat", "ingest"]).is_err());
        let cli = Cli::try_parse_from(["docchat", "ingest", "paper.pdf"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Ingest {
                pdf: PathBuf::from("paper.pdf")
            })
        );
    }
}
