//! # Sahayak CLI (`sahayak`)
//!
//! Summarizes a government-scheme document in English and Telugu and answers
//! questions about it.
//!
//! ## Usage
//!
//! ```bash
//! sahayak --config ./config/sahayak.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sahayak summarize <file>` | Bilingual summary with confidence and missing sections |
//! | `sahayak ask <file> "<question>"` | Answer one question about the document |
//! | `sahayak chat <file>` | Answer questions read from stdin |
//!
//! ## Examples
//!
//! ```bash
//! # Summary as JSON, naming the page it came from
//! sahayak summarize pmkisan.pdf --url https://pmkisan.gov.in --json
//!
//! # Show the chunks an answer was built from
//! sahayak ask pmkisan.pdf "How much money do farmers get?" --show-context
//!
//! # Keyword-only answers, no API key needed
//! SAHAYAK_PROVIDER=disabled sahayak chat pmkisan.pdf
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sahayak::ask_cmd::{self, AskOptions};
use sahayak::{config, llm, logging, summarize_cmd};

/// Sahayak: government-scheme summaries and Q&A.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sahayak.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sahayak",
    about = "Sahayak: summarize government-scheme documents in English and Telugu and answer questions about them",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/sahayak.toml`. A missing file means built-in
    /// defaults.
    #[arg(long, global = true, default_value = "./config/sahayak.toml")]
    config: PathBuf,

    /// Override `[llm] provider` (`openrouter` or `disabled`).
    #[arg(long, global = true, env = "SAHAYAK_PROVIDER")]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a scheme document in English and Telugu.
    ///
    /// Reports the detected scheme name, a confidence score and any of the
    /// four summary sections the document did not cover.
    Summarize {
        /// PDF or text file.
        file: PathBuf,

        /// Page the document came from; used to guess the scheme name.
        #[arg(long)]
        url: Option<String>,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer one question about a document.
    Ask {
        /// PDF or text file.
        file: PathBuf,

        /// The question.
        question: String,

        /// Print the chunks the answer was synthesized from.
        #[arg(long)]
        show_context: bool,

        /// Always list full-text keyword matches after the answer.
        #[arg(long)]
        full_text: bool,
    },

    /// Answer questions read line by line from stdin until EOF or `exit`.
    Chat {
        /// PDF or text file.
        file: PathBuf,

        /// Print the chunks each answer was synthesized from.
        #[arg(long)]
        show_context: bool,

        /// Always list full-text keyword matches after each answer.
        #[arg(long)]
        full_text: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut cfg = config::load_config_or_default(&cli.config)?;
    if let Some(provider) = cli.provider {
        cfg.llm.provider = provider;
    }
    let providers = llm::create_providers(&cfg.llm)?;

    match cli.command {
        Commands::Summarize { file, url, json } => {
            summarize_cmd::run_summarize(&cfg, &providers, &file, url.as_deref(), json).await?;
        }
        Commands::Ask {
            file,
            question,
            show_context,
            full_text,
        } => {
            let options = AskOptions {
                show_context,
                full_text,
            };
            ask_cmd::run_ask(&cfg, &providers, &file, &question, options).await?;
        }
        Commands::Chat {
            file,
            show_context,
            full_text,
        } => {
            let options = AskOptions {
                show_context,
                full_text,
            };
            ask_cmd::run_chat(&cfg, &providers, &file, options).await?;
        }
    }

    Ok(())
}
