pub mod count;
pub mod output;
pub mod samples;
pub mod search;
pub mod shell;

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pubmed_assistant::{Analyst, ChatClient, ClientConfig, LlmConfig, PubMedClient, ResearchAssistant};

use crate::Cli;

pub fn create_pubmed_client(cli: &Cli) -> Result<PubMedClient> {
    let mut config = ClientConfig::new().with_tool(&cli.tool);

    if let Some(key) = cli.api_key.as_deref() {
        config = config.with_api_key(key);
    }

    if let Some(email) = cli.email.as_deref() {
        config = config.with_email(email);
    }

    PubMedClient::with_config(config).context("Failed to create PubMed client")
}

pub fn create_analyst(cli: &Cli) -> Result<Analyst> {
    let api_key = cli
        .openai_api_key
        .as_deref()
        .context("OPENAI_API_KEY is not set; pass --openai-api-key or add it to .env")?;

    let mut config = LlmConfig::new(api_key)?;
    if let Some(base_url) = cli.openai_base_url.as_deref() {
        config = config.with_base_url(base_url);
    }
    if let Some(model) = cli.model.as_deref() {
        config = config.with_model(model);
    }
    if let Some(seconds) = cli.llm_timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    let chat = ChatClient::new(config).context("Failed to create chat client")?;
    Ok(Analyst::new(chat))
}

pub fn create_assistant(cli: &Cli) -> Result<ResearchAssistant> {
    Ok(ResearchAssistant::new(
        create_pubmed_client(cli)?,
        create_analyst(cli)?,
    ))
}

/// Spinner shown while a network round trip is in flight
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Failed to set progress bar style")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    Ok(pb)
}
