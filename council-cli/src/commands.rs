//! Subcommand handlers. Each returns the text to print on stdout.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use council_core::{CouncilConfig, ExpertResponse, JudgmentScorer, compute_cache_key};

use crate::report::judgment_to_markdown;
use crate::{Commands, ConfigAction, OutputFormat};

/// A judging request as read from a file or stdin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JudgeRequest {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub responses: Vec<ExpertResponse>,
}

impl JudgeRequest {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Invalid judging request JSON")
    }
}

pub(crate) fn handle_command(command: Commands, config: &CouncilConfig) -> anyhow::Result<String> {
    match command {
        Commands::Judge { file, format } => {
            let request = read_request(file.as_deref())?;
            judge(&request, config, format)
        }
        Commands::CacheKey { file } => {
            let request = read_request(file.as_deref())?;
            Ok(compute_cache_key(&request.task, &request.responses).into_string())
        }
        Commands::Models => Ok(list_models(config)),
        Commands::Config { action } => match action {
            ConfigAction::Show => config
                .to_toml_string()
                .map_err(|e| anyhow::anyhow!("Failed to render config: {}", e)),
        },
    }
}

pub(crate) fn judge(
    request: &JudgeRequest,
    config: &CouncilConfig,
    format: OutputFormat,
) -> anyhow::Result<String> {
    debug!(
        responses = request.responses.len(),
        "Judging request loaded"
    );
    let result = JudgmentScorer::from_config(config).judge(&request.responses);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result)?),
        OutputFormat::Markdown => Ok(judgment_to_markdown(&request.task, &result)),
    }
}

fn list_models(config: &CouncilConfig) -> String {
    let table = council_core::ModelQualityTable::from_config(&config.models);
    let width = table.entries().map(|(model, _)| model.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (model, score) in table.entries() {
        out.push_str(&format!("{model:<width$}  {score:.2}\n"));
    }
    out.push_str(&format!(
        "{:<width$}  {:.2}",
        "(unknown)",
        table.default_score()
    ));
    out
}

fn read_request(path: Option<&Path>) -> anyhow::Result<JudgeRequest> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    JudgeRequest::from_json(&json)
}
