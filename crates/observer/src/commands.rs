//! CMOP Observer command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use cmop_agent::context::INITIAL_OBSERVATION_PROMPT;
use cmop_agent::tools::DoneTool;
use cmop_agent::{
    register_cmop_tools, AgentSession, ContextBuilder, PromptMode, TerminationSignal, ToolRegistry,
};
use cmop_client::CmopClient;
use cmop_common::Telemetry;
use cmop_config::Config;
use cmop_provider::OpenAiCompatProvider;

/// Config file plus `CMOP_*` environment overrides
async fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_from(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env()?;
    Ok(config)
}

/// Client and registry wired against one telemetry context
fn build_tools(
    config: &Config,
    telemetry: &Telemetry,
) -> Result<(Arc<CmopClient>, ToolRegistry)> {
    let client = Arc::new(
        CmopClient::from_config(config, telemetry.clone()).context("Failed to build CMOP client")?,
    );
    let mut registry = ToolRegistry::new(telemetry.clone());
    register_cmop_tools(&mut registry, client.clone());
    Ok((client, registry))
}

async fn build_session(
    config: &Config,
    telemetry: &Telemetry,
    mode: PromptMode,
) -> Result<AgentSession<OpenAiCompatProvider>> {
    let (client, registry) = build_tools(config, telemetry)?;
    let provider =
        OpenAiCompatProvider::new(&config.llm.api_base, config.llm_api_key(), config.model());

    let session = AgentSession::new(
        provider,
        registry,
        config,
        ContextBuilder::system_prompt(mode),
    )
    .on_tool_call(|call| println!("  [calling {}...]", call.name));

    session.load_schema(client.as_ref()).await;
    Ok(session)
}

/// Write the default config file
pub async fn init_command(path: &Path) -> Result<()> {
    println!("◆ Initializing CMOP Observer...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = cmop_config::init_at(path).await?;

    println!("\n◆ Config at {}", path.display());
    println!("\nNext steps:");
    println!("  1. Point cmop.api_base at the map service ({})", config.api_base());
    println!("  2. Point llm.api_base at an OpenAI-compatible endpoint ({})", config.llm.api_base);
    println!("  3. Run an analysis: cmop-observer observe");

    Ok(())
}

/// One autonomous analysis run
pub async fn observe_command(
    path: &Path,
    telemetry: &Telemetry,
    prompt: Option<String>,
) -> Result<()> {
    let config = load_config(path).await?;
    let mut session = build_session(&config, telemetry, PromptMode::Observation).await?;

    let prompt = prompt.unwrap_or_else(|| INITIAL_OBSERVATION_PROMPT.to_string());
    info!("Starting observation with model {}", config.model());

    tokio::select! {
        result = session.run(&prompt) => {
            let summary = result?;
            println!("\n◆ {}", summary);
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
        }
    }

    Ok(())
}

/// Interactive question loop over one session
pub async fn chat_command(path: &Path, telemetry: &Telemetry) -> Result<()> {
    let config = load_config(path).await?;
    let mut session = build_session(&config, telemetry, PromptMode::Interactive).await?;

    println!("◆ Interactive mode (type 'quit' to leave)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        tokio::select! {
            result = session.run(input) => match result {
                Ok(answer) => println!("\n◆ {}\n", answer),
                Err(e) => println!("\n✗ {}\n", e),
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n✗ Interrupted\n");
            }
        }
    }

    Ok(())
}

/// Print the function definitions sent to the model
pub async fn tools_command(path: &Path, telemetry: &Telemetry) -> Result<()> {
    let config = load_config(path).await?;
    let (_, mut registry) = build_tools(&config, telemetry)?;
    registry.register(DoneTool::new(TerminationSignal::new()));

    let json = serde_json::to_string_pretty(&registry.definitions())?;
    println!("{}", json);
    Ok(())
}

/// Show effective settings
pub async fn status_command(path: &Path) -> Result<()> {
    let config = load_config(path).await?;

    println!("◆ CMOP Observer Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:     {} {}",
        path.display(),
        if path.exists() { "[OK]" } else { "[Defaults]" }
    );
    println!("CMOP API:   {}", config.api_base());
    println!("Timeout:    {}s", config.cmop.request_timeout_secs);
    println!("Model:      {}", config.model());
    println!("LLM API:    {}", config.llm.api_base);
    println!(
        "API Key:    {}",
        if config.llm_api_key().is_some() {
            "[Set]"
        } else {
            "[None]"
        }
    );
    println!("Max turns:  {}", config.max_iterations());

    println!("\n◆ Ready");

    Ok(())
}
