//! Toolbridge command implementations

use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use toolbridge_agent::{AgentLoop, ToolCatalog};
use toolbridge_config::{self, Config, API_KEY_ENV};
use toolbridge_mcp::McpClient;
use toolbridge_provider::{GeminiProvider, Provider};

/// Write the default config
pub async fn init_command() -> Result<()> {
    println!("Initializing toolbridge...");

    let config = toolbridge_config::init()
        .await
        .context("failed to write config")?;

    println!("Config: {}", toolbridge_config::config_path().display());
    println!("\nNext steps:");
    if !config.has_api_key() {
        println!(
            "  1. Add your API key to the config file or set {}",
            API_KEY_ENV
        );
    }
    println!("  2. Point server.command/server.args at your MCP server");
    println!("  3. Start asking: toolbridge chat -m \"What is 2 + 2?\"");

    Ok(())
}

/// Answer one message, or run the interactive prompt
pub async fn chat_command(message: Option<String>) -> Result<()> {
    let config = Config::load().await.context("failed to load config")?;

    let api_key = config.api_key().with_context(|| {
        format!(
            "No API key configured. Set model.api_key in {} or {}",
            toolbridge_config::config_path().display(),
            API_KEY_ENV
        )
    })?;
    let provider = GeminiProvider::new(api_key, Some(config.api_base()), Some(config.model_name()));
    let model = provider.default_model();

    with_server(&config, |client| async move {
        let catalog = ToolCatalog::load(client.as_ref()).await?;
        if catalog.is_empty() {
            warn!("tool server advertised no tools");
        }
        println!("Connected with tools: {}", catalog.names().join(", "));

        let agent = AgentLoop::new(Arc::new(provider), client, Arc::new(catalog), model);

        match message {
            Some(message) => {
                let answer = agent.run(&message).await;
                println!("\n{}", answer);
            }
            None => interactive(&agent).await?,
        }
        Ok(())
    })
    .await
}

async fn interactive<P: Provider, S: toolbridge_mcp::ToolServer>(
    agent: &AgentLoop<P, S>,
) -> Result<()> {
    println!("Interactive mode (type 'quit' to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nQuery: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_quit(query) {
            break;
        }

        let answer = agent.run(query).await;
        println!("\n{}", answer);
    }

    Ok(())
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit")
}

/// Print the normalized tool catalog
pub async fn tools_command() -> Result<()> {
    let config = Config::load().await.context("failed to load config")?;

    with_server(&config, |client| async move {
        let catalog = ToolCatalog::load(client.as_ref()).await?;
        println!("{}", catalog.to_json_pretty()?);
        Ok(())
    })
    .await
}

/// Show configuration status
pub async fn status_command() -> Result<()> {
    let config_path = toolbridge_config::config_path();

    println!("Toolbridge Status");
    println!(
        "Config:  {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await.context("failed to load config")?;
    println!("Model:   {}", config.model_name());
    println!("API:     {}", config.api_base());
    println!(
        "API Key: {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!("Server:  {}", config.server.command_line());
    if let Some(dir) = &config.server.workdir {
        println!("Workdir: {}", dir.display());
    }

    Ok(())
}

/// Spawn the configured tool server, run `work` against it, and shut the
/// server down whatever the outcome.
async fn with_server<F, Fut>(config: &Config, work: F) -> Result<()>
where
    F: FnOnce(Arc<McpClient>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let client = Arc::new(
        McpClient::spawn(&config.server)
            .await
            .context("failed to start tool server")?,
    );
    if let Some(instructions) = client.instructions() {
        info!("server instructions: {}", instructions);
    }

    let result = work(client.clone()).await;
    client.shutdown().await;
    result
}
