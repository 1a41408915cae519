use aide::agent::{Agent, Reply, DEFAULT_MAX_FUNCTION_CALLS};
use aide::graph::{DelegatedCredential, GraphAdapter, DEFAULT_GRAPH_ENDPOINT};
use aide::providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL};
use aide::providers::openai::OpenAiProvider;
use anyhow::Result;
use bat::PrettyPrinter;
use clap::Parser;
use cliclack::{input, spinner};
use console::style;
use std::sync::Arc;

/// Talk to the assistant from a terminal with a Graph token you already have
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Delegated Microsoft Graph access token, e.g. copied from Graph Explorer
    #[arg(long, env = "GRAPH_ACCESS_TOKEN", hide_env_values = true)]
    graph_token: String,

    /// Model to use
    #[arg(short, long, default_value = OPENAI_MODEL)]
    model: String,

    #[arg(long, default_value = OPENAI_HOST)]
    host: String,

    #[arg(long, default_value = DEFAULT_GRAPH_ENDPOINT)]
    graph_endpoint: String,

    /// Time zone new calendar events are created in
    #[arg(long, default_value = "UTC")]
    time_zone: String,

    #[arg(long, default_value_t = DEFAULT_MAX_FUNCTION_CALLS)]
    max_function_calls: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let provider = OpenAiProvider::new(
        OpenAiProviderConfig::new(cli.api_key.clone())
            .with_host(cli.host.clone())
            .with_model(cli.model.clone()),
    )?;
    let agent = Agent::new(Arc::new(provider)).with_max_function_calls(cli.max_function_calls);

    println!(
        "aide {}",
        style("- type \"exit\" to end the session").dim()
    );
    println!("\n");

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;

        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let adapter = GraphAdapter::connect(
            &cli.graph_endpoint,
            DelegatedCredential::new(cli.graph_token.clone()),
            cli.time_zone.clone(),
        )?;

        let spin = spinner();
        spin.start("awaiting reply");
        let turn = agent.reply(&adapter, message_text.trim()).await;
        spin.stop("");

        match turn.reply() {
            Reply::Text(text) => render(&text)?,
            Reply::ProfileCard {
                picture_url,
                details,
            } => {
                render(&details)?;
                let note = match picture_url {
                    Some(_) => "(profile card with photo in Teams)",
                    None => "(profile card in Teams)",
                };
                println!("{}", style(note).dim());
            }
        }
        println!("\n");
    }
    Ok(())
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()?;
    Ok(())
}
