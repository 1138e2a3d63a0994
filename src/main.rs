//! Data Insights - ask questions about a sales database in plain language.

use data_insights::cli::{Cli, Command};
use data_insights::config::Config;
use data_insights::db::{self, create_sample_database, QueryStore, SeedOptions};
use data_insights::error::{InsightsError, Result};
use data_insights::llm::tools::{execution_failure_json, success_json};
use data_insights::llm::{create_client, DataAgent};
use data_insights::logging;
use data_insights::query::{GatePolicy, QueryGate};
use data_insights::safety::validate_with;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    match cli.log_path() {
        Some(path) => logging::init_file_logging(&path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides()?;
    cli.apply_to(&mut config)?;

    match &cli.command {
        Command::Seed { force, rows, seed } => {
            let options = SeedOptions {
                sales_rows: *rows,
                seed: *seed,
                force: *force,
                ..SeedOptions::new(config.store.path.clone())
            };
            let summary = create_sample_database(&options).await?;
            println!(
                "Created {} with {} sales and {} customers",
                summary.path.display(),
                summary.sales_rows,
                summary.customers
            );
            Ok(())
        }
        Command::Check { sql } => {
            let verdict = validate_with(config.gate.mode, sql);
            println!("{verdict}");
            match verdict.rejection() {
                Some(reason) => Err(InsightsError::query(format!("Query rejected: {reason}"))),
                None => Ok(()),
            }
        }
        command => {
            info!("Store: {}", config.store.display_string());
            let store = db::connect(&config.store).await?;
            let outcome = run_with_store(command, &config, store.as_ref()).await;
            store.close().await?;
            outcome
        }
    }
}

async fn run_with_store(command: &Command, config: &Config, store: &dyn QueryStore) -> Result<()> {
    let gate = QueryGate::new(store, GatePolicy::from(&config.gate));

    match command {
        Command::Tables => {
            let schema = store.introspect_schema().await?;
            print!("{}", schema.format_overview());
            Ok(())
        }
        Command::Query { sql } => match gate.execute(sql).await {
            Ok(result) => {
                print_json(&success_json(&result));
                if let Some(warning) = result.truncation_warning() {
                    eprintln!("{warning}");
                }
                Ok(())
            }
            Err(e) => {
                print_json(&execution_failure_json(&e));
                Err(e.into())
            }
        },
        Command::Ask { question } => {
            let mut agent = build_agent(config, store).await?;
            let reply = agent.chat(&gate, question).await?;
            println!("{}", reply.text);
            Ok(())
        }
        Command::Chat => {
            let mut agent = build_agent(config, store).await?;
            chat_loop(&mut agent, &gate).await
        }
        Command::Seed { .. } | Command::Check { .. } => Ok(()),
    }
}

async fn build_agent(config: &Config, store: &dyn QueryStore) -> Result<DataAgent> {
    let schema = store.introspect_schema().await?;
    let client = create_client(&config.llm)?;
    Ok(DataAgent::new(
        client,
        &schema,
        config.gate.max_rows,
        config.llm.max_turns,
    ))
}

/// Reads questions from stdin until `exit` or end of input.
///
/// A failed turn is reported and the loop keeps going.
async fn chat_loop(agent: &mut DataAgent, gate: &QueryGate<'_>) -> Result<()> {
    println!("Ask a question about the data. Type 'reset' to start over, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(b"> ")
            .await
            .map_err(|e| InsightsError::internal(format!("Failed to write prompt: {e}")))?;
        stdout
            .flush()
            .await
            .map_err(|e| InsightsError::internal(format!("Failed to flush stdout: {e}")))?;

        let line = lines
            .next_line()
            .await
            .map_err(|e| InsightsError::internal(format!("Failed to read input: {e}")))?;
        let Some(line) = line else {
            break;
        };

        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "reset" => {
                agent.reset();
                println!("Conversation cleared.");
            }
            question => match agent.chat(gate, question).await {
                Ok(reply) => println!("{}\n", reply.text),
                Err(e) => {
                    error!("{}: {}", e.category(), e);
                    eprintln!("Error: {e}\n");
                }
            },
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
