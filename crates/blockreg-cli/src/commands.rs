use std::sync::Arc;

use colored::Colorize;
use serde_json::json;

use blockreg_registry::{Operation, Registry};
use blockreg_store::FileLedgerStore;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?.with_ledger(cli.ledger);
    match cli.command {
        Command::Invoke(args) => cmd_invoke(&config, args, &cli.format),
        Command::Operations(_) => cmd_operations(&cli.format),
    }
}

fn cmd_invoke(config: &CliConfig, args: InvokeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = Arc::new(FileLedgerStore::open(&config.ledger_path, config.log.clone())?);
    let mut registry = Registry::open(store, config.registry.clone())?;

    let payload = registry.invoke(&args.operation, &args.args)?;
    let rendered = render_payload(&payload);

    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "operation": args.operation, "result": rendered }));
        }
        OutputFormat::Text => match rendered {
            serde_json::Value::String(message) => println!("{} {}", "✓".green().bold(), message),
            record => println!("{}", serde_json::to_string_pretty(&record)?),
        },
    }
    Ok(())
}

fn cmd_operations(format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let ops: Vec<_> = Operation::ALL
                .iter()
                .map(|op| json!({ "name": op.name(), "parameters": op.parameters() }))
                .collect();
            println!("{}", serde_json::Value::Array(ops));
        }
        OutputFormat::Text => {
            for op in Operation::ALL {
                let params: Vec<String> = op.parameters().iter().map(|p| format!("<{p}>")).collect();
                println!("  {} {}", op.name().bold(), params.join(" ").dimmed());
            }
        }
    }
    Ok(())
}

/// Records come back as JSON documents; everything else is a status message.
fn render_payload(payload: &[u8]) -> serde_json::Value {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()),
    }
}
