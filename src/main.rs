mod cli;
mod providers;
mod repl;

use std::io::IsTerminal;

use anyhow::Context;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use clap::Parser;
use wisp_input::{Action, KeyMap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = wisp_config::load(cli.config.as_deref())?;

    match &cli.command {
        Some(Commands::ShowConfig) => {
            let text = toml::to_string_pretty(&config).context("failed to serialize config")?;
            println!("{text}");
            Ok(())
        }
        Some(Commands::Keys) => {
            let keymap = KeyMap::from_config(&config.keys).context("invalid [keys] configuration")?;
            print!("{}", describe_keys(&keymap));
            Ok(())
        }
        Some(Commands::Completions { .. }) => Ok(()),
        None => {
            if !std::io::stdin().is_terminal() {
                anyhow::bail!("wisp needs an interactive terminal on stdin");
            }
            repl::run(&config, &cli.prompt).await
        }
    }
}

/// One line per action: name, then its keys.
fn describe_keys(keymap: &KeyMap) -> String {
    let mut out = String::new();
    for action in Action::ALL.iter().copied().filter(|a| *a != Action::None) {
        let keys: Vec<String> = keymap.keys_for(action).iter().map(|k| k.to_string()).collect();
        let keys = if keys.is_empty() { "(unbound)".to_string() } else { keys.join(", ") };
        out.push_str(&format!("{:<26} {keys}\n", action.name()));
    }
    out
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
