//! beaver-charm
//!
//! Hook executable for the beaver log shipper. Installed under each hook name in the
//! charm's `hooks/` directory; the name it is invoked as selects the event.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use beaver_core::{HookEvent, HookRegistry};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

use config::{Config, LoggingConfig};

/// beaver charm hooks
#[derive(Parser, Debug)]
#[command(name = "beaver-charm", version, about, long_about = None)]
struct Cli {
    /// Charm settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lifecycle hook
    Hook {
        /// Event name, e.g. install or logs-relation-changed
        event: String,
    },
    /// List the hooks this charm handles
    Hooks,
}

/// Event named by the invocation path, when run through a hook symlink
fn invoked_event(argv0: Option<OsString>) -> Option<HookEvent> {
    HookEvent::from_invocation(Path::new(&argv0?)).ok()
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("BEAVER_CHARM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_hook(config: &Config, event: HookEvent) -> Result<()> {
    let charm = factory::build_local_charm(&config.charm, &config.snapshot_path());
    HookRegistry::new().dispatch(&charm, event).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Hook runners call hooks/<event> with no arguments
    if let Some(event) = invoked_event(std::env::args_os().next()) {
        let config = Config::load_default()?;
        init_tracing(&config.logging);
        return run_hook(&config, event).await;
    }

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Hook { event } => run_hook(&config, event.parse()?).await,
        Commands::Hooks => {
            for event in HookEvent::ALL {
                println!("{event}");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_invoked_event_from_hook_symlink() {
        let argv0 = OsString::from("/var/lib/juju/agents/unit-beaver-0/charm/hooks/config-changed");
        assert_eq!(invoked_event(Some(argv0)), Some(HookEvent::ConfigChanged));
    }

    #[test]
    fn test_invoked_event_from_binary_name() {
        assert_eq!(invoked_event(Some(OsString::from("./beaver-charm"))), None);
        assert_eq!(invoked_event(None), None);
    }

    #[test]
    fn test_parse_hook_subcommand() {
        let cli = Cli::parse_from(["beaver-charm", "hook", "input-tcp-relation-changed"]);
        assert!(
            matches!(cli.command, Commands::Hook { event } if event == "input-tcp-relation-changed")
        );
    }
}
