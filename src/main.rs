#[macro_use]
extern crate tracing;

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use directories::ProjectDirs;
use tapestry::cli::{Cli, Sub};
use tapestry::replay::{read_events, replay, replay_realtime};
use tapestry::sink::JsonLinesSink;
use tapestry_config::ConfigPath;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "tapestry=debug,info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();

    let _client = tracy_client::Client::start();

    let config_path = config_path(cli.config)?;

    match cli.subcommand {
        Sub::Validate => {
            config_path.load()?;
            info!("config is valid");
        }
        Sub::Replay { file, realtime } => {
            let config = config_path.load()?;

            let events = match &file {
                Some(path) => {
                    let file = File::open(path).with_context(|| format!("error opening {path:?}"))?;
                    read_events(BufReader::new(file))?
                }
                None => read_events(io::stdin().lock())?,
            };
            debug!("replaying {} contact events", events.len());

            let sink = Box::new(JsonLinesSink::new(io::stdout()));
            if realtime {
                replay_realtime(&config, events, sink)?;
            } else {
                replay(&config, events, sink);
            }
        }
    }

    Ok(())
}

fn config_path(cli_path: Option<PathBuf>) -> anyhow::Result<ConfigPath> {
    let explicit = cli_path.or_else(|| {
        env::var_os("TAPESTRY_CONFIG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    });
    if let Some(path) = explicit {
        return Ok(ConfigPath::Explicit(path));
    }

    let mut user_path = ProjectDirs::from("", "", "tapestry")
        .context("error retrieving home directory")?
        .config_dir()
        .to_owned();
    user_path.push("config.kdl");

    Ok(ConfigPath::Regular {
        user_path,
        system_path: PathBuf::from("/etc/tapestry/config.kdl"),
    })
}
