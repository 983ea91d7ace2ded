use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use datalab_core::DataLabConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

fn cli() -> Command {
    Command::new("datalab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("DataLab prompt telemetry and element graph tools")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("catalog")
                .about("List element definitions")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog JSON file (built-ins when omitted)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("graph")
                .about("Print or validate a graph")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Graph JSON file (demo graph when omitted)"),
                )
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog to validate against (built-ins when omitted)"),
                )
                .arg(
                    Arg::new("validate")
                        .long("validate")
                        .action(ArgAction::SetTrue)
                        .help("Check publishability and print the execution order"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a typing script and print the resulting payload")
                .arg(
                    Arg::new("script")
                        .long("script")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Replay script JSON file"),
                ),
        )
        .subcommand(
            Command::new("manifest")
                .about("Show the latest published playground manifest")
                .arg(
                    Arg::new("tenant")
                        .long("tenant")
                        .help("Tenant (configured default when omitted)"),
                )
                .arg(
                    Arg::new("playground")
                        .long("playground")
                        .help("Playground (configured default when omitted)"),
                ),
        )
        .subcommand(
            Command::new("chat")
                .about("Send one prompt to the chat backend")
                .arg(
                    Arg::new("prompt")
                        .long("prompt")
                        .required(true)
                        .help("Prompt text"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let config = DataLabConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("catalog", args)) => {
            let path = args.get_one::<PathBuf>("path");
            print!("{}", commands::catalog(path.map(PathBuf::as_path), args.get_flag("json"))?);
        }
        Some(("graph", args)) => {
            let out = commands::graph(
                args.get_one::<PathBuf>("file").map(PathBuf::as_path),
                args.get_one::<PathBuf>("catalog").map(PathBuf::as_path),
                args.get_flag("validate"),
            )?;
            print!("{out}");
        }
        Some(("replay", args)) => {
            let script = args
                .get_one::<PathBuf>("script")
                .ok_or_else(|| anyhow::anyhow!("--script is required"))?;
            let payload = commands::replay_script(script, &config)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("manifest", args)) => {
            let mut config = config;
            if let Some(tenant) = args.get_one::<String>("tenant") {
                config.playground_tenant.clone_from(tenant);
            }
            if let Some(playground) = args.get_one::<String>("playground") {
                config.playground_name.clone_from(playground);
            }
            print!("{}", commands::manifest(&config).await?);
        }
        Some(("chat", args)) => {
            let prompt = args
                .get_one::<String>("prompt")
                .ok_or_else(|| anyhow::anyhow!("--prompt is required"))?;
            let outcome = commands::chat(prompt, &config).await?;
            if let Some(model) = &outcome.model_name {
                println!("[{model}] {}", outcome.response_text);
            } else {
                println!("{}", outcome.response_text);
            }
            tracing::info!(interaction_id = %outcome.interaction_id, "done");
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    run(&matches).await
}
