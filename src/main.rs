use clap::Parser;
use mizan::cli::{Cli, Commands};
use mizan::commands::{self, SearchRequest};
use mizan::config::Config;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "mizan=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.display().to_string();
    }

    match cli.command {
        Some(Commands::Search {
            query,
            category,
            limit,
            offset,
            min_score,
            json,
        }) => {
            let request = SearchRequest {
                query,
                category,
                limit,
                offset,
                min_score,
            };
            let results = commands::search(&config, &request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", commands::render_text(&request.query, &results));
            }
            Ok(())
        }
        Some(Commands::Categories) => {
            let infos = commands::categories(&config);
            if infos.is_empty() {
                println!("No categories configured");
                return Ok(());
            }

            println!("Data directory: {}", config.data_dir().display());
            for info in infos {
                let records = info
                    .records
                    .map_or_else(|| "missing".to_string(), |n| format!("{n} records"));
                println!(
                    "  {:<10} [{}] limit {} ({records})",
                    info.name,
                    info.search_fields.join(", "),
                    info.limit
                );
            }
            Ok(())
        }
        Some(Commands::Watch { json }) => {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            commands::watch(&config, stdin.lock(), &mut stdout, json)?;
            Ok(())
        }
        #[cfg(feature = "mcp")]
        Some(Commands::Serve) => tokio::runtime::Runtime::new()?.block_on(mizan::mcp::serve(config)),
        None => {
            Cli::parse_from(["mizan", "--help"]);
            Ok(())
        }
    }
}
