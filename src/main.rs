use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use loancalc::api::{self, CalculatePayload, CliCalculator, ServerConfig};
use loancalc::logging::init_logging;
use loancalc::lookup::LookupConfig;

#[derive(Parser, Debug)]
#[command(
    name = "loancalc",
    about = "Car loan and mortgage calculators with payment and affordability modes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the calculator pages and JSON API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
        /// Mount everything under this prefix, e.g. /calc
        #[arg(long, env = "BASE_PATH", default_value = "")]
        base_path: String,
        #[arg(long, default_value = "public")]
        public_dir: PathBuf,
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: Option<String>,
        #[arg(long, default_value = "gpt-4o-mini")]
        lookup_model: String,
        #[arg(long, default_value = "https://api.openai.com/v1")]
        lookup_base_url: String,
        /// Lookup request timeout in seconds
        #[arg(long, default_value_t = 30)]
        lookup_timeout: u64,
    },
    /// Run one calculation and print the JSON result
    Calc {
        #[arg(value_enum)]
        calculator: CliCalculator,
        #[command(flatten)]
        payload: CalculatePayload,
    },
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            base_path,
            public_dir,
            openai_api_key,
            lookup_model,
            lookup_base_url,
            lookup_timeout,
        } => {
            let config = ServerConfig {
                port,
                base_path,
                public_dir,
                lookup: LookupConfig {
                    base_url: lookup_base_url,
                    model: lookup_model,
                    api_key: openai_api_key,
                    timeout: Duration::from_secs(lookup_timeout),
                    ..LookupConfig::default()
                },
            };
            if let Err(e) = api::run_http_server(config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Calc {
            calculator,
            payload,
        } => match api::calculate(calculator.into(), &payload) {
            Ok((_, response)) => match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Failed to encode result: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("{}", e.message());
                std::process::exit(2);
            }
        },
    }
}
