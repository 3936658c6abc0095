use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "biocoin-cli")]
#[command(about = "Command-line client for the BioCoin payment API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000", env = "BIOCOIN_API_URL")]
    url: String,

    /// API key sent as a bearer token
    #[arg(short, long, env = "BIOCOIN_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health (add --detailed for chain status)
    Health {
        #[arg(long)]
        detailed: bool,
    },
    /// Show wallet balances on every chain
    Balances,
    /// List your completed payments
    History,
    /// Pay for access to a dataset
    Pay {
        #[arg(long)]
        data_id: String,
        #[arg(long)]
        amount: f64,
        /// solana or bsc
        #[arg(long)]
        chain: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let request = match cli.command {
        Commands::Health { detailed } => {
            let path = if detailed { "/health/detailed" } else { "/health" };
            client.get(format!("{}{}", base, path))
        }
        Commands::Balances => client.get(format!("{}/api/transactions/balances", base)),
        Commands::History => client.get(format!("{}/api/transactions/history", base)),
        Commands::Pay {
            data_id,
            amount,
            chain,
        } => client
            .post(format!("{}/api/transactions/payment", base))
            .json(&json!({ "dataId": data_id, "amount": amount, "blockchain": chain })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) if status.is_success() => println!("{}", serde_json::to_string_pretty(&json)?),
        Ok(json) => {
            eprintln!("Error: API returned status {}", status);
            eprintln!("{}", serde_json::to_string_pretty(&json)?);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Error: API returned status {} with non-JSON body", status);
            eprintln!("{}", text);
            std::process::exit(1);
        }
    }
    Ok(())
}
