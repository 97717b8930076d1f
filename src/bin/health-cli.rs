use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "Query the probe endpoints of a running service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Exit with status 1 when the probe is not OK.
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show liveness details
    Live {
        #[arg(long, default_value = "/live")]
        path: String,
    },
    /// Show readiness details
    Ready {
        #[arg(long, default_value = "/ready")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match &cli.command {
        Commands::Live { path } => path,
        Commands::Ready { path } => path,
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .send()
        .await?;
    let ok = print_response(res).await?;

    if cli.strict && !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {}", status);

    match status {
        StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE => {
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            if let Ok(text) = res.text().await {
                eprintln!("Response: {}", text);
            }
        }
    }

    Ok(status.is_success())
}
