use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "vision-cli")]
#[command(about = "Command-line client for the vision proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported analysis features
    Features,
    /// Analyze an image by URL
    AnalyzeUrl {
        image_url: String,
        /// Comma-separated features, e.g. "Tags,Objects"
        #[arg(short, long)]
        features: Option<String>,
    },
    /// Upload and analyze a local image file
    AnalyzeFile {
        path: PathBuf,
        /// Comma-separated features, e.g. "Tags,Objects"
        #[arg(short, long)]
        features: Option<String>,
    },
    /// Check proxy liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Features => {
            client
                .get(format!("{base}/api/v1/analyze/features"))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::AnalyzeUrl {
            image_url,
            features,
        } => {
            let mut body = serde_json::json!({ "url": image_url });
            if let Some(features) = features {
                let list: Vec<&str> = features.split(',').map(str::trim).collect();
                body["features"] = serde_json::json!(list);
            }
            client
                .post(format!("{base}/api/v1/analyze/url"))
                .json(&body)
                .send()
                .await?
        }
        Commands::AnalyzeFile { path, features } => {
            let bytes = tokio::fs::read(&path).await?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .to_string();
            let mime = mime_guess::from_path(&path).first_or_octet_stream();

            let part = Part::bytes(bytes)
                .file_name(filename)
                .mime_str(mime.essence_str())?;
            let mut form = Form::new().part("image", part);
            if let Some(features) = features {
                form = form.text("features", features);
            }
            client
                .post(format!("{base}/api/v1/analyze/upload"))
                .multipart(form)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if !status.is_success() {
        eprintln!("Error: proxy returned status {status}");
        std::process::exit(1);
    }
    Ok(())
}
