use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use url::Url;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the audio gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the service descriptor
    Info,
    /// Check gateway health
    Health,
    /// List the audio formats available for a video URL
    Resolve {
        /// Video page URL
        video_url: String,
    },
    /// Download a file from the gateway's storage root
    Fetch {
        /// Name of the stored file
        filename: String,

        /// Where to write it (defaults to the filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let ok = match cli.command {
        Commands::Info => {
            let res = client.get(format!("{}/", base)).send().await?;
            print_response(res).await?
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?
        }
        Commands::Resolve { video_url } => {
            let res = client
                .post(format!("{}/api/download", base))
                .json(&json!({ "url": video_url }))
                .send()
                .await?;
            print_response(res).await?
        }
        Commands::Fetch { filename, output } => {
            let res = client.get(download_url(base, &filename)?).send().await?;
            if res.status().is_success() {
                let path = output.unwrap_or_else(|| PathBuf::from(&filename));
                let bytes = res.bytes().await?;
                tokio::fs::write(&path, &bytes).await?;
                println!("Saved {} bytes to {}", bytes.len(), path.display());
                true
            } else {
                print_response(res).await?
            }
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Print a JSON response; errors go to stderr. Returns whether it succeeded.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
        return Ok(false);
    }

    println!("{}", rendered);
    Ok(true)
}

/// `<base>/download/<filename>`, with the filename encoded as one segment.
fn download_url(base: &str, filename: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("gateway URL {} cannot have a path", base))?
        .pop_if_empty()
        .push("download")
        .push(filename);
    Ok(url)
}
