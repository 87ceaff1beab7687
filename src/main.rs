use anyhow::Result;
use clap::Parser;
use image_edit_relay::ai::GeminiGenerationClient;
use image_edit_relay::models::Config;
use image_edit_relay::storage::StaticDirStore;
use image_edit_relay::web::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-edit-relay")]
#[command(about = "Relay image edit requests to Gemini and serve the results")]
struct CliArgs {
    /// Address to bind (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Directory generated images are written to and served from (overrides STATIC_DIR).
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,
}

impl CliArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_edit_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting image-edit-relay");

    let args = CliArgs::parse();
    let mut config = Config::from_env()?;
    args.apply(&mut config);

    if !config.provider_configured() {
        warn!("GEMINI_API_KEY is not set; /process-image will fail until it is configured");
    }

    let store = StaticDirStore::new(&config.static_dir);
    store.ensure_dir().await?;

    let state = AppState {
        generator: Arc::new(GeminiGenerationClient::from_config(
            &config,
            reqwest::Client::new(),
        )),
        store: Arc::new(store),
    };

    match web::run(&config, state).await {
        Ok(_) => {
            info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            error!("Server failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args =
            CliArgs::try_parse_from(["image-edit-relay", "--port", "8081", "--static-dir", "out"])
                .unwrap();
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.port, 8081);
        assert_eq!(config.static_dir, PathBuf::from("out"));
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_cli_rejects_invalid_port() {
        assert!(CliArgs::try_parse_from(["image-edit-relay", "--port", "99999"]).is_err());
    }
}
