use std::{env, path::PathBuf};
use tokio::{fs::{create_dir_all, read_to_string, File}, io::AsyncWriteExt};
use serde::{Deserialize, Serialize};
use clap::Parser;
use crate::{error::Error, tools::log::{log_info, LogServiceType}, Result};

const ENV_PORT: &str = "FACEMIX_PORT";
const ENV_DIR: &str = "FACEMIX_DIR";
const ENV_CORS: &str = "FACEMIX_CORS";
const ENV_SWAP_HOST: &str = "FACEMIX_SWAP_HOST";
const ENV_SWAP_KEY: &str = "FACEMIX_SWAP_KEY";
const ENV_HOSTING_CLOUD: &str = "FACEMIX_HOSTING_CLOUD";
const ENV_HOSTING_PRESET: &str = "FACEMIX_HOSTING_PRESET";
const ENV_DETECTION_MODEL: &str = "FACEMIX_DETECTION_MODEL";

/// Process configuration, read once at startup and passed explicitly into the
/// controller. Credentials never live in process-global state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: Option<u16>,
    /// Allowed CORS origin; any origin when unset.
    pub cors: Option<String>,
    #[serde(default = "default_swap_host")]
    pub swap_host: String,
    pub swap_key: Option<String>,
    pub hosting_cloud: Option<String>,
    pub hosting_preset: Option<String>,
    #[serde(default = "default_poll_delay")]
    pub poll_delay_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// Path to the SeetaFace detection model used by align mode.
    pub detection_model: Option<String>,
}

fn default_swap_host() -> String {
    "faceswap3.p.rapidapi.com".to_owned()
}

fn default_poll_delay() -> u64 {
    1800
}

fn default_poll_attempts() -> u32 {
    5
}

impl ServerConfig {
    pub fn server_port(&self) -> u16 {
        self.port.unwrap_or(8080)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short = 'k', long)]
    docker: bool,

    #[arg(short, long)]
    dir: Option<String>,
}

pub async fn initialize_config() -> Result<ServerConfig> {
    let args = Args::parse();
    let local_path = get_server_local_path(&args).await?;
    log_info(LogServiceType::Register, format!("LocalPath: {:?}", local_path));
    get_config_with_overrides(&args).await
}

async fn get_server_local_path(args: &Args) -> Result<PathBuf> {
    let dir_path = if let Some(argdir) = &args.dir {
        PathBuf::from(argdir)
    } else if let Ok(val) = env::var(ENV_DIR) {
        PathBuf::from(&val)
    } else if args.docker {
        PathBuf::from("/config")
    } else {
        let Some(mut dir_path) = dirs::config_local_dir() else { return Err(Error::ServerUnableToAccessServerLocalFolder); };
        dir_path.push("facemix");
        dir_path
    };

    let Ok(_) = create_dir_all(&dir_path).await else { return Err(Error::ServerUnableToAccessServerLocalFolder); };

    Ok(dir_path)
}

async fn get_config_with_overrides(args: &Args) -> Result<ServerConfig> {
    let mut config = get_raw_config(args).await?;

    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(port) = env::var(ENV_PORT).ok().and_then(|p| p.parse::<u16>().ok()) {
        config.port = Some(port);
    }
    if let Ok(cors) = env::var(ENV_CORS) {
        config.cors = Some(cors);
    }
    if let Ok(host) = env::var(ENV_SWAP_HOST) {
        config.swap_host = host;
    }
    if let Ok(key) = env::var(ENV_SWAP_KEY) {
        config.swap_key = Some(key);
    }
    if let Ok(cloud) = env::var(ENV_HOSTING_CLOUD) {
        config.hosting_cloud = Some(cloud);
    }
    if let Ok(preset) = env::var(ENV_HOSTING_PRESET) {
        config.hosting_preset = Some(preset);
    }
    if let Ok(model) = env::var(ENV_DETECTION_MODEL) {
        config.detection_model = Some(model);
    }

    Ok(config)
}

async fn get_raw_config(args: &Args) -> Result<ServerConfig> {
    let mut dir_path: PathBuf = get_server_local_path(args).await?;
    dir_path.push("config.json");

    if let Ok(data) = read_to_string(dir_path.clone()).await {
        let Ok(config) = serde_json::from_str::<ServerConfig>(&data) else { return Err(Error::ServerMalformatedConfigFile); };
        Ok(config)
    } else {
        let new_config = ServerConfig::empty();
        let new_config_string = serde_json::to_string(&new_config)?;

        let Ok(mut file) = File::create(dir_path).await else { return Err(Error::ServerUnableToAccessServerLocalFolder); };
        file.write_all(new_config_string.as_bytes()).await?;
        Ok(new_config)
    }
}

impl ServerConfig {
    /// All defaults, nothing configured.
    pub fn empty() -> Self {
        serde_json::from_str(r#"{}"#).expect("empty config always deserializes")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults() {
        let config = ServerConfig::empty();
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.swap_host, "faceswap3.p.rapidapi.com");
        assert_eq!(config.poll_delay_ms, 1800);
        assert_eq!(config.poll_attempts, 5);
        assert!(config.cors.is_none());
        assert!(config.detection_model.is_none());
    }

    #[test]
    fn config_from_json() {
        let config: ServerConfig = serde_json::from_str(r#"{
            "port": 3000,
            "cors": "http://localhost:5173",
            "swap_key": "secret",
            "poll_delay_ms": 500,
            "poll_attempts": 3
        }"#).unwrap();
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.cors.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.poll_delay_ms, 500);
        assert_eq!(config.poll_attempts, 3);
    }
}
