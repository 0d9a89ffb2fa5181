use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9000;
const DEFAULT_URL: &str = "http://localhost";
const DEFAULT_STORAGE_DIR: &str = "./uploads";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub storage_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Single-file upload server")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL shown in the startup log (overrides URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Directory where uploaded files are stored (overrides UPLOAD_DIR)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_parts(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed args over variables read through `lookup`, falling back to defaults.
    pub fn from_parts<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = lookup("HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let env_port = match lookup("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => DEFAULT_PORT,
            Err(err) => return Err(err).context("reading PORT"),
        };
        let env_url = lookup("URL").unwrap_or_else(|_| DEFAULT_URL.into());
        let env_storage = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR));

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            base_url: args.url.unwrap_or(env_url),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address announced on startup; not used for binding.
    pub fn public_url(&self) -> String {
        format!("{}:{}", self.base_url, self.port)
    }
}
