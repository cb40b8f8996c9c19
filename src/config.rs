use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf};

/// Per-upload byte cap (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Hosting environment. Only changes the default upload directory.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        Self::from_str(value, true)
            .map_err(|err| anyhow::anyhow!(err))
            .with_context(|| format!("parsing PHOTO_VOLUME_ENVIRONMENT value `{}`", value))
    }

    /// Local folder for development, the mounted volume in production.
    fn default_upload_path(self) -> PathBuf {
        match self {
            Environment::Development => PathBuf::from("./wwwroot/uploads"),
            Environment::Production => PathBuf::from("/uploads"),
        }
    }
}

/// Settings of the photo upload section, handed to each photo service.
#[derive(Debug, Clone)]
pub struct PhotoUploadConfig {
    pub upload_path: PathBuf,
    pub max_upload_bytes: u64,
}

impl PhotoUploadConfig {
    pub fn new(upload_path: impl Into<PathBuf>) -> Self {
        Self {
            upload_path: upload_path.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_url: String,
    pub migrations_dir: PathBuf,
    pub photo_upload: PhotoUploadConfig,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Photo upload service backed by a persistent volume")]
pub struct Args {
    /// Host to bind to (overrides PHOTO_VOLUME_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PHOTO_VOLUME_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Hosting environment (overrides PHOTO_VOLUME_ENVIRONMENT)
    #[arg(long, value_enum)]
    pub environment: Option<Environment>,

    /// Database URL (overrides PHOTO_VOLUME_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory holding the SQL migrations (overrides PHOTO_VOLUME_MIGRATIONS_DIR)
    #[arg(long)]
    pub migrations_dir: Option<PathBuf>,

    /// Directory where photos are stored (overrides PHOTO_UPLOAD_PATH)
    #[arg(long)]
    pub upload_path: Option<PathBuf>,

    /// Per-upload size cap in bytes (overrides PHOTO_UPLOAD_MAX_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// Merge CLI arguments over values found through `lookup`, then defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };

        // --- Environment fallback ---
        let env_host = var("PHOTO_VOLUME_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match var("PHOTO_VOLUME_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PHOTO_VOLUME_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_environment = match var("PHOTO_VOLUME_ENVIRONMENT")? {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Production,
        };
        let env_db = var("PHOTO_VOLUME_DATABASE_URL")?
            .unwrap_or_else(|| "sqlite://./data/identity.db".into());
        let env_migrations = var("PHOTO_VOLUME_MIGRATIONS_DIR")?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./migrations"));
        let env_upload_path = var("PHOTO_UPLOAD_PATH")?.map(PathBuf::from);
        let env_max_bytes = match var("PHOTO_UPLOAD_MAX_BYTES")? {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("parsing PHOTO_UPLOAD_MAX_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        // --- Merge ---
        let environment = args.environment.unwrap_or(env_environment);
        let upload_path = args
            .upload_path
            .or(env_upload_path)
            .unwrap_or_else(|| environment.default_upload_path());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            environment,
            database_url: args.database_url.unwrap_or(env_db),
            migrations_dir: args.migrations_dir.unwrap_or(env_migrations),
            photo_upload: PhotoUploadConfig {
                upload_path,
                max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_bytes),
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
