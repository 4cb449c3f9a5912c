//! Configuration management for the DICOM render server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `DCM_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use dicom_render::config::{Cli, Command};
//!
//! match Cli::parse().command {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Render(config) => println!("Rendering {}", config.input.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! Options of the `serve` command can be set via environment variables with the `DCM_` prefix:
//!
//! - `DCM_HOST` - Server bind address (default: 0.0.0.0)
//! - `DCM_PORT` - Server port (default: 3000)
//! - `DCM_DATA_DIR` - Local directory holding DICOM files
//! - `DCM_S3_BUCKET` - S3 bucket holding DICOM files
//! - `DCM_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `DCM_S3_REGION` - AWS region (default: us-east-1)
//! - `DCM_MAX_UPLOAD_MB` - Upload size limit in MiB (default: 512)
//! - `DCM_PNG_COMPRESSION` - fast, default or best (default: default)
//! - `DCM_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `DCM_CORS_ORIGINS` - Comma-separated allowed origins

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::render::{PngCompression, WindowRequest};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default upload limit in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 512;

/// Largest accepted upload limit in MiB.
pub const MAX_UPLOAD_MB_LIMIT: usize = 4096;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// DICOM Render - window/level rendering of DICOM images.
///
/// Decodes uncompressed grayscale DICOM files and renders them as PNG,
/// either over HTTP or as a one-shot conversion.
#[derive(Parser, Debug, Clone)]
#[command(name = "dicom-render")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP render server
    Serve(ServeConfig),

    /// Render one DICOM file to PNG
    Render(RenderConfig),
}

/// Where the server reads DICOM files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Local(PathBuf),
    S3 { bucket: String },
}

/// Options of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DCM_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DCM_PORT")]
    pub port: u16,

    // =========================================================================
    // Source Configuration
    // =========================================================================
    /// Local directory containing DICOM files.
    #[arg(long, env = "DCM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// S3 bucket containing DICOM files.
    #[arg(long, env = "DCM_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "DCM_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "DCM_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Render Configuration
    // =========================================================================
    /// Maximum upload size in MiB for POST /render.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "DCM_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,

    /// PNG compression level (fast, default, best).
    #[arg(long, default_value = "default", env = "DCM_PNG_COMPRESSION")]
    pub png_compression: PngCompression,

    /// HTTP Cache-Control max-age in seconds for PNG responses.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "DCM_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DCM_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match (&self.data_dir, &self.s3_bucket) {
            (None, None) => {
                return Err(
                    "No DICOM source configured. Set --data-dir (DCM_DATA_DIR) or \
                     --s3-bucket (DCM_S3_BUCKET)"
                        .to_string(),
                )
            }
            (Some(_), Some(_)) => {
                return Err("--data-dir and --s3-bucket are mutually exclusive".to_string())
            }
            (None, Some(bucket)) if bucket.is_empty() => {
                return Err("S3 bucket name must not be empty".to_string())
            }
            _ => {}
        }

        if self.max_upload_mb == 0 || self.max_upload_mb > MAX_UPLOAD_MB_LIMIT {
            return Err(format!(
                "max_upload_mb must be between 1 and {}",
                MAX_UPLOAD_MB_LIMIT
            ));
        }

        Ok(())
    }

    /// The configured source. Call `validate()` first.
    pub fn source(&self) -> Option<SourceConfig> {
        match (&self.data_dir, &self.s3_bucket) {
            (Some(dir), None) => Some(SourceConfig::Local(dir.clone())),
            (None, Some(bucket)) => Some(SourceConfig::S3 {
                bucket: bucket.clone(),
            }),
            _ => None,
        }
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Options of the `render` command.
#[derive(Args, Debug, Clone)]
pub struct RenderConfig {
    /// DICOM file to render.
    pub input: PathBuf,

    /// Output PNG path (defaults to the input path with a .png extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Window width override.
    #[arg(long, allow_hyphen_values = true)]
    pub window_width: Option<f64>,

    /// Window center override.
    #[arg(long, allow_hyphen_values = true)]
    pub window_center: Option<f64>,

    /// Derive the window from the pixel range.
    #[arg(long, default_value_t = false)]
    pub auto_window: bool,

    /// Print metadata as JSON to stdout.
    #[arg(long, default_value_t = false)]
    pub print_metadata: bool,

    /// PNG compression level (fast, default, best).
    #[arg(long, default_value = "default")]
    pub png_compression: PngCompression,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.input.as_os_str().is_empty() {
            return Err("Input path must not be empty".to_string());
        }
        if self.output.as_deref() == Some(self.input.as_path()) {
            return Err("Output path must differ from the input path".to_string());
        }
        Ok(())
    }

    /// Resolved output path.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("png"))
    }

    pub fn window_request(&self) -> WindowRequest {
        WindowRequest {
            width: self.window_width,
            center: self.window_center,
            auto: self.auto_window,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
