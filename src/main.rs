//! DICOM Render - window/level rendering of DICOM images.
//!
//! This binary starts the HTTP server or renders a single file.

use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_render::{
    config::{Cli, Command, RenderConfig, ServeConfig, SourceConfig},
    io::{create_s3_client, DicomSource, LocalSource, S3Source},
    render::{render_dicom, PngRasterEncoder, RenderService},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Render(config) => run_render(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(source) = config.source() else {
        error!("Configuration error: no DICOM source configured");
        return ExitCode::FAILURE;
    };

    info!("DICOM Render v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  PNG compression: {}", config.png_compression);
    info!("  Upload limit: {} MiB", config.max_upload_mb);
    info!("  Cache max-age: {}s", config.cache_max_age);

    match source {
        SourceConfig::Local(root) => {
            info!("  Data directory: {}", root.display());
            if !root.is_dir() {
                error!("  {} is not a directory", root.display());
                return ExitCode::FAILURE;
            }
            serve(LocalSource::new(root), &config).await
        }
        SourceConfig::S3 { bucket } => {
            info!("  S3 bucket: {}", bucket);
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            serve(S3Source::new(client, bucket), &config).await
        }
    }
}

async fn serve<S: DicomSource + 'static>(source: S, config: &ServeConfig) -> ExitCode {
    // Listing doubles as a connectivity check
    match source.list(None).await {
        Ok(files) => info!("  Found {} DICOM file(s)", files.len()),
        Err(e) => {
            error!("  Failed to list DICOM files: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let encoder = PngRasterEncoder::with_compression(config.png_compression);
    let service = RenderService::new(source).with_encoder(encoder);
    let router = create_router(service, build_router_config(config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/files", addr);
    info!("    curl --data-binary @slice.dcm http://{}/render", addr);
    info!("");
    info!("  View images in your browser:");
    info!("    open http://{}/view/<path>", addr);
    info!("────────────────────────────────────────────────────────────────");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dicom_render=debug,tower_http=debug"
    } else {
        "dicom_render=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_max_upload_bytes(config.max_upload_bytes())
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let bytes = match tokio::fs::read(&config.input).await {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let encoder = PngRasterEncoder::with_compression(config.png_compression);
    let output = match render_dicom(bytes, &config.window_request(), &encoder) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output_path = config.output_path();
    if let Err(e) = tokio::fs::write(&output_path, &output.png).await {
        eprintln!("Error: cannot write {}: {}", output_path.display(), e);
        return ExitCode::FAILURE;
    }

    if config.print_metadata {
        match serde_json::to_string_pretty(&output.metadata) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize metadata: {}", e),
        }
    }

    eprintln!(
        "Wrote {} ({}x{}, window {}/{})",
        output_path.display(),
        output.width,
        output.height,
        output.window.width,
        output.window.center
    );

    ExitCode::SUCCESS
}
