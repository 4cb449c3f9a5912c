//! HTTP request handlers for the DICOM render API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /render` - Render an uploaded DICOM file
//! - `POST /render/file` - Render a file from the configured source
//! - `GET /image/{*path}` - PNG of a file from the configured source
//! - `GET /files` - List DICOM files
//! - `GET /view/{*path}` - HTML viewer

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{IoError, ParseError, RenderError};
use crate::io::DicomSource;
use crate::render::{
    ImageMetadata, PixelRange, RenderOutput, RenderRequest, RenderService, Stage, WindowLevel,
    WindowRequest,
};

/// Header carrying the applied window width on image responses.
pub const WINDOW_WIDTH_HEADER: HeaderName = HeaderName::from_static("x-window-width");

/// Header carrying the applied window center on image responses.
pub const WINDOW_CENTER_HEADER: HeaderName = HeaderName::from_static("x-window-center");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the render service.
///
/// This is passed to all handlers via Axum's State extractor. It holds no
/// per-request data.
pub struct AppState<S: DicomSource> {
    /// The render service for processing requests
    pub render_service: Arc<RenderService<S>>,

    /// Cache-Control max-age in seconds for PNG responses
    pub cache_max_age: u32,
}

impl<S: DicomSource> AppState<S> {
    /// Create a new application state with the given render service.
    pub fn new(render_service: RenderService<S>) -> Self {
        Self {
            render_service: Arc::new(render_service),
            cache_max_age: 3600,
        }
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(render_service: RenderService<S>, cache_max_age: u32) -> Self {
        Self {
            render_service: Arc::new(render_service),
            cache_max_age,
        }
    }
}

impl<S: DicomSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            render_service: Arc::clone(&self.render_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for window selection.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQueryParams {
    /// Window width override
    #[serde(default)]
    pub window_width: Option<f64>,

    /// Window center override
    #[serde(default)]
    pub window_center: Option<f64>,

    /// Derive the window from the pixel range
    #[serde(default)]
    pub auto_window: bool,
}

impl WindowQueryParams {
    pub fn window_request(&self) -> WindowRequest {
        WindowRequest {
            width: self.window_width,
            center: self.window_center,
            auto: self.auto_window,
        }
    }
}

/// JSON body of `POST /render/file`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFileRequest {
    /// Key of the file within the configured source
    pub file_path: String,

    #[serde(default)]
    pub window_width: Option<f64>,

    #[serde(default)]
    pub window_center: Option<f64>,

    #[serde(default)]
    pub auto_window: bool,
}

impl RenderFileRequest {
    pub fn window_request(&self) -> WindowRequest {
        WindowRequest {
            width: self.window_width,
            center: self.window_center,
            auto: self.auto_window,
        }
    }
}

/// Query parameters for the files list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct FilesQueryParams {
    /// Filter by path prefix (e.g., "ct/series-1/")
    #[serde(default)]
    pub prefix: Option<String>,

    /// Case-insensitive substring filter on file keys
    #[serde(default)]
    pub search: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Error kind identifier (e.g., "not_found", "invalid_dicom")
    pub kind: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: kind.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        kind: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: message.into(),
            kind: kind.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Metadata block of a render response.
#[derive(Debug, Serialize)]
pub struct RenderMetadataResponse {
    #[serde(flatten)]
    pub image: ImageMetadata,

    #[serde(rename = "ImageWidth")]
    pub image_width: u32,

    #[serde(rename = "ImageHeight")]
    pub image_height: u32,

    /// Window actually applied
    pub window: WindowLevel,

    /// Raw sample range of the frame
    #[serde(rename = "pixelRange")]
    pub pixel_range: PixelRange,
}

/// Successful render: base64 PNG plus metadata.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub image: String,
    pub metadata: RenderMetadataResponse,
}

impl From<RenderOutput> for RenderResponse {
    fn from(output: RenderOutput) -> Self {
        Self {
            image: output.image_base64(),
            metadata: RenderMetadataResponse {
                image: output.metadata,
                image_width: output.width,
                image_height: output.height,
                window: output.window,
                pixel_range: output.range,
            },
        }
    }
}

/// Response from the files list endpoint.
#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn io_error_parts(err: &IoError) -> (StatusCode, &'static str, String) {
    match err {
        IoError::NotFound(path) => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("File not found: {}", path),
        ),
        IoError::InvalidPath(path) => (
            StatusCode::BAD_REQUEST,
            "invalid_path",
            format!("Invalid path: {}", path),
        ),
        IoError::Connection(msg) => (
            StatusCode::BAD_GATEWAY,
            "connection_error",
            format!("Connection error: {}", msg),
        ),
        IoError::S3(_) | IoError::Read(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "io_error",
            format!("Error reading DICOM file: {}", err),
        ),
    }
}

/// Log by severity and build the JSON error response.
///
/// - 5xx errors are logged at ERROR level (server errors)
/// - 404s are logged at DEBUG level
/// - other 4xx errors are logged at WARN level (client errors)
fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    if status.is_server_error() {
        error!(kind = kind, status = status.as_u16(), "Server error: {}", message);
    } else if status == StatusCode::NOT_FOUND {
        debug!(kind = kind, status = status.as_u16(), "Resource not found: {}", message);
    } else {
        warn!(kind = kind, status = status.as_u16(), "Client error: {}", message);
    }

    let body = ErrorResponse::with_status(kind, message, status);
    (status, Json(body)).into_response()
}

/// Convert RenderError to HTTP response.
impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            RenderError::Read(io_err) => io_error_parts(io_err),

            RenderError::Parse(
                ParseError::UnsupportedTransferSyntax(_) | ParseError::EncapsulatedPixelData,
            ) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_format",
                self.to_string(),
            ),

            RenderError::Parse(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_dicom",
                self.to_string(),
            ),

            RenderError::MissingPixelData => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing_pixel_data",
                self.to_string(),
            ),

            RenderError::UnsupportedBitDepth { .. } | RenderError::UnsupportedFormat { .. } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_format",
                self.to_string(),
            ),

            RenderError::EncodeError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                self.to_string(),
            ),
        };

        error_response(status, kind, message)
    }
}

/// Wrapper for listing errors to implement IntoResponse.
pub struct ListError(pub IoError);

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        let (status, kind, message) = io_error_parts(&self.0);
        error_response(status, kind, message)
    }
}

impl From<IoError> for ListError {
    fn from(err: IoError) -> Self {
        ListError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn json_render_response(output: RenderOutput) -> Json<RenderResponse> {
    debug!(
        stage = %Stage::Transmit,
        png_bytes = output.png.len(),
        "Sending render response"
    );
    Json(RenderResponse::from(output))
}

/// Render an uploaded DICOM file.
///
/// # Endpoint
///
/// `POST /render?window_width=&window_center=&auto_window=`
///
/// The request body is the raw Part-10 file.
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "image": "iVBORw0KGgo...",
///   "metadata": {
///     "PatientName": "DOE^JANE",
///     "Modality": "CT",
///     "WindowWidth": 400.0,
///     "WindowCenter": 40.0,
///     "ImageWidth": 512,
///     "ImageHeight": 512,
///     "window": { "width": 400.0, "center": 40.0 },
///     "pixelRange": { "min": -1024, "max": 3071 }
///   }
/// }
/// ```
///
/// # Errors
///
/// - `413 Payload Too Large`: Body exceeds the upload limit
/// - `415 Unsupported Media Type`: Compressed, color or unusual bit depth
/// - `422 Unprocessable Entity`: Not DICOM, malformed, or no pixel data
pub async fn render_upload_handler<S: DicomSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<WindowQueryParams>,
    body: Bytes,
) -> Result<Json<RenderResponse>, RenderError> {
    debug!(bytes = body.len(), "Received DICOM upload");

    let request = RenderRequest::from_bytes(body, query.window_request());
    let output = state.render_service.render(request).await?;

    Ok(json_render_response(output))
}

/// Render a file from the configured source.
///
/// # Endpoint
///
/// `POST /render/file`
///
/// # Request
///
/// ```json
/// { "filePath": "ct/slice-001.dcm", "windowWidth": 400, "windowCenter": 40 }
/// ```
///
/// # Errors
///
/// Same as `POST /render`, plus `404 Not Found` for missing files and
/// `400 Bad Request` for paths escaping the source root.
pub async fn render_file_handler<S: DicomSource>(
    State(state): State<AppState<S>>,
    Json(body): Json<RenderFileRequest>,
) -> Result<Json<RenderResponse>, RenderError> {
    let window = body.window_request();
    let request = RenderRequest::from_path(body.file_path, window);
    let output = state.render_service.render(request).await?;

    Ok(json_render_response(output))
}

/// Serve a rendered file as a PNG.
///
/// # Endpoint
///
/// `GET /image/{*path}?window_width=&window_center=&auto_window=`
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Window-Width`, `X-Window-Center`: window actually applied
pub async fn image_handler<S: DicomSource>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<WindowQueryParams>,
) -> Result<Response, RenderError> {
    let request = RenderRequest::from_path(path, query.window_request());
    let output = state.render_service.render(request).await?;

    debug!(
        stage = %Stage::Transmit,
        png_bytes = output.png.len(),
        "Sending PNG"
    );

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (WINDOW_WIDTH_HEADER, output.window.width.to_string()),
        (WINDOW_CENTER_HEADER, output.window.center.to_string()),
    ];

    Ok((StatusCode::OK, headers, output.png).into_response())
}

/// List DICOM files in the configured source.
///
/// # Endpoint
///
/// `GET /files?prefix=&search=`
///
/// # Response
///
/// ```json
/// { "files": ["ct/slice-001.dcm", "ct/slice-002.dcm"] }
/// ```
pub async fn files_handler<S: DicomSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<FilesQueryParams>,
) -> Result<Json<FilesResponse>, ListError> {
    let files = state
        .render_service
        .list(query.prefix.as_deref())
        .await?;

    // Apply search filter if provided (case-insensitive substring match)
    let files = match query.search {
        Some(ref search) if !search.is_empty() => {
            let search_lower = search.to_lowercase();
            files
                .into_iter()
                .filter(|f| f.to_lowercase().contains(&search_lower))
                .collect()
        }
        _ => files,
    };

    Ok(Json(FilesResponse { files }))
}

/// Serve the HTML viewer for one file.
///
/// # Endpoint
///
/// `GET /view/{*path}`
///
/// The file is rendered once with its stored window so the page can show
/// metadata and start its sliders from the applied values. Errors are the
/// same as for `GET /image/{*path}`.
pub async fn viewer_handler<S: DicomSource>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
) -> Result<Html<String>, RenderError> {
    let request = RenderRequest::from_path(path.clone(), WindowRequest::default());
    let output = state.render_service.render(request).await?;

    Ok(Html(super::viewer::generate_viewer_html(&path, &output)))
}

// =============================================================================
// Tests
// =============================================================================
