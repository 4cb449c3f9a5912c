//! HTTP server layer for the DICOM render API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     POST /render   POST /render/file   GET /image/{*path}       │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   viewer    │  │        routes           │  │
//! │  │ (requests)  │  │   (HTML)    │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod viewer;

pub use handlers::{
    files_handler, health_handler, image_handler, render_file_handler, render_upload_handler,
    viewer_handler, AppState, ErrorResponse, FilesQueryParams, FilesResponse, HealthResponse,
    ListError, RenderFileRequest, RenderMetadataResponse, RenderResponse, WindowQueryParams,
    WINDOW_CENTER_HEADER, WINDOW_WIDTH_HEADER,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
