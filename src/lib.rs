pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod import;
pub mod logging;
pub mod resize;
pub mod session;
pub mod surface;
pub mod tools;

pub use error::{ErrorKind, SketchError, SketchResult};
pub use geometry::{Color, SurfacePoint};
pub use history::HistoryStatus;
pub use import::{ImportOutcome, ImportSource};
pub use session::DrawingSession;
pub use tools::{PointerAffordance, ToolEvent};

/// Entrypoint for hosts: logging, user config, then a ready session.
pub fn open_session() -> DrawingSession {
    logging::init();
    let config = config::load_sketch_config();
    tracing::info!(
        width = config.surface_width,
        height = config.surface_height,
        "starting sketchpad"
    );
    DrawingSession::from_config(&config)
}
