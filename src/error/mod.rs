use crate::import::ImportError;
use crate::surface::SurfaceError;
use crate::tools::ToolError;
use thiserror::Error;

pub type SketchResult<T> = std::result::Result<T, SketchError>;

#[derive(Debug, Error)]
pub enum SketchError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Coarse classification hosts use to pick how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    Read,
    Internal,
}

impl SketchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Tool(ToolError::EmptyTextPlacement) => ErrorKind::Validation,
            Self::Import(ImportError::Decode(_) | ImportError::EmptyImage { .. }) => {
                ErrorKind::Decode
            }
            Self::Import(ImportError::Read { .. }) => ErrorKind::Read,
            Self::Import(ImportError::Cancelled(_) | ImportError::WorkerDisconnected)
            | Self::Surface(_) => ErrorKind::Internal,
        }
    }

    /// Short message suitable for a toast.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Text cannot be empty.",
            ErrorKind::Decode => "The selected file is not a supported image.",
            ErrorKind::Read => "Could not read the selected file.",
            ErrorKind::Internal => match self {
                Self::Surface(SurfaceError::FontUnavailable | SurfaceError::InvalidFont) => {
                    "No usable font is available for text."
                }
                Self::Surface(SurfaceError::Encode(_)) => "Could not export the drawing.",
                _ => "The drawing operation failed.",
            },
        }
    }
}
