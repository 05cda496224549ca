//! Error types for the photo-watermark crate.

use std::path::PathBuf;

/// Errors surfaced at the boundaries that touch the filesystem or parse user input.
///
/// Rendering itself never fails; only loading, saving, listing and config
/// persistence report errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An image file could not be opened or decoded.
    #[error("failed to load image {}: {source}", path.display())]
    Load {
        /// Path of the image that failed to load.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },

    /// An image could not be encoded or written.
    #[error("failed to save image {}: {source}", path.display())]
    Save {
        /// Destination path.
        path: PathBuf,
        /// Underlying encode error.
        source: image::ImageError,
    },

    /// A folder could not be listed.
    #[error("failed to read folder {}: {source}", path.display())]
    ReadDir {
        /// Folder that was being listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The config document could not be serialized.
    #[error("config serialization error: {0}")]
    Config(#[from] serde_json::Error),

    /// Template names must contain at least one non-whitespace character.
    #[error("template name must not be empty")]
    InvalidTemplateName,

    /// A color string was not `#RGB` or `#RRGGBB`.
    #[error("invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("gif".to_string());
        assert!(unsupported.to_string().contains("gif"));

        let read_dir = Error::ReadDir {
            path: PathBuf::from("/nowhere/photos"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = read_dir.to_string();
        assert!(msg.contains("/nowhere/photos"));
        assert!(msg.contains("missing"));

        let save = Error::Save {
            path: PathBuf::from("out/a_watermarked.png"),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )),
        };
        let msg = save.to_string();
        assert!(msg.contains("out/a_watermarked.png"));
        assert!(msg.contains("read-only"));

        let color = Error::InvalidColor("#12".to_string());
        assert!(color.to_string().contains("#12"));
    }
}
