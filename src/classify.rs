//! MIME type classification for catalog imports

use serde::{Deserialize, Serialize};

/// Image MIME types the catalog can render
pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Video MIME types the catalog can render
pub const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];

/// Catalog category of an importable file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Classification result; `Unsupported` files are skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Supported(MediaKind),
    Unsupported,
}

/// Classify a MIME type by exact membership in the allow-lists.
///
/// No prefix matching: `image/svg+xml` is unsupported even though it looks
/// like an image.
pub fn classify(mime_type: &str) -> Classification {
    if IMAGE_MIME_TYPES.contains(&mime_type) {
        Classification::Supported(MediaKind::Image)
    } else if VIDEO_MIME_TYPES.contains(&mime_type) {
        Classification::Supported(MediaKind::Video)
    } else {
        Classification::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_image_type_is_image() {
        for mime in IMAGE_MIME_TYPES {
            assert_eq!(classify(mime), Classification::Supported(MediaKind::Image));
        }
    }

    #[test]
    fn test_every_video_type_is_video() {
        for mime in VIDEO_MIME_TYPES {
            assert_eq!(classify(mime), Classification::Supported(MediaKind::Video));
        }
    }

    #[test]
    fn test_unlisted_types_are_unsupported() {
        for mime in [
            "",
            "application/pdf",
            "image/svg+xml",
            "image/heic",
            "video/x-msvideo",
            "IMAGE/PNG",
            "image/png; charset=binary",
            "application/vnd.google-apps.folder",
            "not a mime type",
        ] {
            assert_eq!(classify(mime), Classification::Unsupported, "{mime}");
        }
    }

    #[test]
    fn test_media_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MediaKind::Image).unwrap(), "\"image\"");
        assert_eq!(serde_json::to_string(&MediaKind::Video).unwrap(), "\"video\"");
    }
}
