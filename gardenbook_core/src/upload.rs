use bytes::Bytes;

use crate::error::ValidationErrors;

/// An uploaded file held in memory until it is stored as a blob column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: String,
}

impl Upload {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Records an error on `field` unless this is a non-empty image.
    pub fn validate_image(&self, errors: &mut ValidationErrors, field: &'static str) {
        if self.bytes.is_empty() {
            errors.add(field, "can't be empty");
        } else if !self.is_image() {
            errors.add(field, "must be an image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_image() {
        let mut errors = ValidationErrors::new();
        Upload::new(vec![1, 2, 3], "image/png").validate_image(&mut errors, "image");
        assert!(errors.is_empty());

        Upload::new(vec![1, 2, 3], "text/plain").validate_image(&mut errors, "image");
        Upload::new(Vec::new(), "image/png").validate_image(&mut errors, "avatar");
        assert_eq!(errors.messages_for("image"), vec!["must be an image"]);
        assert_eq!(errors.messages_for("avatar"), vec!["can't be empty"]);
    }
}
