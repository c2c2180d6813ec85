//! Error types for QR Vault core
//!
//! Payload interpretation errors. Classification itself never fails; these
//! surface from descriptor canonicalization, key decoding and record validation.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// QR Vault core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Descriptor text is not a syntactically valid output descriptor
    #[error("Descriptor parse error: {0}")]
    DescriptorParse(String),

    /// Extended public key failed to decode
    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),

    /// Payload is not an Account Map
    #[error("Invalid account map: {0}")]
    InvalidAccountMap(String),

    /// Record fields failed validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if error is caused by user-supplied content (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::DescriptorParse(_)
                | Error::InvalidExtendedKey(_)
                | Error::InvalidAccountMap(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::DescriptorParse(_) | Error::InvalidExtendedKey(_) => {
                "The wallet descriptor could not be read. Its fingerprint is based on the raw QR text instead.".to_string()
            }
            Error::InvalidAccountMap(_) => {
                "This QR code is not a valid account map.".to_string()
            }
            Error::InvalidRecord(_) => {
                "This saved item is damaged and cannot be shown.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DescriptorParse(_) | Error::InvalidExtendedKey(_) => ErrorCategory::Descriptor,
            Error::InvalidAccountMap(_) => ErrorCategory::Payload,
            Error::InvalidRecord(_) => ErrorCategory::Record,
            Error::Serialization(_) | Error::Other(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Descriptor or key material errors
    Descriptor,
    /// Payload format errors
    Payload,
    /// Record validation errors
    Record,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Descriptor => write!(f, "Descriptor"),
            ErrorCategory::Payload => write!(f, "Payload"),
            ErrorCategory::Record => write!(f, "Record"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detection() {
        assert!(Error::DescriptorParse("test".to_string()).is_user_error());
        assert!(Error::InvalidExtendedKey("test".to_string()).is_user_error());
        assert!(!Error::InvalidRecord("test".to_string()).is_user_error());
        assert!(!Error::Other("test".to_string()).is_user_error());
    }

    #[test]
    fn test_user_messages() {
        let msg = Error::DescriptorParse("details".to_string()).user_message();
        assert!(msg.contains("raw QR text"));

        let msg = Error::InvalidRecord("details".to_string()).user_message();
        assert!(msg.contains("damaged"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::DescriptorParse("test".to_string()).category(),
            ErrorCategory::Descriptor
        );
        assert_eq!(
            Error::InvalidAccountMap("test".to_string()).category(),
            ErrorCategory::Payload
        );
        assert_eq!(
            Error::InvalidRecord("test".to_string()).category(),
            ErrorCategory::Record
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Descriptor.to_string(), "Descriptor");
        assert_eq!(ErrorCategory::Internal.to_string(), "Internal");
    }
}
