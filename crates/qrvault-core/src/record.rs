//! Stored QR record model

use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::classify::Category;
use crate::{Error, Result};

/// Labels longer than this are elided in list views
pub const MAX_DISPLAY_LABEL: usize = 50;

/// Characters kept at each end of an elided label
const LABEL_ELISION_KEEP: usize = 15;

/// An encrypted QR payload with its metadata
///
/// Records are immutable: replacing one means delete + insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRecord {
    id: Uuid,
    label: String,
    ciphertext: Vec<u8>,
    date_added: DateTime<Utc>,
    cached_type: Option<String>,
}

impl QrRecord {
    /// Create a new record stamped now
    pub fn new(label: impl Into<String>, ciphertext: Vec<u8>) -> Result<Self> {
        Self::from_parts(Uuid::new_v4(), label.into(), ciphertext, Utc::now(), None)
    }

    /// Rebuild a record from stored fields, rejecting malformed ones
    pub fn from_parts(
        id: Uuid,
        label: String,
        ciphertext: Vec<u8>,
        date_added: DateTime<Utc>,
        cached_type: Option<String>,
    ) -> Result<Self> {
        if ciphertext.is_empty() {
            return Err(Error::InvalidRecord(format!("record {} has no ciphertext", id)));
        }
        if let Some(cached) = &cached_type {
            cached.parse::<Category>()?;
        }

        Ok(Self {
            id,
            label,
            ciphertext,
            date_added,
            cached_type,
        })
    }

    /// Attach the classified category
    pub fn with_category(mut self, category: Category) -> Self {
        self.cached_type = Some(category.label().to_string());
        self
    }

    /// Record id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// User label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Encrypted payload
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Creation time
    pub fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }

    /// Persisted category label, if classification was cached
    pub fn cached_type(&self) -> Option<&str> {
        self.cached_type.as_deref()
    }

    /// Cached category, short-circuiting classification
    pub fn cached_category(&self) -> Option<Category> {
        self.cached_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Label shortened for list views
    pub fn display_label(&self) -> String {
        let count = self.label.chars().count();
        if count <= MAX_DISPLAY_LABEL {
            return self.label.clone();
        }
        let head: String = self.label.chars().take(LABEL_ELISION_KEEP).collect();
        let tail: String = self.label.chars().skip(count - LABEL_ELISION_KEEP).collect();
        format!("{}...{}", head, tail)
    }

    /// Creation time in local time, `yyyy-MMM-dd hh:mm`
    pub fn display_date(&self) -> String {
        self.date_added
            .with_timezone(&Local)
            .format("%Y-%b-%d %I:%M")
            .to_string()
    }
}
