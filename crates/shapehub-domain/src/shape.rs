//! Shape record domain model

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::stencil::StencilRef;
use crate::wire::WireShape;

/// Catalog identifier of a shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ShapeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One catalog entry.
///
/// Everything except `payload` is fixed once the record is decoded. The
/// payload is a write-once cell: the first successful fetch fills it and no
/// later write can replace or clear it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireShape", into = "WireShape")]
pub struct ShapeRecord {
    pub id: ShapeId,
    pub name: String,
    /// Comma-separated free text, matched case-insensitively
    pub keywords: String,
    pub prompt: Option<String>,
    pub uploader_id: String,
    pub uploader_name: String,
    pub team_id: Option<u64>,
    pub team_name: Option<String>,
    pub upload_date: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
    pub download_count: u64,
    pub rating: Option<f64>,
    pub stencil: Option<StencilRef>,
    payload: OnceLock<Payload>,
}

impl ShapeRecord {
    /// Create a record with required fields
    pub fn new(id: impl Into<ShapeId>, name: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            keywords: keywords.into(),
            prompt: None,
            uploader_id: String::new(),
            uploader_name: String::new(),
            team_id: None,
            team_name: None,
            upload_date: None,
            last_update: None,
            download_count: 0,
            rating: None,
            stencil: None,
            payload: OnceLock::new(),
        }
    }

    /// Builder method to set the uploader
    pub fn with_uploader(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.uploader_id = id.into();
        self.uploader_name = name.into();
        self
    }

    /// Builder method to set the owning team
    pub fn with_team(mut self, id: u64, name: impl Into<String>) -> Self {
        self.team_id = Some(id);
        self.team_name = Some(name.into());
        self
    }

    pub fn with_upload_date(mut self, date: DateTime<Utc>) -> Self {
        self.upload_date = Some(date);
        self
    }

    pub fn with_downloads(mut self, count: u64) -> Self {
        self.download_count = count;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_stencil(mut self, stencil: StencilRef) -> Self {
        self.stencil = Some(stencil);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Keyword tokens: split on comma, trimmed, lower-cased, empties dropped
    pub fn keyword_tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.keywords
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
    }

    /// Name shown as the uploader; a team takes precedence over its member
    pub fn display_uploader(&self) -> &str {
        match self.team_name.as_deref() {
            Some(team) if !team.is_empty() => team,
            _ => &self.uploader_name,
        }
    }

    /// Rating used for ordering; unrated shapes rank as zero
    pub fn rating_value(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// The cached payload, if it has been fetched this session
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.get()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.get().is_some()
    }

    /// Copy of the metadata with an empty payload cache
    pub fn detached(&self) -> Self {
        Self {
            payload: OnceLock::new(),
            ..self.clone()
        }
    }

    /// Cache a fetched payload.
    ///
    /// Returns `true` if this call filled the cache, `false` if a payload was
    /// already present (the existing one is kept).
    pub fn cache_payload(&self, payload: Payload) -> bool {
        self.payload.set(payload).is_ok()
    }
}

impl From<WireShape> for ShapeRecord {
    fn from(wire: WireShape) -> Self {
        let stencil = wire.stencil_id.map(|stencil_id| StencilRef {
            stencil_id,
            file_name: wire.stencil_file_name.unwrap_or_default(),
            title: wire.stencil_title,
        });

        Self {
            id: ShapeId(wire.id),
            name: wire.name,
            keywords: wire.keywords,
            prompt: wire.prompt,
            uploader_id: wire.user_id,
            uploader_name: wire.user_name,
            team_id: wire.team_id,
            team_name: wire.team_name,
            upload_date: wire.upload_date,
            last_update: wire.last_update,
            download_count: wire.download_count,
            rating: wire.rating,
            stencil,
            payload: OnceLock::new(),
        }
    }
}

impl From<ShapeRecord> for WireShape {
    fn from(record: ShapeRecord) -> Self {
        let (stencil_id, stencil_file_name, stencil_title) = match record.stencil {
            Some(s) => (Some(s.stencil_id), Some(s.file_name), s.title),
            None => (None, None, None),
        };

        Self {
            id: record.id.0,
            upload_date: record.upload_date,
            last_update: record.last_update,
            name: record.name,
            prompt: record.prompt,
            keywords: record.keywords,
            stencil_id,
            stencil_file_name,
            stencil_title,
            user_id: record.uploader_id,
            user_name: record.uploader_name,
            team_id: record.team_id,
            team_name: record.team_name,
            download_count: record.download_count,
            rating: record.rating,
        }
    }
}
