//! Generated content encoding
//!
//! Media results travel as `data:` URLs; anything else is plain text. The
//! prefix alone decides how a result is displayed and exported.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Audio,
    Text,
}

impl ContentKind {
    pub fn of(content: &str) -> Self {
        if content.starts_with("data:image") {
            ContentKind::Image
        } else if content.starts_with("data:audio") {
            ContentKind::Audio
        } else {
            ContentKind::Text
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, ContentKind::Text)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContentKind::Audio => "mp3",
            ContentKind::Image => "png",
            ContentKind::Text => "txt",
        }
    }
}

/// Encode raw bytes as `data:<mime>;base64,<payload>`.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a base64 `data:` URL. Returns `None` for plain text or for
    /// non-base64 data URLs.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self {
            mime: mime.to_string(),
            bytes,
        })
    }
}

/// Where an export was triggered from; only affects the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOrigin {
    Generator,
    History,
}

pub fn export_extension(content: &str) -> &'static str {
    ContentKind::of(content).extension()
}

pub fn export_file_name(content: &str, origin: ExportOrigin, timestamp_ms: i64) -> String {
    let prefix = match origin {
        ExportOrigin::Generator => "generated",
        ExportOrigin::History => "history-generated",
    };
    format!("{}-{}.{}", prefix, timestamp_ms, export_extension(content))
}

/// Write `content` into `dir`, decoding media payloads to their raw bytes.
pub fn export(content: &str, dir: &Path, origin: ExportOrigin) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;

    let path = dir.join(export_file_name(
        content,
        origin,
        chrono::Utc::now().timestamp_millis(),
    ));

    let bytes = if ContentKind::of(content).is_media() {
        DataUrl::parse(content)
            .ok_or_else(|| anyhow!("Generated media is not a valid base64 data URL"))?
            .bytes
    } else {
        content.as_bytes().to_vec()
    };

    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!(path = %path.display(), "exported generated content");
    Ok(path)
}
