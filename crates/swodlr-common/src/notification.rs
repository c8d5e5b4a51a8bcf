//! CNM-R notification parsing
//!
//! Turns a granule-available notification (a CNM-R message carrying a
//! "file product") into a [`Granule`]. Two message shapes arrive on the
//! ingest queue: messages that carry an explicit `identifier` and messages
//! where the granule id has to be derived from the data file name. Both are
//! handled by [`Notification`].
//!
//! File selection runs in two passes. The primary acceptance rule is tried
//! against every file first; only when nothing matches is the fallback rule
//! tried. Which rule is primary is part of [`ParserConfig`].

use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::error::{Result, SwodlrError};
use crate::types::Granule;

/// Default accepted data file extension
pub const DEFAULT_ACCEPTED_EXTENSION: &str = "nc";

/// Declared file type accepted by [`AcceptRule::DataType`]
pub const DATA_FILE_TYPE: &str = "data";

/// One candidate file in a file product
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductFile {
    pub name: String,
    pub uri: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
}

/// The `product` section of a CNM-R message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileProduct {
    pub files: Vec<ProductFile>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    identifier: Option<String>,
    product: FileProduct,
}

/// An inbound granule notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The message names its granule
    Identified {
        identifier: String,
        product: FileProduct,
    },
    /// The granule id must be derived from the accepted file name
    Anonymous { product: FileProduct },
}

/// Rule deciding whether a candidate file is the granule's data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptRule {
    /// File name suffix is in the accepted extension list
    Extension,
    /// Declared file type is `data`
    DataType,
}

/// Where the granule id comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Use the message identifier when present, else the file name stem
    PreferIdentifier,
    /// Always derive the id from the file name
    Filename,
}

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Lowercase extensions without the leading dot
    pub accepted_extensions: Vec<String>,
    pub primary: AcceptRule,
    pub id_source: IdSource,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec![DEFAULT_ACCEPTED_EXTENSION.to_string()],
            primary: AcceptRule::Extension,
            id_source: IdSource::PreferIdentifier,
        }
    }
}

impl ParserConfig {
    /// Replace the accepted extensions from a comma separated list
    pub fn with_extensions(mut self, list: &str) -> Self {
        self.accepted_extensions = list
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    fn accepts(&self, rule: AcceptRule, file: &ProductFile) -> bool {
        match rule {
            AcceptRule::Extension => Path::new(&file.name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_lowercase();
                    self.accepted_extensions.iter().any(|accepted| *accepted == ext)
                })
                .unwrap_or(false),
            AcceptRule::DataType => file.file_type.as_deref() == Some(DATA_FILE_TYPE),
        }
    }
}

impl AcceptRule {
    /// The rule tried when this one matches nothing
    pub fn fallback(self) -> Self {
        match self {
            AcceptRule::Extension => AcceptRule::DataType,
            AcceptRule::DataType => AcceptRule::Extension,
        }
    }
}

impl std::str::FromStr for AcceptRule {
    type Err = SwodlrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "extension" | "ext" => Ok(AcceptRule::Extension),
            "type" | "data_type" | "data" => Ok(AcceptRule::DataType),
            other => Err(SwodlrError::Config(format!("Invalid file selection rule: {}", other))),
        }
    }
}

impl std::str::FromStr for IdSource {
    type Err = SwodlrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "identifier" | "payload" => Ok(IdSource::PreferIdentifier),
            "filename" | "file" => Ok(IdSource::Filename),
            other => Err(SwodlrError::Config(format!("Invalid granule id source: {}", other))),
        }
    }
}

impl Notification {
    /// Decode a CNM-R message body
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawMessage = serde_json::from_str(body)?;

        Ok(match raw.identifier.filter(|id| !id.trim().is_empty()) {
            Some(identifier) => Notification::Identified {
                identifier,
                product: raw.product,
            },
            None => Notification::Anonymous {
                product: raw.product,
            },
        })
    }

    pub fn product(&self) -> &FileProduct {
        match self {
            Notification::Identified { product, .. } | Notification::Anonymous { product } => {
                product
            },
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Notification::Identified { identifier, .. } => Some(identifier),
            Notification::Anonymous { .. } => None,
        }
    }

    /// Pick the data file and build the granule
    pub fn to_granule(&self, config: &ParserConfig) -> Result<Granule> {
        let file = select_file(self.product(), config)?;
        let url = canonical_url(&file.uri)?;

        let id = match (config.id_source, self.identifier()) {
            (IdSource::PreferIdentifier, Some(identifier)) => identifier.to_string(),
            _ => filename_stem(&file.name).to_string(),
        };

        if id.is_empty() {
            return Err(SwodlrError::MalformedPayload(format!(
                "Cannot derive a granule id from file name '{}'",
                file.name
            )));
        }

        Ok(Granule {
            id,
            filename: file.name.clone(),
            url,
        })
    }
}

/// Decode a notification body and turn it into a granule
pub fn parse_notification(body: &str, config: &ParserConfig) -> Result<Granule> {
    Notification::from_json(body)?.to_granule(config)
}

/// Find the granule's data file, trying the primary rule before the fallback
pub fn select_file<'a>(product: &'a FileProduct, config: &ParserConfig) -> Result<&'a ProductFile> {
    for rule in [config.primary, config.primary.fallback()] {
        if let Some(file) = product.files.iter().find(|file| config.accepts(rule, file)) {
            return Ok(file);
        }

        for file in &product.files {
            debug!(file = %file.name, rule = ?rule, "Rejected file");
        }
    }

    Err(SwodlrError::DataNotFound)
}

/// Rewrite a file URI into `s3://bucket/key` form.
///
/// `s3://` URIs pass through untouched. Any other URI, including a bare
/// path, is expected to carry `/<bucket>/<key...>` as its path, as archive
/// HTTPS links do. The key is copied as written: no percent-encoding and no
/// dot-segment removal, so it names the same object as the notification.
pub fn canonical_url(uri: &str) -> Result<String> {
    let path = if let Some(rest) = uri.strip_prefix("//") {
        after_authority(rest)
    } else if uri.starts_with('/') {
        uri
    } else {
        let parsed = Url::parse(uri)
            .map_err(|e| SwodlrError::MalformedPayload(format!("Invalid file uri '{}': {}", uri, e)))?;
        if parsed.scheme() == "s3" {
            return Ok(uri.to_string());
        }

        match uri.split_once("://") {
            Some((_, rest)) => after_authority(rest),
            None => uri.split_once(':').map_or("", |(_, rest)| rest),
        }
    };

    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);

    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            let s3_url = format!("s3://{}/{}", bucket, key);
            debug!(uri = %uri, s3_url = %s3_url, "Rewrote file uri");
            Ok(s3_url)
        },
        _ => Err(SwodlrError::MalformedPayload(format!(
            "File uri '{}' has no bucket/key path",
            uri
        ))),
    }
}

/// Raw path following the authority of a `scheme://authority/path` tail
fn after_authority(rest: &str) -> &str {
    rest.find('/').map_or("", |index| &rest[index..])
}

/// File name up to the first `.`
pub fn filename_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}
