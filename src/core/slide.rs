//! # Slides and Sequences
//!
//! A `Sequence` is an ordered, non-empty list of `Slide`s played as one
//! session. Sequences are validated once at construction, so the engine
//! never has to deal with an empty list.
//!
//! Sequence files are TOML:
//!
//! ```toml
//! id = "summer-deals"          # optional, a UUID is generated if missing
//! title = "Summer deals"
//! icon = "icons/sun.png"
//!
//! [[slides]]
//! id = "boat"
//! media = "img/boat.jpg"
//! title = "Sailing boat"
//! detail = "Oslo"
//! price = "120 000 kr"
//! favorite = true              # optional
//! duration_seconds = 4.0       # optional, falls back to the configured default
//! ```

use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Opaque resource locator for a slide's media (a URL or a path relative to
/// the fetcher's base URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a random UUID v4 id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of content: media plus caption fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: String,
    /// `None` renders the placeholder immediately.
    pub media_ref: Option<MediaRef>,
    pub title: String,
    pub detail: Option<String>,
    pub price: Option<String>,
    /// Initial favorite state, as known by the host app.
    pub favorite: bool,
    pub duration: Duration,
}

impl Slide {
    pub fn new(id: impl Into<String>, media_ref: Option<MediaRef>, duration: Duration) -> Self {
        Self {
            id: id.into(),
            media_ref,
            title: String::new(),
            detail: None,
            price: None,
            favorite: false,
            duration,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// Errors raised while building or loading a sequence.
#[derive(Debug)]
pub enum SequenceError {
    /// A sequence needs at least one slide.
    Empty,
    /// A slide would finish its progress instantly.
    ZeroDuration { slide_id: String },
    /// `duration_seconds` is not a usable number of seconds.
    InvalidDuration { slide_id: String, seconds: f64 },
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Empty => write!(f, "invalid sequence: no slides"),
            SequenceError::ZeroDuration { slide_id } => {
                write!(f, "invalid sequence: slide '{slide_id}' has a zero duration")
            }
            SequenceError::InvalidDuration { slide_id, seconds } => {
                write!(f, "invalid sequence: slide '{slide_id}' has duration {seconds}s")
            }
            SequenceError::Io(e) => write!(f, "sequence I/O error: {e}"),
            SequenceError::Parse(e) => write!(f, "sequence parse error: {e}"),
        }
    }
}

impl std::error::Error for SequenceError {}

/// Ordered, non-empty collection of slides.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    id: SequenceId,
    title: Option<String>,
    icon: Option<MediaRef>,
    slides: Vec<Slide>,
}

impl Sequence {
    pub fn new(id: SequenceId, slides: Vec<Slide>) -> Result<Self, SequenceError> {
        if slides.is_empty() {
            return Err(SequenceError::Empty);
        }
        if let Some(slide) = slides.iter().find(|s| s.duration.is_zero()) {
            return Err(SequenceError::ZeroDuration {
                slide_id: slide.id.clone(),
            });
        }
        Ok(Self {
            id,
            title: None,
            icon: None,
            slides,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: MediaRef) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn id(&self) -> &SequenceId {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&MediaRef> {
        self.icon.as_ref()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.slides.len() - 1
    }
}

// ============================================================================
// Sequence files
// ============================================================================

#[derive(Debug, Deserialize)]
struct SequenceFile {
    id: Option<String>,
    title: Option<String>,
    icon: Option<MediaRef>,
    #[serde(default)]
    slides: Vec<SlideEntry>,
}

#[derive(Debug, Deserialize)]
struct SlideEntry {
    id: Option<String>,
    media: Option<MediaRef>,
    #[serde(default)]
    title: String,
    detail: Option<String>,
    price: Option<String>,
    #[serde(default)]
    favorite: bool,
    duration_seconds: Option<f64>,
}

/// Parses a TOML sequence. Slides without `duration_seconds` use
/// `default_duration`; slides without an id are numbered by position.
pub fn parse_sequence(contents: &str, default_duration: Duration) -> Result<Sequence, SequenceError> {
    let file: SequenceFile = toml::from_str(contents).map_err(SequenceError::Parse)?;

    let slides = file
        .slides
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let id = entry.id.unwrap_or_else(|| format!("slide-{i}"));
            // Media refs written as "" mean "no image".
            let media_ref = entry.media.filter(|m| !m.as_str().is_empty());
            let duration = match entry.duration_seconds {
                Some(secs) if secs.is_nan() => {
                    return Err(SequenceError::InvalidDuration {
                        slide_id: id,
                        seconds: secs,
                    });
                }
                Some(secs) if secs <= 0.0 => Duration::ZERO,
                Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                    SequenceError::InvalidDuration {
                        slide_id: id.clone(),
                        seconds: secs,
                    }
                })?,
                None => default_duration,
            };
            Ok(Slide {
                id,
                media_ref,
                title: entry.title,
                detail: entry.detail,
                price: entry.price,
                favorite: entry.favorite,
                duration,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let id = file.id.map(SequenceId::new).unwrap_or_else(SequenceId::generate);
    let mut sequence = Sequence::new(id, slides)?;
    sequence.title = file.title;
    sequence.icon = file.icon.filter(|m| !m.as_str().is_empty());
    debug!(
        "Parsed sequence {} with {} slides",
        sequence.id,
        sequence.len()
    );
    Ok(sequence)
}

/// Loads a sequence file from disk.
pub fn load_sequence(path: &Path, default_duration: Duration) -> Result<Sequence, SequenceError> {
    let contents = fs::read_to_string(path).map_err(SequenceError::Io)?;
    let sequence = parse_sequence(&contents, default_duration)?;
    info!(
        "Loaded sequence {} ({} slides) from {}",
        sequence.id,
        sequence.len(),
        path.display()
    );
    Ok(sequence)
}
