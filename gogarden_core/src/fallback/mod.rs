//! Multi-source image fallback
//!
//! A displayed plant or article carries an ordered list of candidate URLs.
//! [`FallbackController`] tries them in order through the image cache and
//! settles on a text placeholder once every candidate has failed.

pub mod controller;
pub mod loader;

pub use controller::{FallbackController, FallbackState, Resolution};
pub use loader::{DecodingLoader, ImageLoader, LoadFailure, attempt_load};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Growing season, only used to pick the placeholder glyph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Cool,
    #[default]
    Warm,
}

impl Season {
    pub fn glyph(self) -> &'static str {
        match self {
            Season::Cool => "❄️",
            Season::Warm => "☀️",
        }
    }

    /// Anything other than "cool" is a warm-season plant
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("cool") {
            Season::Cool
        } else {
            Season::Warm
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Cool => f.write_str("cool"),
            Season::Warm => f.write_str("warm"),
        }
    }
}

/// A logical entity with its candidate images, primary source first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSubject {
    pub name: String,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ImageSubject {
    pub fn new(name: impl Into<String>, season: Season, images: Vec<String>) -> Self {
        Self {
            name: name.into(),
            season,
            images,
        }
    }

    /// Same entity as far as a display slot is concerned
    pub fn same_identity(&self, other: &ImageSubject) -> bool {
        self.name == other.name && self.images == other.images
    }
}

/// What is shown once every candidate failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub title: String,
    pub glyph: &'static str,
}

impl Placeholder {
    pub fn for_subject(subject: &ImageSubject) -> Self {
        Self {
            title: subject.name.clone(),
            glyph: subject.season.glyph(),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.title, self.glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_glyphs() {
        assert_eq!(Season::Cool.glyph(), "❄️");
        assert_eq!(Season::Warm.glyph(), "☀️");
        assert_eq!(Season::parse_lenient("Cool"), Season::Cool);
        assert_eq!(Season::parse_lenient("spring"), Season::Warm);
    }

    #[test]
    fn test_placeholder_uses_name_and_season() {
        let subject = ImageSubject::new("Spinach", Season::Cool, vec![]);
        let placeholder = Placeholder::for_subject(&subject);
        assert_eq!(placeholder.title, "Spinach");
        assert_eq!(placeholder.to_string(), "Spinach ❄️");
    }

    #[test]
    fn test_subject_deserializes_with_defaults() {
        let subject: ImageSubject = serde_json::from_str(r#"{"name":"Okra"}"#).unwrap();
        assert_eq!(subject.season, Season::Warm);
        assert!(subject.images.is_empty());

        let cool: ImageSubject =
            serde_json::from_str(r#"{"name":"Kale","season":"cool","images":["https://x/k.jpg"]}"#)
                .unwrap();
        assert_eq!(cool.season, Season::Cool);
        assert_eq!(cool.images.len(), 1);
    }

    #[test]
    fn test_identity_covers_name_and_images() {
        let a = ImageSubject::new("Basil", Season::Warm, vec!["u1".into()]);
        let mut b = a.clone();
        assert!(a.same_identity(&b));

        b.season = Season::Cool;
        assert!(a.same_identity(&b));

        b.images.push("u2".into());
        assert!(!a.same_identity(&b));
    }
}
