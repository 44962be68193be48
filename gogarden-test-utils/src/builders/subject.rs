//! Builder for display subjects

use gogarden_core::{ImageSubject, Season};

/// Builder for [`ImageSubject`] values
///
/// # Examples
///
/// ```rust,no_run
/// use gogarden_test_utils::ImageSubjectBuilder;
///
/// let kale = ImageSubjectBuilder::new("Kale").cool().with_candidates(3).build();
/// assert_eq!(kale.images.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ImageSubjectBuilder {
    name: String,
    season: Season,
    images: Vec<String>,
}

impl ImageSubjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            season: Season::Warm,
            images: Vec::new(),
        }
    }

    pub fn cool(mut self) -> Self {
        self.season = Season::Cool;
        self
    }

    pub fn warm(mut self) -> Self {
        self.season = Season::Warm;
        self
    }

    /// Append one candidate URL
    pub fn with_image(mut self, url: &str) -> Self {
        self.images.push(url.to_string());
        self
    }

    /// Append `count` generated candidates under a CDN host
    pub fn with_candidates(mut self, count: usize) -> Self {
        let slug = self.slug();
        let start = self.images.len();
        self.images.extend(
            (start..start + count).map(|i| format!("https://cdn.example.com/{slug}/{i}.jpg")),
        );
        self
    }

    pub fn build(self) -> ImageSubject {
        ImageSubject::new(self.name, self.season, self.images)
    }

    fn slug(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect()
    }
}
