//! Fallback state machine for one display slot

use super::loader::{ImageLoader, LoadFailure, attempt_load};
use super::{ImageSubject, Placeholder};
use crate::image_cache::{ImageCacheManager, ImageUri};
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// Waiting on the candidate at this index
    Trying(usize),
    /// The candidate at this index rendered
    Loaded(usize),
    /// Every candidate failed, or there were none
    Fallback,
}

/// Outcome of [`FallbackController::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Loaded { index: usize, uri: ImageUri },
    Placeholder(Placeholder),
}

/// Walks a subject's candidate images in order, never going back
#[derive(Debug, Clone)]
pub struct FallbackController {
    subject: ImageSubject,
    state: FallbackState,
    loaded_uri: Option<ImageUri>,
    attempts: Vec<usize>,
}

impl FallbackController {
    pub fn new(subject: ImageSubject) -> Self {
        let state = initial_state(&subject);
        Self {
            subject,
            state,
            loaded_uri: None,
            attempts: Vec::new(),
        }
    }

    pub fn subject(&self) -> &ImageSubject {
        &self.subject
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    /// Index of the candidate being tried or shown
    ///
    /// In the fallback state this is the last index that was tried.
    pub fn current_index(&self) -> usize {
        match self.state {
            FallbackState::Trying(index) | FallbackState::Loaded(index) => index,
            FallbackState::Fallback => self.attempts.last().copied().unwrap_or(0),
        }
    }

    pub fn current_candidate(&self) -> Option<&str> {
        match self.state {
            FallbackState::Trying(index) | FallbackState::Loaded(index) => {
                self.subject.images.get(index).map(String::as_str)
            }
            FallbackState::Fallback => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.state == FallbackState::Fallback
    }

    /// Indices whose outcome has been recorded, in order
    pub fn attempts(&self) -> &[usize] {
        &self.attempts
    }

    /// The current candidate rendered
    pub fn record_success(&mut self) -> FallbackState {
        if let FallbackState::Trying(index) = self.state {
            self.attempts.push(index);
            self.state = FallbackState::Loaded(index);
        }
        self.state
    }

    /// The current candidate failed: advance, or give up after the last one
    pub fn record_failure(&mut self) -> FallbackState {
        if let FallbackState::Trying(index) = self.state {
            self.attempts.push(index);
            let next = index + 1;
            self.state = if next < self.subject.images.len() {
                debug!(
                    "Image {next}/{} failed for {}, trying next",
                    self.subject.images.len(),
                    self.subject.name
                );
                FallbackState::Trying(next)
            } else {
                info!("All images failed for {}, showing placeholder", self.subject.name);
                FallbackState::Fallback
            };
        }
        self.state
    }

    /// Point this slot at `subject`
    ///
    /// Resets to the first candidate when the identity changed. Returns
    /// whether a reset happened.
    pub fn set_subject(&mut self, subject: ImageSubject) -> bool {
        if self.subject.same_identity(&subject) {
            self.subject = subject;
            return false;
        }
        *self = Self::new(subject);
        true
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        self.is_fallback()
            .then(|| Placeholder::for_subject(&self.subject))
    }

    /// Drive the state machine until something renders or nothing is left
    ///
    /// A decode failure on a cached file evicts that file so the next
    /// resolution downloads it again.
    pub async fn resolve(
        &mut self,
        cache: &ImageCacheManager,
        loader: &dyn ImageLoader,
    ) -> Resolution {
        while let FallbackState::Trying(index) = self.state {
            let url = self.subject.images[index].clone();

            match attempt_load(cache, loader, &url).await {
                Ok(uri) => {
                    self.record_success();
                    self.loaded_uri = Some(uri);
                }
                Err(failure) => {
                    debug!("Candidate {index} for {}: {failure}", self.subject.name);
                    if let LoadFailure::Decode {
                        uri: ImageUri::Local(_),
                        ..
                    } = &failure
                    {
                        cache.invalidate(&url).await;
                    }
                    self.record_failure();
                }
            }
        }

        match self.state {
            FallbackState::Loaded(index) => Resolution::Loaded {
                index,
                uri: self
                    .loaded_uri
                    .clone()
                    .unwrap_or_else(|| ImageUri::Remote(self.subject.images[index].clone())),
            },
            _ => Resolution::Placeholder(Placeholder::for_subject(&self.subject)),
        }
    }
}

fn initial_state(subject: &ImageSubject) -> FallbackState {
    if subject.images.is_empty() {
        FallbackState::Fallback
    } else {
        FallbackState::Trying(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::Season;

    fn subject(name: &str, count: usize) -> ImageSubject {
        ImageSubject::new(
            name,
            Season::Warm,
            (0..count)
                .map(|i| format!("https://cdn.example.com/{name}/{i}.jpg"))
                .collect(),
        )
    }

    #[test]
    fn test_empty_candidates_start_in_fallback() {
        let controller = FallbackController::new(subject("Okra", 0));
        assert!(controller.is_fallback());
        assert_eq!(controller.current_index(), 0);
        assert!(controller.current_candidate().is_none());
        assert_eq!(controller.placeholder().unwrap().title, "Okra");
    }

    #[test]
    fn test_exhaustion_visits_every_index_once() {
        let mut controller = FallbackController::new(subject("Kale", 3));
        assert_eq!(controller.state(), FallbackState::Trying(0));

        assert_eq!(controller.record_failure(), FallbackState::Trying(1));
        assert_eq!(controller.record_failure(), FallbackState::Trying(2));
        assert_eq!(controller.record_failure(), FallbackState::Fallback);
        assert_eq!(controller.attempts(), &[0, 1, 2]);

        assert_eq!(controller.record_failure(), FallbackState::Fallback);
        assert_eq!(controller.attempts(), &[0, 1, 2]);
        assert_eq!(controller.current_index(), 2);
    }

    #[test]
    fn test_success_is_terminal() {
        let mut controller = FallbackController::new(subject("Mint", 3));
        controller.record_failure();
        assert_eq!(controller.record_success(), FallbackState::Loaded(1));
        assert_eq!(controller.record_failure(), FallbackState::Loaded(1));
        assert_eq!(
            controller.current_candidate(),
            Some("https://cdn.example.com/Mint/1.jpg")
        );
        assert!(controller.placeholder().is_none());
    }

    #[test]
    fn test_subject_switch_resets() {
        let mut controller = FallbackController::new(subject("Kale", 2));
        controller.record_failure();
        controller.record_failure();
        assert!(controller.is_fallback());

        assert!(controller.set_subject(subject("Chard", 2)));
        assert_eq!(controller.state(), FallbackState::Trying(0));
        assert_eq!(controller.current_index(), 0);
        assert!(controller.attempts().is_empty());
    }

    #[test]
    fn test_same_subject_keeps_progress() {
        let mut controller = FallbackController::new(subject("Kale", 3));
        controller.record_failure();

        let mut refreshed = subject("Kale", 3);
        refreshed.season = Season::Cool;
        assert!(!controller.set_subject(refreshed));
        assert_eq!(controller.state(), FallbackState::Trying(1));
        assert_eq!(controller.subject().season, Season::Cool);
    }
}
