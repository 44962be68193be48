//! Scriptable image loader for testing

use async_trait::async_trait;
use gogarden_core::{ImageLoader, ImageUri, LoadFailure};
use std::sync::Mutex;

/// Mock [`ImageLoader`] that fails URIs matching configured fragments
///
/// A URI matches when its displayable form contains the fragment. Every
/// URI passed to `load` is recorded.
#[derive(Default)]
pub struct MockImageLoader {
    behavior: Mutex<LoaderBehavior>,
}

#[derive(Default)]
struct LoaderBehavior {
    fail_all: bool,
    unavailable: Vec<String>,
    undecodable: Vec<String>,
    loaded: Vec<ImageUri>,
}

impl MockImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every load as unavailable
    pub fn fail_all(&self) {
        self.behavior.lock().unwrap().fail_all = true;
    }

    /// Fail URIs containing `fragment` as unavailable
    pub fn fail_for(&self, fragment: impl Into<String>) {
        self.behavior
            .lock()
            .unwrap()
            .unavailable
            .push(fragment.into());
    }

    /// Fail URIs containing `fragment` as undecodable
    pub fn decode_fail_for(&self, fragment: impl Into<String>) {
        self.behavior
            .lock()
            .unwrap()
            .undecodable
            .push(fragment.into());
    }

    /// Every URI passed to `load`, in order
    pub fn loaded(&self) -> Vec<ImageUri> {
        self.behavior.lock().unwrap().loaded.clone()
    }
}

#[async_trait]
impl ImageLoader for MockImageLoader {
    async fn load(&self, uri: &ImageUri) -> Result<(), LoadFailure> {
        let mut behavior = self.behavior.lock().unwrap();
        behavior.loaded.push(uri.clone());

        let text = uri.as_str();
        if behavior
            .undecodable
            .iter()
            .any(|fragment| text.contains(fragment.as_str()))
        {
            return Err(LoadFailure::decode(uri, "mock decode failure"));
        }
        if behavior.fail_all
            || behavior
                .unavailable
                .iter()
                .any(|fragment| text.contains(fragment.as_str()))
        {
            return Err(LoadFailure::unavailable("mock load failure"));
        }
        Ok(())
    }
}
