//! Test utilities for GoGarden
//!
//! In-memory providers, scriptable downloads and loaders, and builders for
//! display subjects, so cache behavior can be tested without a disk or a
//! network.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{CacheFixture, ImageSubjectBuilder};
pub use mocks::{MockDownloader, MockFileStore, MockImageLoader};
