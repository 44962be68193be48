//! Mock implementations for testing

mod downloader;
mod filesystem;
mod loader;

pub use downloader::MockDownloader;
pub use filesystem::MockFileStore;
pub use loader::MockImageLoader;
