//! Builders and fixtures for test scenarios

mod cache;
mod subject;

pub use cache::CacheFixture;
pub use subject::ImageSubjectBuilder;
