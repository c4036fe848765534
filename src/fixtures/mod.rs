//! Synthetic data for exercising the writer

pub mod posts;

pub use posts::{PostEntity, SeedOptions, seed_posts};
