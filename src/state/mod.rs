/// State management module
///
/// This module handles the data the UI works on:
/// - The on-disk image library (library.rs)
/// - Shared data structures: stored images, generation requests,
///   results and per-window job state (data.rs)

pub mod data;
pub mod library;
