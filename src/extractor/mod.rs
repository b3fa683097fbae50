// src/extractor/mod.rs

pub mod document;
pub mod navigator;

pub use document::{DocumentFetcher, PageDocument};
pub use navigator::{LectureLocation, PageDiscovery, StructureNavigator};
