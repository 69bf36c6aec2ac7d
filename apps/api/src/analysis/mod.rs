//! Course analysis pipeline: input → extractor → scoring → store, plus reports.

pub mod extractor;
pub mod handlers;
pub mod input;
pub mod report;
pub mod scoring;
pub mod store;
