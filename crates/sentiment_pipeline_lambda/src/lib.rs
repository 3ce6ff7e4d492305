//! Runtime integration for the sentiment-analysis pipeline.
//!
//! This crate owns the stage handlers and their runtime seams: the object
//! store and downloader adapter traits, archive extraction, and the
//! function-runtime binary that dispatches `{"Function", "Params"}`
//! invocations. Contracts live in `sentiment_pipeline_core`; the learning
//! capability lives in `sentiment_model`.

pub mod adapters;
pub mod error;
pub mod handlers;
