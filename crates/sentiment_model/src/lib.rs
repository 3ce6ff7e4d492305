//! Sentiment-analysis domain engine.
//!
//! This crate owns the statistical-learning capability of the pipeline:
//! reading labeled review CSVs, deterministic row sampling, TF-IDF feature
//! extraction, binary logistic-regression classification, and paired
//! model/vectorizer artifact files. It knows nothing about object stores,
//! stage handlers, or the serverless runtime.
//!
//! # Architecture
//!
//! - [`dataset`]: labeled-example CSV reading and seeded sampling
//! - [`vectorizer`]: unigram/bigram TF-IDF feature transformer
//! - [`classifier`]: binary logistic regression on sparse rows
//! - [`bundle`]: paired artifact (de)serialization with lineage metadata
//! - [`metrics`]: classification accuracy

pub mod bundle;
pub mod classifier;
pub mod dataset;
pub mod metrics;
pub mod vectorizer;

pub use bundle::{load_bundle, save_bundle, ModelBundle, SentimentPrediction, TrainingLineage};
pub use classifier::{LogisticClassifier, TrainingSettings};
pub use dataset::{
    binary_sentiment, read_labeled_csv, sample_csv, sampled_row_count, DatasetError,
    LabeledExample, SAMPLING_SEED,
};
pub use metrics::accuracy;
pub use vectorizer::{SparseRow, TfidfVectorizer};
