//! Object-store key and local-scratch path conventions.
//!
//! Keys follow the layout the pipeline stages agree on: the raw archive
//! under `raw/`, CSV splits under `data/`, and model artifacts under
//! `model/`. Nothing enforces these shapes at type level; they are the
//! documented defaults every stage request falls back to.

/// Dataset archive file name.
pub const DATASET_ARCHIVE: &str = "amazon_review_polarity_csv.tgz";

/// Default object key for the raw dataset archive.
pub const RAW_ARCHIVE_OBJECT: &str = "raw/amazon_review_polarity_csv.tgz";

/// Default object key for the training split.
pub const TRAIN_SPLIT_OBJECT: &str = "data/train.csv";

/// Default object key for the test split.
pub const TEST_SPLIT_OBJECT: &str = "data/test.csv";

/// Default object key for the serialized classifier.
pub const MODEL_OBJECT: &str = "model/sentiment_model.json";

/// Default object key for the serialized feature transformer.
pub const VECTORIZER_OBJECT: &str = "model/tfidf_vectorizer.json";

/// Default local scratch path for the downloaded archive.
pub const LOCAL_ARCHIVE_PATH: &str = "./amazon_review_polarity_csv.tgz";

/// Default local directory the archive is decompressed into.
pub const LOCAL_OUTPUT_DIR: &str = "./data";

/// Default local scratch file for the training split.
pub const LOCAL_TRAIN_FILE: &str = "train.csv";

/// Default local scratch file for the test split.
pub const LOCAL_TEST_FILE: &str = "test.csv";

/// Default local scratch file for the serialized classifier.
pub const LOCAL_MODEL_FILE: &str = "sentiment_model.json";

/// Default local scratch file for the serialized feature transformer.
pub const LOCAL_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";

/// Path of a CSV split inside the decompressed tree:
/// `<output_dir>/<data_root>/<split>`.
pub fn split_csv_path(output_dir: &str, data_root: &str, split: &str) -> String {
    format!(
        "{}/{}/{split}",
        output_dir.trim_end_matches('/'),
        data_root.trim_matches('/')
    )
}

/// Name of the sampled variant of a working CSV: `train.csv` with subset
/// `0.5` becomes `train-0.5.csv`.
pub fn sampled_csv_path(original: &str, subset: f64) -> String {
    match original.strip_suffix(".csv") {
        Some(stem) => format!("{stem}-{subset}.csv"),
        None => format!("{original}-{subset}"),
    }
}
