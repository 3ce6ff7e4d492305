//! Stage request/result contracts.
//!
//! Every stage request is an explicit struct with named optional fields:
//! absent fields resolve to the documented defaults once, at
//! deserialization time. Results carry a status tag plus the artifact
//! references the stage produced or consumed; that pair is the sole
//! inter-stage contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::storage_keys;

/// Default remote location of the review-polarity dataset archive.
pub const DEFAULT_DATA_URL: &str =
    "https://s3.amazonaws.com/fast-ai-nlp/amazon_review_polarity_csv.tgz";

/// No sampling: use the full dataset.
pub const DEFAULT_SUBSET: f64 = 1.0;

/// Default cap on distinct transformer terms.
pub const DEFAULT_MAX_FEATURES: usize = 20_000;

/// Outcome tag shared by every stage result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "already existing")]
    AlreadyExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

fn validate_subset(subset: f64) -> Result<(), ValidationError> {
    if subset > 0.0 && subset <= 1.0 {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "subset must be within (0.0, 1.0], got {subset}"
        )))
    }
}

/// Parameters of the dataset-retrieval stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieveRequest {
    #[serde(default = "default_data_url")]
    pub data_url: String,
    #[serde(default = "default_local_archive")]
    pub local_dir: String,
    #[serde(default = "default_raw_object")]
    pub object_name: String,
}

impl Default for RetrieveRequest {
    fn default() -> Self {
        Self {
            data_url: default_data_url(),
            local_dir: default_local_archive(),
            object_name: default_raw_object(),
        }
    }
}

impl RetrieveRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.data_url.trim().is_empty() {
            return Err(ValidationError::new("data_url cannot be empty"));
        }
        if self.object_name.trim().is_empty() {
            return Err(ValidationError::new("object_name cannot be empty"));
        }
        Ok(())
    }
}

/// Parameters of the extract/sample stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractRequest {
    #[serde(default = "default_archive_object")]
    pub tgz_input_object_name: String,
    #[serde(default = "default_subset")]
    pub subset: f64,
    #[serde(default = "default_local_archive")]
    pub local_dataset_file: String,
    #[serde(default = "default_local_output_dir")]
    pub local_output_dir: String,
    #[serde(default = "default_train_object")]
    pub output_train_object_name: String,
    #[serde(default = "default_test_object")]
    pub output_test_object_name: String,
    /// Explicit dataset directory inside the decompressed tree. When
    /// unset, the first non-hidden top-level archive entry is used.
    #[serde(default)]
    pub data_root: Option<String>,
}

impl Default for ExtractRequest {
    fn default() -> Self {
        Self {
            tgz_input_object_name: default_archive_object(),
            subset: default_subset(),
            local_dataset_file: default_local_archive(),
            local_output_dir: default_local_output_dir(),
            output_train_object_name: default_train_object(),
            output_test_object_name: default_test_object(),
            data_root: None,
        }
    }
}

impl ExtractRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_subset(self.subset)
    }
}

/// Parameters of the model-training stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainRequest {
    #[serde(default = "default_train_object")]
    pub train_object_data: String,
    #[serde(default = "default_local_train_file")]
    pub local_train_file: String,
    #[serde(default = "default_subset")]
    pub subset: f64,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_local_model_file")]
    pub local_model_file: String,
    #[serde(default = "default_local_vectorizer_file")]
    pub local_vectorizer_file: String,
    #[serde(default = "default_model_object")]
    pub output_model_object: String,
    #[serde(default = "default_vectorizer_object")]
    pub output_vectorizer_object: String,
}

impl Default for TrainRequest {
    fn default() -> Self {
        Self {
            train_object_data: default_train_object(),
            local_train_file: default_local_train_file(),
            subset: default_subset(),
            max_features: default_max_features(),
            local_model_file: default_local_model_file(),
            local_vectorizer_file: default_local_vectorizer_file(),
            output_model_object: default_model_object(),
            output_vectorizer_object: default_vectorizer_object(),
        }
    }
}

impl TrainRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_subset(self.subset)?;
        if self.max_features == 0 {
            return Err(ValidationError::new(
                "max_features must be a positive integer",
            ));
        }
        Ok(())
    }
}

/// Parameters of the model-evaluation stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluateRequest {
    #[serde(default = "default_test_object")]
    pub test_object_data: String,
    #[serde(default = "default_local_test_file")]
    pub local_test_file: String,
    #[serde(default = "default_subset")]
    pub subset: f64,
    #[serde(default = "default_local_model_file")]
    pub local_model_file: String,
    #[serde(default = "default_local_vectorizer_file")]
    pub local_vectorizer_file: String,
    #[serde(default = "default_model_object")]
    pub input_model_object: String,
    #[serde(default = "default_vectorizer_object")]
    pub input_vectorizer_object: String,
}

impl Default for EvaluateRequest {
    fn default() -> Self {
        Self {
            test_object_data: default_test_object(),
            local_test_file: default_local_test_file(),
            subset: default_subset(),
            local_model_file: default_local_model_file(),
            local_vectorizer_file: default_local_vectorizer_file(),
            input_model_object: default_model_object(),
            input_vectorizer_object: default_vectorizer_object(),
        }
    }
}

impl EvaluateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_subset(self.subset)
    }
}

/// Result of the retrieval stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieveResult {
    pub status: StageStatus,
    pub local_download: bool,
    pub uploaded: bool,
    pub object_name: String,
}

/// Result of the extract stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractResult {
    pub status: StageStatus,
    pub train_object_name: String,
    pub test_object_name: String,
}

/// Result of the training stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainResult {
    pub status: StageStatus,
    pub model_object_name: String,
    pub vectorizer_object_name: String,
}

/// Result of the evaluation stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluateResult {
    pub status: StageStatus,
    pub accuracy: f64,
}

/// Incoming invocation envelope: a function name plus stage parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationRequest {
    #[serde(rename = "Function", default)]
    pub function: Option<String>,
    #[serde(rename = "Params", default)]
    pub params: Value,
}

/// Outgoing invocation envelope. `result` holds the stage result encoded
/// as a JSON string; `error` carries the failure message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Result", skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

fn default_data_url() -> String {
    DEFAULT_DATA_URL.to_string()
}

fn default_subset() -> f64 {
    DEFAULT_SUBSET
}

fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

fn default_archive_object() -> String {
    storage_keys::DATASET_ARCHIVE.to_string()
}

fn default_raw_object() -> String {
    storage_keys::RAW_ARCHIVE_OBJECT.to_string()
}

fn default_train_object() -> String {
    storage_keys::TRAIN_SPLIT_OBJECT.to_string()
}

fn default_test_object() -> String {
    storage_keys::TEST_SPLIT_OBJECT.to_string()
}

fn default_model_object() -> String {
    storage_keys::MODEL_OBJECT.to_string()
}

fn default_vectorizer_object() -> String {
    storage_keys::VECTORIZER_OBJECT.to_string()
}

fn default_local_archive() -> String {
    storage_keys::LOCAL_ARCHIVE_PATH.to_string()
}

fn default_local_output_dir() -> String {
    storage_keys::LOCAL_OUTPUT_DIR.to_string()
}

fn default_local_train_file() -> String {
    storage_keys::LOCAL_TRAIN_FILE.to_string()
}

fn default_local_test_file() -> String {
    storage_keys::LOCAL_TEST_FILE.to_string()
}

fn default_local_model_file() -> String {
    storage_keys::LOCAL_MODEL_FILE.to_string()
}

fn default_local_vectorizer_file() -> String {
    storage_keys::LOCAL_VECTORIZER_FILE.to_string()
}

/// Stable JSON encoding of a contract value.
pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

/// SHA-256 fingerprint of a resolved request, for artifact lineage.
pub fn request_fingerprint(request: impl Serialize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stable_contract_json(request));
    format!("{:x}", hasher.finalize())
}
