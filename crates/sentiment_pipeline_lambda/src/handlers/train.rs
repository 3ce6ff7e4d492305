//! Model-training stage: training split → fitted bundle → object store.

use std::path::Path;

use serde_json::json;
use sentiment_model::bundle::{save_bundle, TrainingLineage};
use sentiment_model::classifier::{LogisticClassifier, TrainingSettings};
use sentiment_model::dataset::{read_labeled_csv, SAMPLING_SEED};
use sentiment_model::vectorizer::TfidfVectorizer;
use sentiment_pipeline_core::contract::{request_fingerprint, StageStatus, TrainRequest, TrainResult};

use crate::adapters::object_store::ObjectStore;
use crate::error::StageError;
use crate::handlers::log_stage_info;

const COMPONENT: &str = "train_handler";

/// Fit the transformer and classifier on the training split and publish
/// both artifacts.
///
/// The model key is the completion marker. The vectorizer is published
/// first so the marker can only exist once both artifacts are durable: a
/// failure between the two uploads leaves no marker, and the whole run is
/// redone on retry. The transformer is fit only on the subsample actually
/// used for training.
pub fn handle_train(
    request: &TrainRequest,
    store: &dyn ObjectStore,
) -> Result<TrainResult, StageError> {
    request.validate()?;
    log_stage_info(
        COMPONENT,
        "stage_started",
        json!({
            "train_object_data": request.train_object_data.clone(),
            "subset": request.subset,
            "max_features": request.max_features,
        }),
    );

    if store.exists(&request.output_model_object)? {
        log_stage_info(
            COMPONENT,
            "already_existing",
            json!({ "model_object_name": request.output_model_object.clone() }),
        );
        return Ok(TrainResult {
            status: StageStatus::AlreadyExisting,
            model_object_name: request.output_model_object.clone(),
            vectorizer_object_name: request.output_vectorizer_object.clone(),
        });
    }

    let local_train = Path::new(&request.local_train_file);
    if local_train.exists() {
        log_stage_info(
            COMPONENT,
            "local_train_data_reused",
            json!({ "local_path": request.local_train_file.clone() }),
        );
    } else {
        log_stage_info(
            COMPONENT,
            "train_data_download_started",
            json!({
                "train_object_data": request.train_object_data.clone(),
                "local_path": request.local_train_file.clone(),
            }),
        );
        store.download_file(&request.train_object_data, local_train)?;
    }

    let examples = read_labeled_csv(local_train, request.subset, SAMPLING_SEED)?;
    if examples.is_empty() {
        return Err(StageError::Data("training set is empty".to_string()));
    }

    let documents: Vec<&str> = examples.iter().map(|example| example.review.as_str()).collect();
    let targets: Vec<u8> = examples.iter().map(|example| example.sentiment).collect();

    let vectorizer = TfidfVectorizer::fit(&documents, request.max_features);
    let rows = vectorizer.transform_all(&documents);
    let classifier = LogisticClassifier::fit(
        &rows,
        &targets,
        vectorizer.n_features(),
        &TrainingSettings::default(),
    )
    .map_err(|error| StageError::Data(error.message().to_string()))?;
    log_stage_info(
        COMPONENT,
        "model_fitted",
        json!({
            "examples": examples.len(),
            "features": vectorizer.n_features(),
        }),
    );

    let lineage = TrainingLineage {
        trained_on: request.train_object_data.clone(),
        subset: request.subset,
        max_features: request.max_features,
        fingerprint: request_fingerprint(request),
    };
    save_bundle(
        &classifier,
        &vectorizer,
        &lineage,
        Path::new(&request.local_model_file),
        Path::new(&request.local_vectorizer_file),
    )
    .map_err(|error| StageError::Data(format!("failed to save model bundle: {error}")))?;

    store.upload_file(
        Path::new(&request.local_vectorizer_file),
        &request.output_vectorizer_object,
    )?;
    store.upload_file(
        Path::new(&request.local_model_file),
        &request.output_model_object,
    )?;
    log_stage_info(
        COMPONENT,
        "model_published",
        json!({
            "model_object_name": request.output_model_object.clone(),
            "vectorizer_object_name": request.output_vectorizer_object.clone(),
            "fingerprint": lineage.fingerprint.clone(),
        }),
    );

    Ok(TrainResult {
        status: StageStatus::Ok,
        model_object_name: request.output_model_object.clone(),
        vectorizer_object_name: request.output_vectorizer_object.clone(),
    })
}
