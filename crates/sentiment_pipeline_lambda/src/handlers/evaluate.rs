//! Model-evaluation stage: test split + fitted bundle → accuracy.

use std::path::Path;

use serde_json::json;
use sentiment_model::bundle::load_bundle;
use sentiment_model::dataset::{read_labeled_csv, SAMPLING_SEED};
use sentiment_pipeline_core::contract::{EvaluateRequest, EvaluateResult, StageStatus};

use crate::adapters::object_store::ObjectStore;
use crate::error::StageError;
use crate::handlers::log_stage_info;

const COMPONENT: &str = "evaluate_handler";

/// Score the published model bundle on the test split.
///
/// There is no output artifact, so no idempotency guard: the stage always
/// executes, reusing any already-present local copies of the test split,
/// model, and vectorizer instead of re-downloading them. A bundle that
/// cannot be deserialized (or whose pair widths disagree) fails distinctly
/// from a data-download failure.
pub fn handle_evaluate(
    request: &EvaluateRequest,
    store: &dyn ObjectStore,
) -> Result<EvaluateResult, StageError> {
    request.validate()?;
    log_stage_info(
        COMPONENT,
        "stage_started",
        json!({
            "test_object_data": request.test_object_data.clone(),
            "model_object": request.input_model_object.clone(),
            "subset": request.subset,
        }),
    );

    ensure_local_copy(
        store,
        &request.test_object_data,
        &request.local_test_file,
    )?;
    ensure_local_copy(
        store,
        &request.input_model_object,
        &request.local_model_file,
    )?;
    ensure_local_copy(
        store,
        &request.input_vectorizer_object,
        &request.local_vectorizer_file,
    )?;

    let bundle = load_bundle(
        Path::new(&request.local_model_file),
        Path::new(&request.local_vectorizer_file),
    )
    .map_err(|error| StageError::Deserialize(format!("failed to load model bundle: {error}")))?;

    let examples = read_labeled_csv(
        Path::new(&request.local_test_file),
        request.subset,
        SAMPLING_SEED,
    )?;
    if examples.is_empty() {
        return Err(StageError::Data("test set is empty".to_string()));
    }

    let accuracy = bundle.accuracy_on(&examples);
    log_stage_info(
        COMPONENT,
        "model_evaluated",
        json!({
            "examples": examples.len(),
            "accuracy": accuracy,
        }),
    );

    Ok(EvaluateResult {
        status: StageStatus::Ok,
        accuracy,
    })
}

fn ensure_local_copy(
    store: &dyn ObjectStore,
    key: &str,
    local_path: &str,
) -> Result<(), StageError> {
    let path = Path::new(local_path);
    if path.exists() {
        log_stage_info(
            COMPONENT,
            "local_copy_reused",
            json!({ "local_path": local_path }),
        );
        return Ok(());
    }
    log_stage_info(
        COMPONENT,
        "download_started",
        json!({ "object": key, "local_path": local_path }),
    );
    store.download_file(key, path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fmt::Write as _;
    use std::sync::Mutex;

    use sentiment_model::bundle::{save_bundle, TrainingLineage};
    use sentiment_model::classifier::{LogisticClassifier, TrainingSettings};
    use sentiment_model::vectorizer::TfidfVectorizer;

    use super::*;

    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        downloads: Mutex<usize>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                downloads: Mutex::new(0),
            }
        }

        fn seed(&self, key: &str, body: &[u8]) {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .insert(key.to_string(), body.to_vec());
        }

        fn downloads(&self) -> usize {
            *self.downloads.lock().expect("poisoned mutex")
        }
    }

    impl ObjectStore for MemoryStore {
        fn exists(&self, key: &str) -> Result<bool, StageError> {
            Ok(self.objects.lock().expect("poisoned mutex").contains_key(key))
        }

        fn upload_file(&self, local_path: &Path, key: &str) -> Result<(), StageError> {
            let body = std::fs::read(local_path).map_err(|error| {
                StageError::Transfer(format!("failed to read upload source: {error}"))
            })?;
            self.seed(key, &body);
            Ok(())
        }

        fn download_file(&self, key: &str, local_path: &Path) -> Result<(), StageError> {
            *self.downloads.lock().expect("poisoned mutex") += 1;
            let body = self
                .objects
                .lock()
                .expect("poisoned mutex")
                .get(key)
                .cloned()
                .ok_or_else(|| StageError::Transfer(format!("object '{key}' not found")))?;
            std::fs::write(local_path, body).map_err(|error| {
                StageError::Transfer(format!("failed to write download target: {error}"))
            })
        }
    }

    fn separable_reviews_csv(rows: usize) -> String {
        let mut content = String::new();
        for index in 0..rows {
            if index % 2 == 0 {
                writeln!(
                    content,
                    "1,\"title {index}\",\"terrible awful broken product number{index}\""
                )
                .expect("fixture row should format");
            } else {
                writeln!(
                    content,
                    "2,\"title {index}\",\"great excellent wonderful product number{index}\""
                )
                .expect("fixture row should format");
            }
        }
        content
    }

    fn fitted_artifacts(dir: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let documents = vec![
            "terrible awful broken product",
            "great excellent wonderful product",
            "terrible awful product",
            "great wonderful product",
        ];
        let targets = vec![0, 1, 0, 1];
        let vectorizer = TfidfVectorizer::fit(&documents, 1_000);
        let rows = vectorizer.transform_all(&documents);
        let classifier = LogisticClassifier::fit(
            &rows,
            &targets,
            vectorizer.n_features(),
            &TrainingSettings::default(),
        )
        .expect("fit should pass");

        let model_path = dir.path().join("sentiment_model.json");
        let vectorizer_path = dir.path().join("tfidf_vectorizer.json");
        let lineage = TrainingLineage {
            trained_on: "data/train.csv".to_string(),
            subset: 1.0,
            max_features: 1_000,
            fingerprint: "test-fingerprint".to_string(),
        };
        save_bundle(&classifier, &vectorizer, &lineage, &model_path, &vectorizer_path)
            .expect("save should pass");
        (model_path, vectorizer_path)
    }

    fn request_in(dir: &tempfile::TempDir) -> EvaluateRequest {
        EvaluateRequest {
            test_object_data: "data/test.csv".to_string(),
            local_test_file: dir.path().join("test.csv").to_string_lossy().into_owned(),
            subset: 1.0,
            local_model_file: dir
                .path()
                .join("sentiment_model.json")
                .to_string_lossy()
                .into_owned(),
            local_vectorizer_file: dir
                .path()
                .join("tfidf_vectorizer.json")
                .to_string_lossy()
                .into_owned(),
            input_model_object: "model/sentiment_model.json".to_string(),
            input_vectorizer_object: "model/tfidf_vectorizer.json".to_string(),
        }
    }

    #[test]
    fn evaluates_downloaded_bundle_within_accuracy_bounds() {
        let scratch = tempfile::tempdir().expect("tempdir should create");
        let artifacts = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        store.seed("data/test.csv", separable_reviews_csv(20).as_bytes());

        let (model_path, vectorizer_path) = fitted_artifacts(&artifacts);
        store.seed(
            "model/sentiment_model.json",
            &std::fs::read(model_path).expect("model bytes should read"),
        );
        store.seed(
            "model/tfidf_vectorizer.json",
            &std::fs::read(vectorizer_path).expect("vectorizer bytes should read"),
        );

        let result = handle_evaluate(&request_in(&scratch), &store).expect("evaluate should pass");

        assert_eq!(result.status, StageStatus::Ok);
        assert!((0.0..=1.0).contains(&result.accuracy));
        assert!(result.accuracy >= 0.5);
    }

    #[test]
    fn reuses_local_copies_without_touching_the_store() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        fitted_artifacts(&dir);
        let request = request_in(&dir);
        std::fs::write(&request.local_test_file, separable_reviews_csv(20))
            .expect("scratch should write");

        let result = handle_evaluate(&request, &store).expect("evaluate should pass");

        assert_eq!(result.status, StageStatus::Ok);
        assert_eq!(store.downloads(), 0);
    }

    #[test]
    fn unreadable_bundle_is_a_deserialize_error() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let request = request_in(&dir);
        std::fs::write(&request.local_test_file, separable_reviews_csv(4))
            .expect("scratch should write");
        std::fs::write(&request.local_model_file, b"not a model").expect("scratch should write");
        std::fs::write(&request.local_vectorizer_file, b"not a vectorizer")
            .expect("scratch should write");

        let error = handle_evaluate(&request, &store).expect_err("evaluate should fail");
        assert!(matches!(error, StageError::Deserialize(_)));
    }

    #[test]
    fn width_mismatched_pair_is_a_deserialize_error() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let request = request_in(&dir);
        std::fs::write(&request.local_test_file, separable_reviews_csv(4))
            .expect("scratch should write");

        // Pair a fitted classifier with a vectorizer of a different width.
        fitted_artifacts(&dir);
        let narrow = TfidfVectorizer::fit(&["tiny corpus"], 1);
        let lineage = TrainingLineage {
            trained_on: "data/train.csv".to_string(),
            subset: 1.0,
            max_features: 1,
            fingerprint: "test-fingerprint".to_string(),
        };
        let classifier = {
            let documents = vec!["tiny corpus", "tiny corpus again"];
            let rows = narrow.transform_all(&documents);
            LogisticClassifier::fit(&rows, &[0, 1], narrow.n_features(), &TrainingSettings::default())
                .expect("fit should pass")
        };
        // Overwrite only the vectorizer file with the narrow transformer.
        save_bundle(
            &classifier,
            &narrow,
            &lineage,
            Path::new(&request.local_vectorizer_file).with_extension("ignored").as_path(),
            Path::new(&request.local_vectorizer_file),
        )
        .expect("save should pass");

        let error = handle_evaluate(&request, &store).expect_err("evaluate should fail");
        assert!(matches!(error, StageError::Deserialize(_)));
    }

    #[test]
    fn missing_test_split_is_a_transfer_error() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();

        let error = handle_evaluate(&request_in(&dir), &store).expect_err("evaluate should fail");
        assert!(matches!(error, StageError::Transfer(_)));
    }
}
