//! Dataset extraction stage: archive → decompressed splits → sampled
//! splits → object store.

use std::path::Path;

use serde_json::json;
use sentiment_model::dataset::{sample_csv, SAMPLING_SEED};
use sentiment_pipeline_core::contract::{ExtractRequest, ExtractResult, StageStatus};
use sentiment_pipeline_core::storage_keys::{sampled_csv_path, split_csv_path};

use crate::adapters::archive::{extract_tgz, select_data_root};
use crate::adapters::object_store::ObjectStore;
use crate::error::StageError;
use crate::handlers::log_stage_info;

const COMPONENT: &str = "extract_handler";

/// Decompress the dataset archive, optionally sample both splits, and
/// publish them under the train/test keys.
///
/// The train key is the completion marker: when it exists the stage
/// short-circuits before any download or extraction. Sampling is row-wise
/// with a fixed seed and no stratification by label, so extreme fractions
/// may drift from the source class balance.
pub fn handle_extract(
    request: &ExtractRequest,
    store: &dyn ObjectStore,
) -> Result<ExtractResult, StageError> {
    request.validate()?;
    log_stage_info(
        COMPONENT,
        "stage_started",
        json!({
            "archive_object": request.tgz_input_object_name.clone(),
            "subset": request.subset,
        }),
    );

    if store.exists(&request.output_train_object_name)? {
        log_stage_info(
            COMPONENT,
            "already_existing",
            json!({ "train_object_name": request.output_train_object_name.clone() }),
        );
        return Ok(ExtractResult {
            status: StageStatus::AlreadyExisting,
            train_object_name: request.output_train_object_name.clone(),
            test_object_name: request.output_test_object_name.clone(),
        });
    }

    let archive_path = Path::new(&request.local_dataset_file);
    if archive_path.exists() {
        log_stage_info(
            COMPONENT,
            "local_archive_reused",
            json!({ "local_path": request.local_dataset_file.clone() }),
        );
    } else {
        log_stage_info(
            COMPONENT,
            "archive_download_started",
            json!({
                "archive_object": request.tgz_input_object_name.clone(),
                "local_path": request.local_dataset_file.clone(),
            }),
        );
        store.download_file(&request.tgz_input_object_name, archive_path)?;
    }

    let entries = extract_tgz(archive_path, Path::new(&request.local_output_dir))?;
    log_stage_info(
        COMPONENT,
        "archive_extracted",
        json!({
            "entries": entries.len(),
            "output_dir": request.local_output_dir.clone(),
        }),
    );

    let data_root = select_data_root(&entries, request.data_root.as_deref())?;
    let mut train_path = split_csv_path(&request.local_output_dir, &data_root, "train.csv");
    let mut test_path = split_csv_path(&request.local_output_dir, &data_root, "test.csv");
    if !Path::new(&train_path).exists() || !Path::new(&test_path).exists() {
        return Err(StageError::Data(format!(
            "archive does not contain train.csv and test.csv under '{data_root}'"
        )));
    }

    if request.subset < 1.0 {
        let sampled_train = sampled_csv_path(&train_path, request.subset);
        let train_rows = sample_csv(
            Path::new(&train_path),
            Path::new(&sampled_train),
            request.subset,
            SAMPLING_SEED,
        )?;

        let sampled_test = sampled_csv_path(&test_path, request.subset);
        let test_rows = sample_csv(
            Path::new(&test_path),
            Path::new(&sampled_test),
            request.subset,
            SAMPLING_SEED,
        )?;

        log_stage_info(
            COMPONENT,
            "splits_sampled",
            json!({
                "subset": request.subset,
                "train_rows": train_rows,
                "test_rows": test_rows,
            }),
        );
        train_path = sampled_train;
        test_path = sampled_test;
    }

    store.upload_file(Path::new(&train_path), &request.output_train_object_name)?;
    store.upload_file(Path::new(&test_path), &request.output_test_object_name)?;
    log_stage_info(
        COMPONENT,
        "splits_published",
        json!({
            "train_object_name": request.output_train_object_name.clone(),
            "test_object_name": request.output_test_object_name.clone(),
        }),
    );

    Ok(ExtractResult {
        status: StageStatus::Ok,
        train_object_name: request.output_train_object_name.clone(),
        test_object_name: request.output_test_object_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fmt::Write as _;
    use std::sync::Mutex;

    use crate::adapters::archive::build_archive;

    use super::*;

    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
            }
        }

        fn seed(&self, key: &str, body: &[u8]) {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .insert(key.to_string(), body.to_vec());
        }

        fn contains(&self, key: &str) -> bool {
            self.objects.lock().expect("poisoned mutex").contains_key(key)
        }

        fn body(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().expect("poisoned mutex").get(key).cloned()
        }
    }

    impl ObjectStore for MemoryStore {
        fn exists(&self, key: &str) -> Result<bool, StageError> {
            Ok(self.contains(key))
        }

        fn upload_file(&self, local_path: &Path, key: &str) -> Result<(), StageError> {
            let body = std::fs::read(local_path).map_err(|error| {
                StageError::Transfer(format!("failed to read upload source: {error}"))
            })?;
            self.seed(key, &body);
            Ok(())
        }

        fn download_file(&self, key: &str, local_path: &Path) -> Result<(), StageError> {
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

    fn reviews_csv(rows: usize) -> String {
        let mut content = String::new();
        for index in 0..rows {
            let label = if index % 2 == 0 { 1 } else { 2 };
            writeln!(content, "{label},\"title {index}\",\"review text {index}\"")
                .expect("fixture row should format");
        }
        content
    }

    fn request_in(dir: &tempfile::TempDir, subset: f64) -> ExtractRequest {
        ExtractRequest {
            tgz_input_object_name: "raw/reviews.tgz".to_string(),
            subset,
            local_dataset_file: dir
                .path()
                .join("reviews.tgz")
                .to_string_lossy()
                .into_owned(),
            local_output_dir: dir.path().join("data").to_string_lossy().into_owned(),
            output_train_object_name: "data/train.csv".to_string(),
            output_test_object_name: "data/test.csv".to_string(),
            data_root: None,
        }
    }

    fn seed_archive(store: &MemoryStore, dir: &tempfile::TempDir, entries: &[(&str, &str)]) {
        let archive_path = dir.path().join("seed.tgz");
        build_archive(&archive_path, entries);
        let bytes = std::fs::read(&archive_path).expect("archive bytes should read");
        store.seed("raw/reviews.tgz", &bytes);
    }

    #[test]
    fn existing_train_key_short_circuits_without_any_work() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        // No archive object seeded: any download attempt would fail.
        store.seed("data/train.csv", b"already-published");

        let result =
            handle_extract(&request_in(&dir, 0.5), &store).expect("extract should pass");

        assert_eq!(result.status, StageStatus::AlreadyExisting);
        assert_eq!(result.train_object_name, "data/train.csv");
        assert_eq!(result.test_object_name, "data/test.csv");
    }

    #[test]
    fn extracts_and_publishes_full_splits() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let train = reviews_csv(10);
        let test = reviews_csv(4);
        seed_archive(
            &store,
            &dir,
            &[
                ("dataset_root/train.csv", train.as_str()),
                ("dataset_root/test.csv", test.as_str()),
            ],
        );

        let result =
            handle_extract(&request_in(&dir, 1.0), &store).expect("extract should pass");

        assert_eq!(result.status, StageStatus::Ok);
        assert_eq!(
            store.body("data/train.csv").expect("train should publish"),
            train.into_bytes()
        );
        assert_eq!(
            store.body("data/test.csv").expect("test should publish"),
            test.into_bytes()
        );
    }

    #[test]
    fn samples_both_splits_to_the_requested_fraction() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let train = reviews_csv(100);
        let test = reviews_csv(40);
        seed_archive(
            &store,
            &dir,
            &[
                ("dataset_root/train.csv", train.as_str()),
                ("dataset_root/test.csv", test.as_str()),
            ],
        );

        let result =
            handle_extract(&request_in(&dir, 0.5), &store).expect("extract should pass");
        assert_eq!(result.status, StageStatus::Ok);

        let published_train =
            String::from_utf8(store.body("data/train.csv").expect("train should publish"))
                .expect("train should be utf-8");
        assert_eq!(published_train.lines().count(), 50);

        let published_test =
            String::from_utf8(store.body("data/test.csv").expect("test should publish"))
                .expect("test should be utf-8");
        assert_eq!(published_test.lines().count(), 20);
    }

    #[test]
    fn hidden_top_level_entries_are_skipped_when_locating_the_data_root() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let rows = reviews_csv(6);
        seed_archive(
            &store,
            &dir,
            &[
                (".DS_Store", "finder noise"),
                ("dataset_root/train.csv", rows.as_str()),
                ("dataset_root/test.csv", rows.as_str()),
            ],
        );

        let result =
            handle_extract(&request_in(&dir, 1.0), &store).expect("extract should pass");

        assert_eq!(result.status, StageStatus::Ok);
        assert!(store.contains("data/train.csv"));
    }

    #[test]
    fn explicit_data_root_bypasses_the_heuristic() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        let rows = reviews_csv(6);
        seed_archive(
            &store,
            &dir,
            &[
                ("decoy/readme.txt", "not the data"),
                ("real_root/train.csv", rows.as_str()),
                ("real_root/test.csv", rows.as_str()),
            ],
        );

        let mut request = request_in(&dir, 1.0);
        request.data_root = Some("real_root".to_string());

        let result = handle_extract(&request, &store).expect("extract should pass");
        assert_eq!(result.status, StageStatus::Ok);
        assert!(store.contains("data/train.csv"));
    }

    #[test]
    fn missing_archive_key_raises_transfer_error_and_publishes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();

        let error =
            handle_extract(&request_in(&dir, 1.0), &store).expect_err("extract should fail");

        assert!(matches!(error, StageError::Transfer(_)));
        assert!(!store.contains("data/train.csv"));
        assert!(!store.contains("data/test.csv"));
    }

    #[test]
    fn archive_without_expected_splits_is_a_data_error() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = MemoryStore::new();
        seed_archive(&store, &dir, &[("dataset_root/readme.txt", "no csvs here")]);

        let error =
            handle_extract(&request_in(&dir, 1.0), &store).expect_err("extract should fail");

        assert!(matches!(error, StageError::Data(_)));
        assert!(!store.contains("data/train.csv"));
    }
}
