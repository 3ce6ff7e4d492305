//! Dataset retrieval stage: remote archive → local scratch → object store.

use std::path::Path;

use serde_json::json;
use sentiment_pipeline_core::contract::{RetrieveRequest, RetrieveResult, StageStatus};

use crate::adapters::download::Downloader;
use crate::adapters::object_store::ObjectStore;
use crate::error::StageError;
use crate::handlers::{log_stage_info, log_stage_warn};

const COMPONENT: &str = "retrieve_handler";

/// Fetch the dataset archive and publish it under `object_name`.
///
/// The object-store probe is the primary idempotency guarantee: a present
/// key means the stage already completed and no network I/O happens. An
/// already-present scratch file is a secondary, weaker cache that only
/// skips the download. The upload itself is guarded by a second probe;
/// losing that race is reported with a warning, not an error.
pub fn handle_retrieve(
    request: &RetrieveRequest,
    store: &dyn ObjectStore,
    downloader: &dyn Downloader,
) -> Result<RetrieveResult, StageError> {
    request.validate()?;
    log_stage_info(
        COMPONENT,
        "stage_started",
        json!({
            "data_url": request.data_url.clone(),
            "object_name": request.object_name.clone(),
        }),
    );

    if store.exists(&request.object_name)? {
        log_stage_info(
            COMPONENT,
            "already_existing",
            json!({ "object_name": request.object_name.clone() }),
        );
        return Ok(RetrieveResult {
            status: StageStatus::AlreadyExisting,
            local_download: false,
            uploaded: false,
            object_name: request.object_name.clone(),
        });
    }

    let local_path = Path::new(&request.local_dir);
    let local_download = if local_path.exists() {
        log_stage_info(
            COMPONENT,
            "local_archive_reused",
            json!({ "local_path": request.local_dir.clone() }),
        );
        false
    } else {
        log_stage_info(
            COMPONENT,
            "download_started",
            json!({
                "data_url": request.data_url.clone(),
                "local_path": request.local_dir.clone(),
            }),
        );
        downloader.fetch(&request.data_url, local_path)?;
        true
    };

    // Second probe just before publishing: another retriever may have won
    // the race since the initial check.
    let uploaded = if store.exists(&request.object_name)? {
        log_stage_warn(
            COMPONENT,
            "upload_skipped_key_exists",
            json!({ "object_name": request.object_name.clone() }),
        );
        false
    } else {
        store.upload_file(local_path, &request.object_name)?;
        log_stage_info(
            COMPONENT,
            "archive_published",
            json!({ "object_name": request.object_name.clone() }),
        );
        true
    };

    Ok(RetrieveResult {
        status: StageStatus::Ok,
        local_download,
        uploaded,
        object_name: request.object_name.clone(),
    })
}
