use std::path::Path;
use std::sync::Arc;

use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use sentiment_pipeline_core::contract::{
    stable_contract_json, EvaluateRequest, ExtractRequest, InvocationRequest,
    InvocationResponse, RetrieveRequest, TrainRequest,
};
use sentiment_pipeline_lambda::adapters::download::{Downloader, HttpDownloader};
use sentiment_pipeline_lambda::adapters::object_store::ObjectStore;
use sentiment_pipeline_lambda::error::StageError;
use sentiment_pipeline_lambda::handlers::evaluate::handle_evaluate;
use sentiment_pipeline_lambda::handlers::extract::handle_extract;
use sentiment_pipeline_lambda::handlers::log_stage_error;
use sentiment_pipeline_lambda::handlers::retrieve::handle_retrieve;
use sentiment_pipeline_lambda::handlers::train::handle_train;

struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn exists(&self, key: &str) -> Result<bool, StageError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .head_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(error)
                        if error
                            .as_service_error()
                            .map(|service_error| service_error.is_not_found())
                            .unwrap_or(false) =>
                    {
                        Ok(false)
                    }
                    Err(error) => Err(StageError::Transfer(format!(
                        "failed to probe object '{object_key}': {error}"
                    ))),
                }
            })
        })
    }

    fn upload_file(&self, local_path: &Path, key: &str) -> Result<(), StageError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let source = local_path.to_path_buf();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let body = ByteStream::from_path(&source).await.map_err(|error| {
                    StageError::Transfer(format!(
                        "failed to read upload source '{}': {error}",
                        source.display()
                    ))
                })?;
                client
                    .put_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        StageError::Transfer(format!(
                            "failed to upload object '{object_key}': {error}"
                        ))
                    })
            })
        })
    }

    fn download_file(&self, key: &str, local_path: &Path) -> Result<(), StageError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let target = local_path.to_path_buf();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .send()
                    .await
                    .map_err(|error| {
                        StageError::Transfer(format!(
                            "failed to download object '{object_key}': {error}"
                        ))
                    })?;
                let bytes = output.body.collect().await.map_err(|error| {
                    StageError::Transfer(format!(
                        "failed to read body of object '{object_key}': {error}"
                    ))
                })?;
                std::fs::write(&target, bytes.into_bytes()).map_err(|error| {
                    StageError::Transfer(format!(
                        "failed to write download target '{}': {error}",
                        target.display()
                    ))
                })
            })
        })
    }
}

struct RuntimeDependencies {
    store: S3ObjectStore,
    downloader: HttpDownloader,
    fallback_function: Option<String>,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: Arc<RuntimeDependencies>,
) -> Result<Value, Error> {
    let request: InvocationRequest = match serde_json::from_value(event.payload) {
        Ok(value) => value,
        Err(error) => {
            return respond(InvocationResponse::failure(format!(
                "malformed invocation: {error}"
            )));
        }
    };

    let function = request
        .function
        .clone()
        .or_else(|| deps.fallback_function.clone());
    let Some(function) = function else {
        return respond(InvocationResponse::failure("function not defined!"));
    };

    // Handlers do blocking network and disk I/O.
    let response = tokio::task::block_in_place(|| {
        dispatch_stage(&function, request.params, &deps.store, &deps.downloader)
    });
    respond(response)
}

fn dispatch_stage(
    function: &str,
    params: Value,
    store: &dyn ObjectStore,
    downloader: &dyn Downloader,
) -> InvocationResponse {
    let outcome: Result<String, StageError> = match function {
        "retrieve" => parse_params::<RetrieveRequest>(params).and_then(|request| {
            handle_retrieve(&request, store, downloader)
                .map(|result| stable_contract_json(&result))
        }),
        "extract" => parse_params::<ExtractRequest>(params).and_then(|request| {
            handle_extract(&request, store).map(|result| stable_contract_json(&result))
        }),
        "train" => parse_params::<TrainRequest>(params).and_then(|request| {
            handle_train(&request, store).map(|result| stable_contract_json(&result))
        }),
        "evaluate" => parse_params::<EvaluateRequest>(params).and_then(|request| {
            handle_evaluate(&request, store).map(|result| stable_contract_json(&result))
        }),
        other => Err(StageError::Config(format!("unsupported function '{other}'"))),
    };

    match outcome {
        Ok(result) => InvocationResponse::success(result),
        Err(error) => {
            log_stage_error(
                "function_runtime",
                "stage_failed",
                serde_json::json!({
                    "function": function,
                    "error": error.to_string(),
                }),
            );
            InvocationResponse::failure(error.to_string())
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, StageError> {
    // Absent params resolve every field to its documented default.
    let params = if params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|error| StageError::Config(format!("malformed stage parameters: {error}")))
}

fn respond(response: InvocationResponse) -> Result<Value, Error> {
    serde_json::to_value(&response)
        .map_err(|error| Error::from(format!("failed to serialize response envelope: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let bucket = std::env::var("OBJECT_STORE_BUCKET")
        .map_err(|_| Error::from("OBJECT_STORE_BUCKET must be configured"))?;
    let endpoint = std::env::var("OBJECT_STORE_ENDPOINT").ok();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let mut s3_config = aws_sdk_s3::config::Builder::from(&aws_config);
    if let Some(endpoint) = endpoint {
        // MinIO and other S3-compatible stores need path-style addressing.
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }
    let s3_client = aws_sdk_s3::Client::from_conf(s3_config.build());

    // Dependencies are constructed once per process and reused across
    // invocations.
    let deps = Arc::new(RuntimeDependencies {
        store: S3ObjectStore { bucket, s3_client },
        downloader: HttpDownloader::new(),
        fallback_function: std::env::var("HANDLER_FUNCTION").ok(),
    });

    lambda_runtime::run(service_fn(move |event| {
        let deps = Arc::clone(&deps);
        async move { handle_request(event, deps).await }
    }))
    .await
}
