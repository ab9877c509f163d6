use async_trait::async_trait;
use bytes::Bytes;
use mime_guess::MimeGuess;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const UPLOAD_PATH: &str = "/api/storage/upload_images";
const DELETE_PATH: &str = "/api/storage/delete_images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage responded with status `{status}`: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Image payload attached to a lot, `filename` is the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub content: Bytes,
}

/// Contract of the external image storage service. A single attempt is made
/// per call, a failure is final.
#[async_trait]
pub trait ImageStorageExt: Send + Sync {
    async fn upload_images(&self, files: Vec<ImageFile>) -> Result<(), StorageError>;

    async fn delete_images(&self, filenames: &[String]) -> Result<(), StorageError>;
}

/// Do not wrap `StorageClient` in a [`Rc`] or [`Arc`]
/// because [`reqwest::Client`] uses an [`Arc`] internally.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct DeleteImagesRequest<'a> {
    filenames: &'a [String],
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StorageError> {
        let base_url: String = base_url.into();
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(StorageError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ImageStorageExt for StorageClient {
    #[instrument(skip_all, fields(n_files = files.len()))]
    async fn upload_images(&self, files: Vec<ImageFile>) -> Result<(), StorageError> {
        let form = files.into_iter().try_fold(Form::new(), |form, file| {
            let mime = MimeGuess::from_path(&file.filename).first_or_octet_stream();
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.filename)
                .mime_str(mime.essence_str())?;
            Ok::<_, StorageError>(form.part("files", part))
        })?;

        let response = self
            .http
            .post(format!("{}{UPLOAD_PATH}", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::check_status(response).await?;
        debug!("images uploaded");
        Ok(())
    }

    #[instrument(skip_all, fields(n_files = filenames.len()))]
    async fn delete_images(&self, filenames: &[String]) -> Result<(), StorageError> {
        if filenames.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .post(format!("{}{DELETE_PATH}", self.base_url))
            .json(&DeleteImagesRequest { filenames })
            .send()
            .await?;
        Self::check_status(response).await?;
        debug!("images deleted");
        Ok(())
    }
}
