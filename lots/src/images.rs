use crate::storage::{ImageFile, ImageStorageExt, StorageError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, instrument, warn};
use uuid::Uuid;

/// What happens to a lot mutation when the storage service rejects an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    /// The generated names are kept on the lot and the failure is only
    /// logged. The lot may then reference images that were never stored.
    #[default]
    Lenient,
    /// The mutation fails before anything is written to the database.
    Strict,
}

/// Image changes submitted with a lot update.
#[derive(Debug, Clone, Default)]
pub struct ImageChanges {
    pub new_files: Vec<ImageFile>,
    pub delete: Vec<String>,
    /// Full image list the client saw before editing.
    pub old: Vec<String>,
}

impl ImageChanges {
    /// Drops every `delete` and `old` name the lot does not reference, so an
    /// update can only ever touch images of the lot being edited.
    pub fn restricted_to(mut self, stored: &[String]) -> Self {
        let stored = stored.iter().collect::<HashSet<_>>();
        let (delete, foreign_delete): (Vec<_>, Vec<_>) = self
            .delete
            .into_iter()
            .partition(|name| stored.contains(name));
        let (old, foreign_old): (Vec<_>, Vec<_>) =
            self.old.into_iter().partition(|name| stored.contains(name));
        if !foreign_delete.is_empty() || !foreign_old.is_empty() {
            warn!(
                foreign_delete = ?foreign_delete,
                foreign_old = ?foreign_old,
                "ignoring image names the lot does not reference"
            );
        }
        self.delete = delete;
        self.old = old;
        self
    }
}

/// Collision free storage name keeping the original extension.
pub fn generate_name(original: &str) -> String {
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}

/// `old` without anything in `delete`, followed by `added`.
pub fn final_images(old: &[String], delete: &[String], added: Vec<String>) -> Vec<String> {
    let deleted = delete.iter().collect::<HashSet<_>>();
    old.iter()
        .filter(|name| !deleted.contains(name))
        .cloned()
        .chain(added)
        .collect()
}

pub struct ImageCoordinator<S> {
    storage: S,
    policy: UploadPolicy,
}

impl<S: ImageStorageExt> ImageCoordinator<S> {
    pub fn new(storage: S, policy: UploadPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Renames `files` and uploads them in one request, returning the names
    /// the lot should reference.
    #[instrument(skip_all, fields(n_files = files.len()))]
    pub async fn store(&self, files: Vec<ImageFile>) -> Result<Vec<String>, StorageError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let renamed = files
            .into_iter()
            .map(|file| ImageFile {
                filename: generate_name(&file.filename),
                content: file.content,
            })
            .collect::<Vec<_>>();
        let names = renamed
            .iter()
            .map(|file| file.filename.clone())
            .collect::<Vec<_>>();

        match self.storage.upload_images(renamed).await {
            Ok(()) => Ok(names),
            Err(e) if self.policy == UploadPolicy::Lenient => {
                warn!(storage_error = ?e, images = ?names, "image upload failed, keeping generated names");
                Ok(names)
            }
            Err(e) => {
                error!(storage_error = ?e, "image upload failed");
                Err(e)
            }
        }
    }

    /// Applies `changes` to the storage service and returns the final image
    /// list of the lot. Deletion failures never block the update.
    #[instrument(skip_all, fields(n_new = changes.new_files.len(), n_delete = changes.delete.len()))]
    pub async fn reconcile(&self, changes: ImageChanges) -> Result<Vec<String>, StorageError> {
        let ImageChanges {
            new_files,
            delete,
            old,
        } = changes;

        let added = match self.policy {
            UploadPolicy::Lenient => {
                self.delete_advisory(&delete).await;
                self.store(new_files).await?
            }
            // nothing is removed from storage unless the new images made it
            UploadPolicy::Strict => {
                let added = self.store(new_files).await?;
                self.delete_advisory(&delete).await;
                added
            }
        };

        Ok(final_images(&old, &delete, added))
    }

    /// Removes every image of a deleted lot, the failure is returned to the
    /// caller.
    #[instrument(skip_all, fields(n_files = names.len()))]
    pub async fn purge(&self, names: &[String]) -> Result<(), StorageError> {
        if names.is_empty() {
            return Ok(());
        }
        self.storage
            .delete_images(names)
            .await
            .inspect_err(|e| error!(storage_error = ?e, images = ?names, "image cleanup failed"))
    }

    async fn delete_advisory(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        if let Err(e) = self.storage.delete_images(names).await {
            warn!(storage_error = ?e, images = ?names, "image deletion failed, continuing");
        }
    }
}
