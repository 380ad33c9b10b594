//! Blob storage adapter for uploaded documents and profile images.
//!
//! Files live under named buckets and resolve to stable public URLs. The
//! local filesystem implementation mirrors how the rest of the API serves
//! uploads: unique stored filenames derived from a generated id plus the
//! original extension.

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Named storage buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    ClientDocuments,
    ClientMemberDocuments,
    ClientProfiles,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientDocuments => "client-documents",
            Self::ClientMemberDocuments => "client-member-documents",
            Self::ClientProfiles => "client-profiles",
        }
    }
}

/// An in-memory file payload selected for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lowercased extension of the original filename, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// A stored file: its object path within the bucket and its public URL
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub path: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object already exists at {0}")]
    AlreadyExists(String),
    #[error("object not found at {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for crate::error::AppError {
    fn from(err: StorageError) -> Self {
        Self::UploadFailed(err.to_string())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at `path` within `bucket`, returning the stored path and
    /// its public URL. With `overwrite` false an existing object is an error.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<StoredBlob, StorageError>;

    async fn remove(&self, bucket: Bucket, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

/// Object path for a document owned by a client or member: unique stored
/// name under the owner's directory, keeping the original extension.
pub fn document_path(owner_id: Uuid, file: &UploadFile) -> String {
    match file.extension() {
        Some(ext) => format!("{}/{}.{}", owner_id, Uuid::new_v4(), ext),
        None => format!("{}/{}", owner_id, Uuid::new_v4()),
    }
}

/// Object path for a client profile image. Derived from the client id
/// only, with a fixed object name, so a replacement upload always lands
/// at the same path whatever the selected file is called.
pub fn profile_path(client_id: Uuid) -> String {
    format!("{}/profile", client_id)
}

/// Blob store over a local directory tree, one subdirectory per bucket
pub struct LocalBlobStore {
    root: std::path::PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: std::path::PathBuf::from(&config.root),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn disk_path(&self, bucket: Bucket, path: &str) -> std::path::PathBuf {
        self.root.join(bucket.as_str()).join(path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<StoredBlob, StorageError> {
        let disk_path = self.disk_path(bucket, path);

        if !overwrite && fs::metadata(&disk_path).await.is_ok() {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        if let Some(parent) = disk_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&disk_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(StoredBlob {
            path: path.to_string(),
            url: self.public_url(bucket, path),
        })
    }

    async fn remove(&self, bucket: Bucket, path: &str) -> Result<(), StorageError> {
        let disk_path = self.disk_path(bucket, path);
        match fs::remove_file(&disk_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket.as_str(), path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(&StorageConfig {
            root: dir.path().to_string_lossy().to_string(),
            public_base_url: "http://localhost:8080/files/".to_string(),
        })
    }

    #[tokio::test]
    async fn upload_writes_and_builds_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let blob = store
            .upload(Bucket::ClientDocuments, "abc/report.pdf", b"pdf-bytes", false)
            .await
            .unwrap();

        assert_eq!(
            blob.url,
            "http://localhost:8080/files/client-documents/abc/report.pdf"
        );
        let on_disk = std::fs::read(dir.path().join("client-documents/abc/report.pdf")).unwrap();
        assert_eq!(on_disk, b"pdf-bytes");
    }

    #[tokio::test]
    async fn upload_without_overwrite_rejects_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .upload(Bucket::ClientProfiles, "c1/profile.png", b"v1", false)
            .await
            .unwrap();
        let err = store
            .upload(Bucket::ClientProfiles, "c1/profile.png", b"v2", false)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        // Same path with overwrite replaces the object
        store
            .upload(Bucket::ClientProfiles, "c1/profile.png", b"v2", true)
            .await
            .unwrap();
        let on_disk = std::fs::read(dir.path().join("client-profiles/c1/profile.png")).unwrap();
        assert_eq!(on_disk, b"v2");
    }

    #[tokio::test]
    async fn remove_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let err = store
            .remove(Bucket::ClientDocuments, "nope/file.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn document_path_keeps_extension() {
        let owner = Uuid::new_v4();
        let file = UploadFile::new("Contract.PDF", "application/pdf", vec![1]);
        let path = document_path(owner, &file);
        assert!(path.starts_with(&owner.to_string()));
        assert!(path.ends_with(".pdf"));
    }

    #[test]
    fn profile_path_is_independent_of_the_upload_filename() {
        let client = Uuid::new_v4();
        assert_eq!(profile_path(client), format!("{}/profile", client));
    }
}
