//! File operations on top of path resolution and directory provisioning

use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use spk_core::{
    operations::{DeleteOptions, DEFAULT_MIME_TYPE},
    ByteStream, DrivePath, ItemKind, RemoteItem, SpkError, SpkResult,
};
use tracing::{debug, info};

use crate::client::{Payload, RequestClient, RequestSpec, ResponseOutcome};
use crate::directory::DirectoryProvisioner;
use crate::model::{parse_item, parse_timestamp};
use crate::resolver::{ItemRef, PathResolver, Suffix};

const NAME_ALREADY_EXISTS: &str = "nameAlreadyExists";

/// Result of starting a server-side copy.
///
/// Copies run asynchronously on the remote; the monitor URL reports progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyStatus {
    pub monitor_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileOperations {
    client: RequestClient,
    resolver: PathResolver,
    directories: DirectoryProvisioner,
}

impl FileOperations {
    pub fn new(client: RequestClient, resolver: PathResolver, directories: DirectoryProvisioner) -> Self {
        Self {
            client,
            resolver,
            directories,
        }
    }

    pub async fn metadata(&self, path: &DrivePath) -> SpkResult<Option<RemoteItem>> {
        self.directories.item_metadata(ItemRef::Path(path)).await
    }

    /// `false` when missing; a folder at the path is a type mismatch
    pub async fn exists(&self, path: &DrivePath) -> SpkResult<bool> {
        match self.metadata(path).await? {
            None => Ok(false),
            Some(item) if item.is_file() => Ok(true),
            Some(_) => Err(SpkError::NotAFile(path.to_string())),
        }
    }

    /// Raw file content; the body is never interpreted
    pub async fn read(&self, path: &DrivePath) -> SpkResult<Bytes> {
        let url = self.resolver.by_path(path, Some(Suffix::Content));
        let spec = RequestSpec::get(url).raw_response();

        match self.client.request(spec).await.into_payload()? {
            Some(Payload::Raw(bytes)) => Ok(bytes),
            Some(Payload::Empty) => Ok(Bytes::new()),
            Some(Payload::Json(value)) => Ok(Bytes::from(value.to_string())),
            None => Err(SpkError::NotFound(path.to_string())),
        }
    }

    /// File content as it arrives; nothing is buffered
    pub async fn read_stream(&self, path: &DrivePath) -> SpkResult<ByteStream> {
        let url = self.resolver.by_path(path, Some(Suffix::Content));
        self.client
            .request_stream(RequestSpec::get(url))
            .await?
            .ok_or_else(|| SpkError::NotFound(path.to_string()))
    }

    /// Uploads `data` to `path`, creating missing parent directories first.
    ///
    /// An existing file is replaced. `mime_type` defaults to `text/plain`.
    pub async fn write(&self, path: &DrivePath, data: Bytes, mime_type: Option<&str>) -> SpkResult<RemoteItem> {
        let (parent_path, leaf) = path
            .split_leaf()
            .ok_or_else(|| SpkError::InvalidPath("cannot write to the root directory".into()))?;

        let parent = self.resolve_directory(&parent_path).await?;

        let mime_type = mime_type.unwrap_or(DEFAULT_MIME_TYPE);
        let content_type = HeaderValue::from_str(mime_type)
            .map_err(|_| SpkError::InvalidArgument(format!("invalid MIME type: {mime_type:?}")))?;

        let size = data.len();
        let url = self.resolver.by_id(&parent.id, Some(Suffix::ChildContent(leaf)));
        let spec = RequestSpec::put(url)
            .raw_body(data)
            .header(CONTENT_TYPE, content_type);

        let value = self.client.request(spec).await.require_json(&path.to_string())?;
        let item = parse_item(value, self.resolver.context())?;
        info!(path = %path, id = %item.id, size, "uploaded file");
        Ok(item)
    }

    /// Collects `stream` and uploads it in a single request like [`write`](Self::write)
    pub async fn write_stream(
        &self,
        path: &DrivePath,
        stream: ByteStream,
        mime_type: Option<&str>,
    ) -> SpkResult<RemoteItem> {
        let data = stream
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await?;
        self.write(path, data.freeze(), mime_type).await
    }

    /// Deletes a file; a folder at `path` is left alone and reported as a mismatch
    pub async fn delete(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool> {
        self.directories.delete_item(path, ItemKind::File, options).await
    }

    /// Moves `path` into `target_dir`, optionally renaming it.
    ///
    /// The target directory is created when missing.
    pub async fn move_item(
        &self,
        path: &DrivePath,
        target_dir: &DrivePath,
        new_name: Option<&str>,
    ) -> SpkResult<RemoteItem> {
        let source = self.require_item(path).await?;
        let target = self.resolve_directory(target_dir).await?;

        let mut body = json!({ "parentReference": { "id": target.id } });
        if let Some(name) = new_name {
            body["name"] = Value::String(name.to_string());
        }

        let url = self.resolver.by_id(&source.id, None);
        let outcome = self.client.request(RequestSpec::patch(url).json(body)).await;
        if outcome.error_code() == Some(NAME_ALREADY_EXISTS) {
            return Err(SpkError::AlreadyExists(
                target_dir.join(new_name.unwrap_or(&source.name)).to_string(),
            ));
        }
        let value = outcome.require_json(&path.to_string())?;

        let item = parse_item(value, self.resolver.context())?;
        info!(from = %path, to = %target_dir, "moved item");
        Ok(item)
    }

    /// Starts a server-side copy of `path` into `target_dir`.
    ///
    /// Completion is not awaited; the returned status carries the monitor URL
    /// when the remote provides one.
    pub async fn copy(
        &self,
        path: &DrivePath,
        target_dir: &DrivePath,
        new_name: Option<&str>,
    ) -> SpkResult<CopyStatus> {
        let source = self.require_item(path).await?;
        let target = self.resolve_directory(target_dir).await?;

        let mut body = json!({
            "parentReference": {
                "driveId": self.resolver.context().drive_id(),
                "id": target.id,
            }
        });
        if let Some(name) = new_name {
            body["name"] = Value::String(name.to_string());
        }

        let url = self.resolver.by_id(&source.id, Some(Suffix::Copy));
        let outcome = self.client.request(RequestSpec::post(url).json(body)).await;
        if outcome.error_code() == Some(NAME_ALREADY_EXISTS) {
            return Err(SpkError::AlreadyExists(
                target_dir.join(new_name.unwrap_or(&source.name)).to_string(),
            ));
        }

        match outcome {
            ResponseOutcome::Payload { location, .. } => {
                debug!(from = %path, to = %target_dir, monitor = ?location, "copy accepted");
                Ok(CopyStatus {
                    monitor_url: location,
                })
            }
            ResponseOutcome::NotFound => Err(SpkError::NotFound(path.to_string())),
            outcome => outcome.into_payload().map(|_| CopyStatus::default()),
        }
    }

    pub async fn size(&self, path: &DrivePath) -> SpkResult<u64> {
        let item = self.require_file(path).await?;
        item.size
            .ok_or_else(|| SpkError::MalformedResponse(format!("{path}: no size reported")))
    }

    pub async fn mime_type(&self, path: &DrivePath) -> SpkResult<String> {
        let item = self.require_file(path).await?;
        item.mime_type
            .ok_or_else(|| SpkError::MalformedResponse(format!("{path}: no MIME type reported")))
    }

    /// Seconds since the Unix epoch
    pub async fn last_modified(&self, path: &DrivePath) -> SpkResult<i64> {
        let item = self.require_file(path).await?;
        match item.last_modified {
            Some(ts) => Ok(ts),
            None => item
                .extra
                .get("fileSystemInfo")
                .and_then(|info| info.get("lastModifiedDateTime"))
                .and_then(Value::as_str)
                .map(parse_timestamp)
                .unwrap_or_else(|| {
                    Err(SpkError::MalformedResponse(format!(
                        "{path}: no modification time reported"
                    )))
                }),
        }
    }

    async fn require_item(&self, path: &DrivePath) -> SpkResult<RemoteItem> {
        self.metadata(path)
            .await?
            .ok_or_else(|| SpkError::NotFound(path.to_string()))
    }

    async fn require_file(&self, path: &DrivePath) -> SpkResult<RemoteItem> {
        let item = self.require_item(path).await?;
        if !item.is_file() {
            return Err(SpkError::NotAFile(path.to_string()));
        }
        Ok(item)
    }

    /// Existing folder at `path`, created along with its ancestors if missing
    async fn resolve_directory(&self, path: &DrivePath) -> SpkResult<RemoteItem> {
        let item = match self.directories.directory_metadata(path).await? {
            Some(item) => item,
            None if path.is_root() => return Err(SpkError::NotFound(path.to_string())),
            None => self.directories.ensure_directory(path).await?,
        };
        if !item.is_folder() {
            return Err(SpkError::NotADirectory(path.to_string()));
        }
        Ok(item)
    }
}
