//! Storage backend trait

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::{
    error::{SpkError, SpkResult},
    item::RemoteItem,
    operations::*,
    DrivePath,
};

/// Stream of file content chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = SpkResult<Bytes>> + Send>>;

/// Access visibility of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// Path-addressed file facade.
///
/// Implementations map each call onto their store one-to-one; `move_to` and
/// `copy_to` take the full destination path including the new leaf name.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn display_name(&self) -> &str;

    async fn file_exists(&self, path: &DrivePath) -> SpkResult<bool>;
    async fn directory_exists(&self, path: &DrivePath) -> SpkResult<bool>;
    async fn metadata(&self, path: &DrivePath) -> SpkResult<Option<RemoteItem>>;
    async fn read(&self, path: &DrivePath) -> SpkResult<Bytes>;
    async fn read_stream(&self, path: &DrivePath) -> SpkResult<ByteStream>;
    async fn write(&self, path: &DrivePath, data: Bytes, options: &WriteOptions) -> SpkResult<RemoteItem>;
    async fn write_stream(&self, path: &DrivePath, stream: ByteStream, options: &WriteOptions) -> SpkResult<RemoteItem>;
    async fn delete(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool>;
    async fn delete_directory(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool>;
    async fn create_directory(&self, path: &DrivePath) -> SpkResult<RemoteItem>;
    async fn list_contents(&self, path: &DrivePath, options: &ListOptions) -> SpkResult<Vec<RemoteItem>>;
    async fn move_to(&self, source: &DrivePath, destination: &DrivePath) -> SpkResult<RemoteItem>;
    async fn copy_to(&self, source: &DrivePath, destination: &DrivePath) -> SpkResult<()>;
    async fn mime_type(&self, path: &DrivePath) -> SpkResult<String>;
    async fn file_size(&self, path: &DrivePath) -> SpkResult<u64>;
    async fn last_modified(&self, path: &DrivePath) -> SpkResult<i64>;

    // Optional methods with defaults
    async fn visibility(&self, _path: &DrivePath) -> SpkResult<Visibility> {
        Err(SpkError::Unsupported("Visibility not supported".into()))
    }

    async fn set_visibility(&self, _path: &DrivePath, _visibility: Visibility) -> SpkResult<()> {
        Err(SpkError::Unsupported("Visibility not supported".into()))
    }
}
