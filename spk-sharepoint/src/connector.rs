//! SharePoint document library backend

use async_trait::async_trait;
use bytes::Bytes;
use spk_core::{
    operations::{DeleteOptions, ListOptions, WriteOptions},
    ByteStream, DrivePath, RemoteItem, SpkError, SpkResult, StorageBackend,
};
use tracing::info;

use crate::auth::request_token;
use crate::client::RequestClient;
use crate::config::ConnectorConfig;
use crate::directory::DirectoryProvisioner;
use crate::files::FileOperations;
use crate::resolver::{DriveContext, PathResolver};
use crate::site::SiteDriveResolver;

/// A SharePoint drive bound to one token, site and drive for its lifetime
#[derive(Debug, Clone)]
pub struct SharePointConnector {
    name: String,
    context: DriveContext,
    directories: DirectoryProvisioner,
    files: FileOperations,
}

impl SharePointConnector {
    /// Authenticates, then resolves the configured site and drive
    pub async fn connect(config: &ConnectorConfig) -> SpkResult<Self> {
        config.validate()?;

        let token = request_token(config).await?;
        if token.is_expired() {
            return Err(SpkError::Auth("token endpoint issued an expired token".into()));
        }
        let client = RequestClient::new(&config.graph_client_config(), token.credentials())?;

        let drive_id = SiteDriveResolver::new(client.clone())
            .resolve(&config.site, config.drive.as_deref())
            .await?;

        let mut context = DriveContext::new(drive_id);
        if let Some(prefix) = config.prefix.as_deref() {
            context = context.with_prefix(prefix);
        }
        info!(
            graph = %client.base_url(),
            site = %config.site,
            drive_id = %context.drive_id(),
            prefix = %context.prefix(),
            "connected"
        );

        let mut connector = Self::from_parts(client, context);
        connector.name = format!("sharepoint:{}", config.site);
        Ok(connector)
    }

    /// Connector over an already-authenticated client and a known drive
    pub fn from_parts(client: RequestClient, context: DriveContext) -> Self {
        let resolver = PathResolver::new(context.clone());
        let directories = DirectoryProvisioner::new(client.clone(), resolver.clone());
        let files = FileOperations::new(client, resolver, directories.clone());
        Self {
            name: format!("sharepoint:{}", context.drive_id()),
            context,
            directories,
            files,
        }
    }

    pub fn context(&self) -> &DriveContext {
        &self.context
    }

    pub fn directories(&self) -> &DirectoryProvisioner {
        &self.directories
    }

    pub fn files(&self) -> &FileOperations {
        &self.files
    }
}

/// Splits a full destination into its directory and leaf name
fn split_destination(destination: &DrivePath) -> SpkResult<(DrivePath, &str)> {
    destination
        .split_leaf()
        .ok_or_else(|| SpkError::InvalidPath("destination cannot be the root directory".into()))
}

#[async_trait]
impl StorageBackend for SharePointConnector {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn file_exists(&self, path: &DrivePath) -> SpkResult<bool> {
        self.files.exists(path).await
    }

    async fn directory_exists(&self, path: &DrivePath) -> SpkResult<bool> {
        self.directories.directory_exists(path).await
    }

    async fn metadata(&self, path: &DrivePath) -> SpkResult<Option<RemoteItem>> {
        self.files.metadata(path).await
    }

    async fn read(&self, path: &DrivePath) -> SpkResult<Bytes> {
        self.files.read(path).await
    }

    async fn read_stream(&self, path: &DrivePath) -> SpkResult<ByteStream> {
        self.files.read_stream(path).await
    }

    async fn write(&self, path: &DrivePath, data: Bytes, options: &WriteOptions) -> SpkResult<RemoteItem> {
        self.files.write(path, data, Some(options.mime_type())).await
    }

    async fn write_stream(&self, path: &DrivePath, stream: ByteStream, options: &WriteOptions) -> SpkResult<RemoteItem> {
        self.files.write_stream(path, stream, Some(options.mime_type())).await
    }

    async fn delete(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool> {
        self.files.delete(path, options).await
    }

    async fn delete_directory(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool> {
        self.directories.delete_directory(path, options).await
    }

    async fn create_directory(&self, path: &DrivePath) -> SpkResult<RemoteItem> {
        self.directories.ensure_directory(path).await
    }

    async fn list_contents(&self, path: &DrivePath, options: &ListOptions) -> SpkResult<Vec<RemoteItem>> {
        self.directories.list_children(path, options).await
    }

    async fn move_to(&self, source: &DrivePath, destination: &DrivePath) -> SpkResult<RemoteItem> {
        let (target_dir, name) = split_destination(destination)?;
        self.files.move_item(source, &target_dir, Some(name)).await
    }

    async fn copy_to(&self, source: &DrivePath, destination: &DrivePath) -> SpkResult<()> {
        let (target_dir, name) = split_destination(destination)?;
        self.files.copy(source, &target_dir, Some(name)).await.map(|_| ())
    }

    async fn mime_type(&self, path: &DrivePath) -> SpkResult<String> {
        self.files.mime_type(path).await
    }

    async fn file_size(&self, path: &DrivePath) -> SpkResult<u64> {
        self.files.size(path).await
    }

    async fn last_modified(&self, path: &DrivePath) -> SpkResult<i64> {
        self.files.last_modified(path).await
    }
}
