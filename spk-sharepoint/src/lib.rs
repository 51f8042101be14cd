//! SharePoint backend for SharePoint Knife
//!
//! Microsoft Graph implementation of the path-addressed file facade for
//! SharePoint document libraries: request envelope, site/drive bootstrap,
//! path resolution, recursive directory provisioning and file operations.

pub mod auth;
pub mod client;
pub mod config;
pub mod connector;
pub mod directory;
pub mod files;
mod model;
pub mod resolver;
pub mod site;

pub use auth::AccessToken;
pub use client::{Credentials, Payload, RequestBody, RequestClient, RequestSpec, ResponseOutcome};
pub use config::{ConnectorConfig, GraphClientConfig};
pub use connector::SharePointConnector;
pub use directory::{ChildPager, DirectoryProvisioner};
pub use files::{CopyStatus, FileOperations};
pub use resolver::{DriveContext, ItemRef, PathResolver, Suffix};
pub use site::SiteDriveResolver;
