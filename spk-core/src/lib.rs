//! SharePoint Knife Core
//!
//! Backend-independent types and the storage facade shared by the
//! SharePoint provider and the command-line front end.

pub mod backend;
pub mod error;
pub mod item;
pub mod operations;
pub mod path;

pub use backend::{ByteStream, StorageBackend, Visibility};
pub use error::{SpkError, SpkResult};
pub use item::{ItemKind, RemoteItem};
pub use path::DrivePath;
