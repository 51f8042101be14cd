//! Remote drive items

use crate::DrivePath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    File,
    Folder,
}

/// A file or folder inside a drive, as last reported by the remote.
///
/// Values are transient snapshots; every lookup fetches a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    /// Full path relative to the drive (or prefix) root, when reported
    pub path: Option<DrivePath>,
    pub parent_id: Option<String>,
    pub kind: ItemKind,
    pub size: Option<u64>,
    /// Only ever set for files
    pub mime_type: Option<String>,
    /// Seconds since the Unix epoch
    pub last_modified: Option<i64>,
    /// The raw item payload
    pub extra: Map<String, Value>,
}

impl RemoteItem {
    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    /// Path for display, falling back to the bare name
    pub fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map(DrivePath::to_path_string)
            .unwrap_or_else(|| self.name.clone())
    }
}
