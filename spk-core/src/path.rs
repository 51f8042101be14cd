//! Drive path abstraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized, slash-delimited path inside a drive.
///
/// Always rendered with a single leading slash and no trailing slash; the
/// root is rendered as `/`. Empty, `.` and `..` segments are resolved at
/// construction, and `..` never climbs above the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DrivePath {
    segments: Vec<String>,
}

impl DrivePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::root().join(path)
    }

    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn join(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        for part in name.as_ref().split('/').filter(|s| !s.is_empty()) {
            if part == ".." {
                segments.pop();
            } else if part != "." {
                segments.push(part.to_string());
            }
        }
        Self { segments }
    }

    /// Concatenates another drive path below this one
    pub fn join_path(&self, other: &DrivePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Splits into parent directory and leaf name; `None` for the root
    pub fn split_leaf(&self) -> Option<(DrivePath, &str)> {
        let (leaf, parent) = self.segments.split_last()?;
        Some((
            Self {
                segments: parent.to_vec(),
            },
            leaf.as_str(),
        ))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Accumulated prefixes from the first segment down to this path.
    ///
    /// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`; the root yields nothing.
    pub fn prefixes(&self) -> impl Iterator<Item = DrivePath> + '_ {
        (1..=self.segments.len()).map(move |n| Self {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// Removes `prefix` from the front of this path, if it is one
    pub fn strip_prefix(&self, prefix: &DrivePath) -> Option<DrivePath> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }

    pub fn to_path_string(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

impl From<&str> for DrivePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for DrivePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<DrivePath> for String {
    fn from(path: DrivePath) -> Self {
        path.to_path_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let path = DrivePath::new("/reports/2024/q1");
        assert_eq!(path.segments(), ["reports", "2024", "q1"]);
    }

    #[test]
    fn test_new_handles_empty_segments() {
        let path = DrivePath::new("//reports//2024//");
        assert_eq!(path.segments(), ["reports", "2024"]);
        assert_eq!(path.to_path_string(), "/reports/2024");
    }

    #[test]
    fn test_root_forms() {
        assert!(DrivePath::new("").is_root());
        assert!(DrivePath::new("/").is_root());
        assert!(DrivePath::new("///").is_root());
        assert_eq!(DrivePath::root().to_path_string(), "/");
    }

    #[test]
    fn test_dot_segments() {
        let path = DrivePath::new("/a/./b/../c");
        assert_eq!(path.to_path_string(), "/a/c");

        let above_root = DrivePath::new("/../../x");
        assert_eq!(above_root.to_path_string(), "/x");
    }

    #[test]
    fn test_parent() {
        let path = DrivePath::new("/a/b/c.txt");
        assert_eq!(path.parent().unwrap().to_path_string(), "/a/b");
        assert!(DrivePath::root().parent().is_none());
    }

    #[test]
    fn test_split_leaf() {
        let path = DrivePath::new("/a/b/c.txt");
        let (parent, leaf) = path.split_leaf().unwrap();
        assert_eq!(parent.to_path_string(), "/a/b");
        assert_eq!(leaf, "c.txt");

        let top = DrivePath::new("/c.txt");
        let (parent, leaf) = top.split_leaf().unwrap();
        assert!(parent.is_root());
        assert_eq!(leaf, "c.txt");

        assert!(DrivePath::root().split_leaf().is_none());
    }

    #[test]
    fn test_prefixes() {
        let path = DrivePath::new("/a/b/c");
        let prefixes: Vec<String> = path.prefixes().map(|p| p.to_path_string()).collect();
        assert_eq!(prefixes, vec!["/a", "/a/b", "/a/b/c"]);

        assert_eq!(DrivePath::root().prefixes().count(), 0);
    }

    #[test]
    fn test_strip_prefix() {
        let path = DrivePath::new("/Shared/team/a.txt");
        let stripped = path.strip_prefix(&DrivePath::new("/Shared")).unwrap();
        assert_eq!(stripped.to_path_string(), "/team/a.txt");

        assert!(path.strip_prefix(&DrivePath::new("/Other")).is_none());
        assert_eq!(path.strip_prefix(&DrivePath::root()), Some(path.clone()));
    }

    #[test]
    fn test_join_path() {
        let prefix = DrivePath::new("/Shared");
        let joined = prefix.join_path(&DrivePath::new("/a/b"));
        assert_eq!(joined.to_path_string(), "/Shared/a/b");
    }

    #[test]
    fn test_serde_as_string() {
        let path = DrivePath::new("a/b");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/a/b\"");

        let back: DrivePath = serde_json::from_str("\"/a//b/\"").unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_equality() {
        assert_eq!(DrivePath::new("/a/b"), DrivePath::new("a/b/"));
    }
}
