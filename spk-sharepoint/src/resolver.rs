//! Item addressing
//!
//! Graph reaches the same drive item two ways:
//!
//! - by id: `/v1.0/drives/{drive}/items/{id}{suffix}`
//! - by path: `/v1.0/drives/{drive}/items/root:/{prefix/}{path}:{suffix}`
//!
//! The drive root is `/v1.0/drives/{drive}/items/root{suffix}`, or the prefix
//! folder when the context is scoped to one.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use spk_core::{DrivePath, SpkError, SpkResult};

/// Characters escaped inside a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Drive an operation runs against, fixed for a connector's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveContext {
    drive_id: String,
    prefix: DrivePath,
}

impl DriveContext {
    pub fn new(drive_id: impl Into<String>) -> Self {
        Self {
            drive_id: drive_id.into(),
            prefix: DrivePath::root(),
        }
    }

    /// Scopes every path below `prefix`
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.prefix = DrivePath::new(prefix);
        self
    }

    pub fn drive_id(&self) -> &str {
        &self.drive_id
    }

    pub fn prefix(&self) -> &DrivePath {
        &self.prefix
    }

    /// Path as seen by the remote drive
    pub fn remote_path(&self, path: &DrivePath) -> DrivePath {
        self.prefix.join_path(path)
    }

    /// Path as seen by callers; `None` when it lies outside the prefix
    pub fn local_path(&self, remote: &DrivePath) -> Option<DrivePath> {
        remote.strip_prefix(&self.prefix)
    }
}

/// How an item is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef<'a> {
    Path(&'a DrivePath),
    Id(&'a str),
}

impl<'a> ItemRef<'a> {
    /// Picks the id when both are known; neither is a contract violation
    pub fn preferring_id(path: Option<&'a DrivePath>, id: Option<&'a str>) -> SpkResult<Self> {
        match (id, path) {
            (Some(id), _) => Ok(ItemRef::Id(id)),
            (None, Some(path)) => Ok(ItemRef::Path(path)),
            (None, None) => Err(SpkError::InvalidArgument(
                "either a path or an item id is required".into(),
            )),
        }
    }
}

/// Sub-resource of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix<'a> {
    Children,
    Content,
    Copy,
    /// Content of the named child, used for uploads into a folder
    ChildContent(&'a str),
}

impl Suffix<'_> {
    fn tail(&self) -> String {
        match self {
            Suffix::Children => "/children".into(),
            Suffix::Content => "/content".into(),
            Suffix::Copy => "/copy".into(),
            Suffix::ChildContent(name) => format!(":/{}:/content", encode_segment(name)),
        }
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn encode_path(path: &DrivePath) -> String {
    path.segments()
        .iter()
        .map(|s| format!("/{}", encode_segment(s)))
        .collect()
}

/// Builds item URLs for one drive
#[derive(Debug, Clone)]
pub struct PathResolver {
    context: DriveContext,
}

impl PathResolver {
    pub fn new(context: DriveContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &DriveContext {
        &self.context
    }

    pub fn item_url(&self, item: ItemRef<'_>, suffix: Option<Suffix<'_>>) -> String {
        match item {
            ItemRef::Id(id) => self.by_id(id, suffix),
            ItemRef::Path(path) => self.by_path(path, suffix),
        }
    }

    pub fn by_id(&self, id: &str, suffix: Option<Suffix<'_>>) -> String {
        format!(
            "/v1.0/drives/{}/items/{}{}",
            self.context.drive_id,
            encode_segment(id),
            suffix.map(|s| s.tail()).unwrap_or_default()
        )
    }

    pub fn by_path(&self, path: &DrivePath, suffix: Option<Suffix<'_>>) -> String {
        let remote = self.context.remote_path(path);
        let base = format!("/v1.0/drives/{}/items/root", self.context.drive_id);

        if remote.is_root() {
            return format!("{base}{}", suffix.map(|s| s.tail()).unwrap_or_default());
        }

        let tail = match suffix {
            None => String::new(),
            Some(Suffix::ChildContent(name)) => {
                return format!("{base}:{}:/content", encode_path(&remote.join(name)));
            }
            Some(other) => format!(":{}", other.tail()),
        };
        format!("{base}:{}{tail}", encode_path(&remote))
    }
}
