//! Graph drive item payloads

use chrono::DateTime;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::Value;
use spk_core::{DrivePath, ItemKind, RemoteItem, SpkError, SpkResult};
use tracing::warn;

use crate::resolver::DriveContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: Option<String>,
    name: Option<String>,
    size: Option<u64>,
    last_modified_date_time: Option<String>,
    folder: Option<Value>,
    file: Option<FileFacet>,
    root: Option<Value>,
    parent_reference: Option<ParentReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileFacet {
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentReference {
    id: Option<String>,
    path: Option<String>,
}

/// Listing page: `value` plus the optional continuation link
#[derive(Debug, Deserialize)]
pub(crate) struct ItemPage {
    pub value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Parses an ISO-8601 timestamp into epoch seconds
pub(crate) fn parse_timestamp(raw: &str) -> SpkResult<i64> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .map_err(|e| SpkError::MalformedResponse(format!("invalid timestamp {raw:?}: {e}")))
}

/// Converts a drive item payload, keeping the raw object as extra metadata
pub(crate) fn parse_item(value: Value, context: &DriveContext) -> SpkResult<RemoteItem> {
    let item: DriveItem = serde_json::from_value(value.clone())
        .map_err(|e| SpkError::MalformedResponse(format!("drive item: {e}")))?;
    let extra = match value {
        Value::Object(map) => map,
        _ => return Err(SpkError::MalformedResponse("drive item is not an object".into())),
    };

    let id = item
        .id
        .ok_or_else(|| SpkError::MalformedResponse("drive item without id".into()))?;
    let name = item
        .name
        .ok_or_else(|| SpkError::MalformedResponse(format!("drive item {id} without name")))?;

    let kind = match (&item.folder, &item.file) {
        (Some(_), None) => ItemKind::Folder,
        (None, Some(_)) => ItemKind::File,
        _ => {
            return Err(SpkError::MalformedResponse(format!(
                "drive item {id} must be exactly one of file or folder"
            )))
        }
    };

    let remote_path = if item.root.is_some() {
        Some(DrivePath::root())
    } else {
        item.parent_reference
            .as_ref()
            .and_then(|parent| parent.path.as_deref())
            .and_then(parent_path)
            .map(|parent| parent.join(&name))
    };

    let last_modified = item
        .last_modified_date_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    Ok(RemoteItem {
        path: remote_path.and_then(|p| context.local_path(&p)),
        parent_id: item.parent_reference.and_then(|parent| parent.id),
        mime_type: item.file.and_then(|file| file.mime_type),
        size: item.size,
        id,
        name,
        kind,
        last_modified,
        extra,
    })
}

/// Listing entry; `None` for items that are neither file nor folder (OneNote
/// notebooks, for instance)
pub(crate) fn parse_child(value: Value, context: &DriveContext) -> SpkResult<Option<RemoteItem>> {
    if value.is_object() && value.get("file").is_none() && value.get("folder").is_none() {
        let id = value.get("id").and_then(Value::as_str).unwrap_or_default();
        warn!(id, "skipping child that is neither a file nor a folder");
        return Ok(None);
    }
    parse_item(value, context).map(Some)
}

/// `/drives/{id}/root:/a/b` becomes `/a/b`
fn parent_path(raw: &str) -> Option<DrivePath> {
    let (_, rest) = raw.split_once("root:")?;
    let decoded = percent_decode_str(rest).decode_utf8_lossy();
    Some(DrivePath::new(decoded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> DriveContext {
        DriveContext::new("b!drive")
    }

    #[test]
    fn test_parse_file() {
        let value = json!({
            "id": "01FILE",
            "name": "c.txt",
            "size": 5,
            "webUrl": "https://contoso.sharepoint.com/c.txt",
            "lastModifiedDateTime": "2024-03-01T12:00:00Z",
            "file": {"mimeType": "text/plain"},
            "parentReference": {"driveId": "b!drive", "id": "01DIR", "path": "/drives/b!drive/root:/a/b"}
        });

        let item = parse_item(value, &context()).unwrap();
        assert_eq!(item.id, "01FILE");
        assert!(item.is_file());
        assert_eq!(item.size, Some(5));
        assert_eq!(item.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(item.parent_id.as_deref(), Some("01DIR"));
        assert_eq!(item.path, Some(DrivePath::new("/a/b/c.txt")));
        assert_eq!(item.last_modified, Some(1_709_294_400));
        assert_eq!(item.extra["webUrl"], "https://contoso.sharepoint.com/c.txt");
    }

    #[test]
    fn test_parse_folder_under_root() {
        let value = json!({
            "id": "01DIR",
            "name": "My Docs",
            "folder": {"childCount": 0},
            "parentReference": {"id": "01ROOT", "path": "/drives/b!drive/root:"}
        });

        let item = parse_item(value, &context()).unwrap();
        assert!(item.is_folder());
        assert!(item.mime_type.is_none());
        assert_eq!(item.path, Some(DrivePath::new("/My Docs")));
    }

    #[test]
    fn test_parse_root_item() {
        let value = json!({"id": "01ROOT", "name": "root", "root": {}, "folder": {}});
        let item = parse_item(value, &context()).unwrap();
        assert_eq!(item.path, Some(DrivePath::root()));
    }

    #[test]
    fn test_encoded_parent_path() {
        let value = json!({
            "id": "1",
            "name": "x.txt",
            "file": {},
            "parentReference": {"path": "/drives/b!drive/root:/Q1%20Reports"}
        });
        let item = parse_item(value, &context()).unwrap();
        assert_eq!(item.path, Some(DrivePath::new("/Q1 Reports/x.txt")));
    }

    #[test]
    fn test_prefix_is_stripped() {
        let ctx = DriveContext::new("b!drive").with_prefix("/Shared");
        let value = json!({
            "id": "1",
            "name": "x.txt",
            "file": {},
            "parentReference": {"path": "/drives/b!drive/root:/Shared/a"}
        });
        let item = parse_item(value, &ctx).unwrap();
        assert_eq!(item.path, Some(DrivePath::new("/a/x.txt")));
    }

    #[test]
    fn test_kind_must_be_exclusive() {
        let both = json!({"id": "1", "name": "x", "file": {}, "folder": {}});
        assert!(matches!(parse_item(both, &context()), Err(SpkError::MalformedResponse(_))));

        let neither = json!({"id": "1", "name": "x"});
        assert!(matches!(parse_item(neither, &context()), Err(SpkError::MalformedResponse(_))));
    }

    #[test]
    fn test_child_without_kind_is_skipped() {
        let notebook = json!({"id": "NB", "name": "Notes", "package": {"type": "oneNote"}});
        assert!(parse_child(notebook, &context()).unwrap().is_none());

        let file = json!({"id": "1", "name": "x.txt", "file": {}});
        assert_eq!(parse_child(file, &context()).unwrap().unwrap().id, "1");

        let both = json!({"id": "2", "name": "x", "file": {}, "folder": {}});
        match parse_child(both, &context()) {
            Err(SpkError::MalformedResponse(message)) => assert!(message.contains("drive item 2")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(parse_child(json!(42), &context()).is_err());
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let no_id = json!({"name": "x", "file": {}});
        assert!(matches!(parse_item(no_id, &context()), Err(SpkError::MalformedResponse(_))));

        let bad_time = json!({"id": "1", "name": "x", "file": {}, "lastModifiedDateTime": "yesterday"});
        assert!(matches!(parse_item(bad_time, &context()), Err(SpkError::MalformedResponse(_))));

        assert!(parse_item(json!("just a string"), &context()).is_err());
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:10Z").unwrap(), 10);
        assert_eq!(parse_timestamp("1970-01-01T01:00:10+01:00").unwrap(), 10);
        assert!(parse_timestamp("").is_err());
    }
}
