//! Directory lookups, listing and recursive provisioning

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::json;
use spk_core::{
    operations::{DeleteOptions, ListOptions},
    DrivePath, ItemKind, RemoteItem, SpkError, SpkResult,
};
use tracing::{debug, info, warn};

use crate::client::{RequestClient, RequestSpec, ResponseOutcome};
use crate::model::{parse_child, parse_item, ItemPage};
use crate::resolver::{ItemRef, PathResolver, Suffix};

const NAME_ALREADY_EXISTS: &str = "nameAlreadyExists";

/// Directory side of the drive: lookups, listings and `mkdir -p`
#[derive(Debug, Clone)]
pub struct DirectoryProvisioner {
    client: RequestClient,
    resolver: PathResolver,
}

impl DirectoryProvisioner {
    pub fn new(client: RequestClient, resolver: PathResolver) -> Self {
        Self { client, resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Metadata of any item; `None` when the remote reports it missing
    pub async fn item_metadata(&self, item: ItemRef<'_>) -> SpkResult<Option<RemoteItem>> {
        let context = describe(item);
        let url = self.resolver.item_url(item, None);
        match self.client.request(RequestSpec::get(url)).await.into_json(&context)? {
            Some(value) => parse_item(value, self.resolver.context()).map(Some),
            None => Ok(None),
        }
    }

    pub async fn directory_metadata(&self, path: &DrivePath) -> SpkResult<Option<RemoteItem>> {
        self.item_metadata(ItemRef::Path(path)).await
    }

    /// `false` when missing; a file at the path is a type mismatch
    pub async fn directory_exists(&self, path: &DrivePath) -> SpkResult<bool> {
        match self.directory_metadata(path).await? {
            None => Ok(false),
            Some(item) if item.is_folder() => Ok(true),
            Some(_) => Err(SpkError::NotADirectory(path.to_string())),
        }
    }

    /// Creates one folder named `name` under `parent_id`, or under the root.
    ///
    /// A name clash comes back as [`SpkError::AlreadyExists`]; every other
    /// remote error names the segment that failed.
    pub async fn create_directory(&self, name: &str, parent_id: Option<&str>) -> SpkResult<RemoteItem> {
        let url = match parent_id {
            Some(id) => self.resolver.by_id(id, Some(Suffix::Children)),
            None => self.resolver.by_path(&DrivePath::root(), Some(Suffix::Children)),
        };
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });

        let outcome = self.client.request(RequestSpec::post(url).json(body)).await;
        if outcome.error_code() == Some(NAME_ALREADY_EXISTS) {
            return Err(SpkError::AlreadyExists(name.to_string()));
        }

        match outcome {
            ResponseOutcome::Error { code, message, .. } => Err(SpkError::DirectoryCreation {
                segment: name.to_string(),
                message: format!("{code}: {message}"),
            }),
            ResponseOutcome::NotFound => Err(SpkError::DirectoryCreation {
                segment: name.to_string(),
                message: "parent directory does not exist".into(),
            }),
            outcome => {
                let value = outcome.require_json(name)?;
                parse_item(value, self.resolver.context())
            }
        }
    }

    /// Makes sure every segment of `path` exists as a folder (`mkdir -p`).
    ///
    /// Walks from the top segment down, looking each accumulated prefix up by
    /// path and creating it under the previous segment only when missing, so
    /// a repeated call performs lookups only. Returns the last segment.
    pub async fn ensure_directory(&self, path: &DrivePath) -> SpkResult<RemoteItem> {
        if path.is_root() {
            return Err(SpkError::InvalidPath(
                "cannot create the root directory, it always exists".into(),
            ));
        }

        let mut current: Option<RemoteItem> = None;
        for prefix in path.prefixes() {
            let segment = prefix.name().unwrap_or_default();
            let parent_id = current.as_ref().map(|item| item.id.as_str());

            let item = match self.directory_metadata(&prefix).await? {
                Some(item) => item,
                None => self.create_segment(&prefix, segment, parent_id).await?,
            };

            if !item.is_folder() {
                return Err(SpkError::NotADirectory(prefix.to_string()));
            }
            current = Some(item);
        }

        current.ok_or_else(|| SpkError::InvalidPath(path.to_string()))
    }

    async fn create_segment(
        &self,
        prefix: &DrivePath,
        segment: &str,
        parent_id: Option<&str>,
    ) -> SpkResult<RemoteItem> {
        match self.create_directory(segment, parent_id).await {
            Ok(item) => {
                info!(path = %prefix, id = %item.id, "created directory");
                Ok(item)
            }
            // Someone else created it between our lookup and create
            Err(SpkError::AlreadyExists(_)) => {
                warn!(path = %prefix, "directory appeared concurrently, reusing it");
                self.directory_metadata(prefix)
                    .await?
                    .ok_or_else(|| SpkError::DirectoryCreation {
                        segment: segment.to_string(),
                        message: "reported as existing but cannot be found".into(),
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// First page of children, in the order the remote returns them.
    ///
    /// Entries beyond the page size are not fetched; use
    /// [`list_children_pages`](Self::list_children_pages) to walk them all.
    pub async fn list_children(&self, path: &DrivePath, options: &ListOptions) -> SpkResult<Vec<RemoteItem>> {
        let mut pager = self.list_children_pages(path, options);
        Ok(pager.next_page().await?.unwrap_or_default())
    }

    pub fn list_children_pages(&self, path: &DrivePath, options: &ListOptions) -> ChildPager {
        ChildPager {
            directories: self.clone(),
            path: path.clone(),
            page_size: options.page_size(),
            state: PagerState::Start,
        }
    }

    /// Every child across all pages, fetched lazily
    pub fn list_children_stream(
        &self,
        path: &DrivePath,
        options: &ListOptions,
    ) -> BoxStream<'static, SpkResult<RemoteItem>> {
        self.list_children_pages(path, options).into_stream()
    }

    async fn fetch_page(&self, spec: RequestSpec, path: &DrivePath) -> SpkResult<(Vec<RemoteItem>, Option<String>)> {
        let context = path.to_string();
        let value = self.client.request(spec).await.require_json(&context)?;
        let page: ItemPage = serde_json::from_value(value)
            .map_err(|e| SpkError::MalformedResponse(format!("{context}: children listing: {e}")))?;

        let items = page
            .value
            .into_iter()
            .filter_map(|value| parse_child(value, self.resolver.context()).transpose())
            .collect::<SpkResult<Vec<_>>>()?;
        debug!(path = %path, count = items.len(), more = page.next_link.is_some(), "listed children");
        Ok((items, page.next_link))
    }

    pub async fn delete_directory(&self, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool> {
        self.delete_item(path, ItemKind::Folder, options).await
    }

    /// Deletes the item at `path` once it is confirmed to be of `kind`
    pub(crate) async fn delete_item(
        &self,
        path: &DrivePath,
        kind: ItemKind,
        options: &DeleteOptions,
    ) -> SpkResult<bool> {
        let result = self.lookup_and_delete(path, kind).await;
        settle_delete(result, path, options)
    }

    async fn lookup_and_delete(&self, path: &DrivePath, kind: ItemKind) -> SpkResult<()> {
        let item = self
            .item_metadata(ItemRef::Path(path))
            .await?
            .ok_or_else(|| SpkError::NotFound(path.to_string()))?;
        if item.kind != kind {
            return Err(match kind {
                ItemKind::File => SpkError::NotAFile(path.to_string()),
                ItemKind::Folder => SpkError::NotADirectory(path.to_string()),
            });
        }

        // Delete exactly the item that was checked
        let target = ItemRef::preferring_id(Some(path), Some(&item.id))?;
        let url = self.resolver.item_url(target, None);
        match self.client.request(RequestSpec::delete(url)).await.into_payload()? {
            Some(_) => {
                info!(path = %path, id = %item.id, "deleted item");
                Ok(())
            }
            None => Err(SpkError::NotFound(path.to_string())),
        }
    }
}

/// Applies the caller's delete policy to the outcome of a delete
fn settle_delete(result: SpkResult<()>, path: &DrivePath, options: &DeleteOptions) -> SpkResult<bool> {
    match result.map(|()| true) {
        Err(e) if options.ignore_errors => {
            warn!(path = %path, error = %e, "delete failed, ignoring");
            Ok(false)
        }
        other => other,
    }
}

fn describe(item: ItemRef<'_>) -> String {
    match item {
        ItemRef::Path(path) => path.to_string(),
        ItemRef::Id(id) => format!("item {id}"),
    }
}

#[derive(Debug, Clone)]
enum PagerState {
    Start,
    Next(String),
    Done,
}

/// Restartable walk over a directory's children, one page per request
#[derive(Debug, Clone)]
pub struct ChildPager {
    directories: DirectoryProvisioner,
    path: DrivePath,
    page_size: u32,
    state: PagerState,
}

impl ChildPager {
    /// Next page, or `None` once the continuation links run out
    pub async fn next_page(&mut self) -> SpkResult<Option<Vec<RemoteItem>>> {
        let spec = match &self.state {
            PagerState::Done => return Ok(None),
            PagerState::Start => {
                let url = self
                    .directories
                    .resolver
                    .by_path(&self.path, Some(Suffix::Children));
                RequestSpec::get(url).query("$top", self.page_size)
            }
            PagerState::Next(link) => RequestSpec::get(link.clone()),
        };

        let (items, next_link) = self.directories.fetch_page(spec, &self.path).await?;
        self.state = match next_link {
            Some(link) => PagerState::Next(link),
            None => PagerState::Done,
        };
        Ok(Some(items))
    }

    pub fn has_next(&self) -> bool {
        !matches!(self.state, PagerState::Done)
    }

    /// Starts over from the first page
    pub fn restart(&mut self) {
        self.state = PagerState::Start;
    }

    pub async fn collect_all(&mut self) -> SpkResult<Vec<RemoteItem>> {
        let mut all_items = Vec::new();
        while let Some(page) = self.next_page().await? {
            all_items.extend(page);
        }
        Ok(all_items)
    }

    pub fn into_stream(self) -> BoxStream<'static, SpkResult<RemoteItem>> {
        stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok::<_, SpkError>(page.map(|items| {
                let items = stream::iter(items.into_iter().map(Ok::<_, SpkError>));
                (items, pager)
            }))
        })
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;
    use crate::config::GraphClientConfig;
    use crate::resolver::DriveContext;
    use serde_json::Value;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DRIVE: &str = "/v1.0/drives/d1/items";

    fn provisioner(server: &MockServer) -> DirectoryProvisioner {
        let config = GraphClientConfig::default().with_base_url(server.uri());
        let client = RequestClient::new(&config, Credentials::bearer("t")).unwrap();
        DirectoryProvisioner::new(client, PathResolver::new(DriveContext::new("d1")))
    }

    fn folder(id: &str, name: &str, parent_path: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "folder": {"childCount": 0},
            "parentReference": {"path": format!("/drives/d1/root:{parent_path}")}
        })
    }

    fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "itemNotFound", "message": "The resource could not be found."}
        }))
    }

    async fn creates(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_ensure_directory_creates_missing_segments_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("A", "a", "")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a/b")))
            .respond_with(not_found())
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a/b/c")))
            .respond_with(not_found())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{DRIVE}/A/children")))
            .and(body_partial_json(json!({"name": "b", "folder": {}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(folder("B", "b", "/a")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{DRIVE}/B/children")))
            .and(body_partial_json(json!({"name": "c", "folder": {}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(folder("C", "c", "/a/b")))
            .expect(1)
            .mount(&server)
            .await;

        let item = provisioner(&server)
            .ensure_directory(&DrivePath::new("/a/b/c"))
            .await
            .unwrap();

        assert_eq!(item.id, "C");
        assert_eq!(item.path, Some(DrivePath::new("/a/b/c")));
        let names: Vec<Value> = creates(&server).await.into_iter().map(|b| b["name"].clone()).collect();
        assert_eq!(names, vec![json!("b"), json!("c")]);
    }

    #[tokio::test]
    async fn test_ensure_directory_first_segment_goes_under_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/top")))
            .respond_with(not_found())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{DRIVE}/root/children")))
            .and(body_partial_json(json!({
                "name": "top",
                "@microsoft.graph.conflictBehavior": "fail"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(folder("T", "top", "")))
            .expect(1)
            .mount(&server)
            .await;

        let item = provisioner(&server)
            .ensure_directory(&DrivePath::new("top"))
            .await
            .unwrap();
        assert_eq!(item.id, "T");
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("A", "a", "")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a/b")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("B", "b", "/a")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        let first = dirs.ensure_directory(&DrivePath::new("/a/b")).await.unwrap();
        let second = dirs.ensure_directory(&DrivePath::new("/a/b")).await.unwrap();

        assert_eq!(first, second);
        assert!(creates(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_directory_rejects_root() {
        let server = MockServer::start().await;
        let err = provisioner(&server)
            .ensure_directory(&DrivePath::root())
            .await
            .unwrap_err();
        assert!(matches!(err, SpkError::InvalidPath(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_directory_names_failing_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(not_found())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": "accessDenied", "message": "Access denied"}
            })))
            .mount(&server)
            .await;

        let err = provisioner(&server)
            .ensure_directory(&DrivePath::new("/locked/inner"))
            .await
            .unwrap_err();

        match err {
            SpkError::DirectoryCreation { segment, message } => {
                assert_eq!(segment, "locked");
                assert!(message.contains("accessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_directory_absorbs_concurrent_create() {
        let server = MockServer::start().await;
        // First lookup misses, the lookup after the conflict finds it
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/race")))
            .respond_with(not_found())
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/race")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("R", "race", "")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "nameAlreadyExists", "message": "Name already exists"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let item = provisioner(&server)
            .ensure_directory(&DrivePath::new("/race"))
            .await
            .unwrap();
        assert_eq!(item.id, "R");
    }

    #[tokio::test]
    async fn test_ensure_directory_through_a_file_is_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/notes.txt")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "F", "name": "notes.txt", "file": {"mimeType": "text/plain"}
            })))
            .mount(&server)
            .await;

        let err = provisioner(&server)
            .ensure_directory(&DrivePath::new("/notes.txt/sub"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpkError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_directory_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("A", "a", "")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/f.txt")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "F", "name": "f.txt", "file": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/missing")))
            .respond_with(not_found())
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        assert!(dirs.directory_exists(&DrivePath::new("/a")).await.unwrap());
        assert!(!dirs.directory_exists(&DrivePath::new("/missing")).await.unwrap());
        assert!(dirs
            .directory_exists(&DrivePath::new("/f.txt"))
            .await
            .unwrap_err()
            .is_type_mismatch());
    }

    #[tokio::test]
    async fn test_path_and_id_lookup_agree() {
        let server = MockServer::start().await;
        let body = folder("A", "a", "");
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/a")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/A")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        let a = DrivePath::new("/a");
        let by_path = dirs.item_metadata(ItemRef::Path(&a)).await.unwrap();
        let by_id = dirs.item_metadata(ItemRef::Id("A")).await.unwrap();
        assert_eq!(by_path, by_id);
    }

    #[tokio::test]
    async fn test_list_children_single_page_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/docs:/children")))
            .and(query_param("$top", "50000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": "2", "name": "z.txt", "file": {}},
                    {"id": "1", "name": "a", "folder": {}},
                    {"id": "3", "name": "m.pdf", "file": {"mimeType": "application/pdf"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = provisioner(&server)
            .list_children(&DrivePath::new("/docs"), &ListOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_list_children_skips_items_without_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root/children")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": "1", "name": "a.txt", "file": {}},
                    {"id": "NB", "name": "Notebook", "package": {"type": "oneNote"}},
                    {"id": "2", "name": "b", "folder": {}}
                ]
            })))
            .mount(&server)
            .await;

        let items = provisioner(&server)
            .list_children(&DrivePath::root(), &ListOptions::default())
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_list_children_missing_value_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let err = provisioner(&server)
            .list_children(&DrivePath::root(), &ListOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SpkError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_pager_follows_next_links_and_restarts() {
        let server = MockServer::start().await;
        let next = format!("{}/next-page?token=abc", server.uri());
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root/children")))
            .and(query_param("$top", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": "1", "name": "one", "file": {}},
                    {"id": "2", "name": "two", "file": {}}
                ],
                "@odata.nextLink": next
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next-page"))
            .and(query_param("token", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": "3", "name": "three", "file": {}}]
            })))
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        let options = ListOptions { page_size: Some(2) };

        let mut pager = dirs.list_children_pages(&DrivePath::root(), &options);
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 2);
        assert!(pager.has_next());
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 1);
        assert!(!pager.has_next());
        assert!(pager.next_page().await.unwrap().is_none());

        pager.restart();
        assert_eq!(pager.collect_all().await.unwrap().len(), 3);

        let streamed: Vec<String> = dirs
            .list_children_stream(&DrivePath::root(), &options)
            .map_ok(|item| item.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(streamed, vec!["1", "2", "3"]);

        // the single-page call stops after the first page
        let first = dirs.list_children(&DrivePath::root(), &options).await.unwrap();
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/old")))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder("OLD", "old", "")))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{DRIVE}/OLD")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/gone")))
            .respond_with(not_found())
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        assert!(dirs
            .delete_directory(&DrivePath::new("/old"), &DeleteOptions::strict())
            .await
            .unwrap());
        assert!(!dirs
            .delete_directory(&DrivePath::new("/gone"), &DeleteOptions::best_effort())
            .await
            .unwrap());
        assert!(dirs
            .delete_directory(&DrivePath::new("/gone"), &DeleteOptions::strict())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_delete_directory_refuses_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DRIVE}/root:/report.txt")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "F", "name": "report.txt", "file": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let dirs = provisioner(&server);
        let target = DrivePath::new("/report.txt");
        assert!(matches!(
            dirs.delete_directory(&target, &DeleteOptions::strict()).await,
            Err(SpkError::NotADirectory(_))
        ));
        assert!(!dirs
            .delete_directory(&target, &DeleteOptions::best_effort())
            .await
            .unwrap());
    }
}
