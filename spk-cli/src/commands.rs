// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use bytes::Bytes;
use chrono::{DateTime, Utc};
use console::style;
use futures::TryStreamExt;
use spk_core::{
    operations::{DeleteOptions, ListOptions, WriteOptions},
    DrivePath, ItemKind, RemoteItem, SpkError, SpkResult, StorageBackend,
};
use spk_sharepoint::SharePointConnector;
use std::io::Write;
use std::path::Path;
use tabled::{Table, Tabled};
use tracing::debug;

use crate::settings;

/// Authenticates and binds to the configured drive
pub async fn connect(config: Option<&Path>, verbose: bool) -> SpkResult<SharePointConnector> {
    debug!(config = ?config, "loading settings");
    let config = settings::load(config)?;
    if verbose {
        eprintln!("Connecting to site {}", config.site);
    }
    SharePointConnector::connect(&config).await
}

/// Format a timestamp for display
fn format_time(ts: Option<i64>) -> String {
    ts.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_size(size: Option<u64>, human: bool) -> String {
    match size {
        Some(s) if human => bytesize::ByteSize(s).to_string(),
        Some(s) => s.to_string(),
        None => "-".to_string(),
    }
}

fn format_kind(kind: ItemKind) -> String {
    match kind {
        ItemKind::Folder => style("d").cyan().to_string(),
        ItemKind::File => "-".to_string(),
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl LsEntry {
    fn from_item(item: &RemoteItem, human: bool) -> Self {
        Self {
            kind: format_kind(item.kind),
            size: format_size(item.size, human),
            modified: format_time(item.last_modified),
            name: item.name.clone(),
        }
    }
}

/// List directory contents, following every page
pub async fn ls(sp: &SharePointConnector, path: &str, long: bool, human: bool, verbose: bool) -> SpkResult<()> {
    let path = DrivePath::new(path);
    if verbose {
        eprintln!("Listing: {path}");
    }

    let items: Vec<RemoteItem> = sp
        .directories()
        .list_children_stream(&path, &ListOptions::default())
        .try_collect()
        .await?;

    if items.is_empty() {
        println!("(empty directory)");
    } else if long {
        let entries: Vec<LsEntry> = items.iter().map(|i| LsEntry::from_item(i, human)).collect();
        println!("{}", Table::new(entries));
    } else {
        for item in &items {
            match item.kind {
                ItemKind::Folder => println!("{}/", style(&item.name).cyan()),
                ItemKind::File => println!("{}", item.name),
            }
        }
    }

    Ok(())
}

/// Display file contents
pub async fn cat(sp: &SharePointConnector, path: &str, verbose: bool) -> SpkResult<()> {
    let path = DrivePath::new(path);
    if verbose {
        eprintln!("Reading: {path}");
    }

    let mut content = sp.read_stream(&path).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = content.try_next().await? {
        stdout.write_all(&chunk)?;
    }
    stdout.flush()?;
    Ok(())
}

/// Upload a local file, creating remote folders as needed
pub async fn put(
    sp: &SharePointConnector,
    local: &Path,
    remote: &str,
    mime: Option<&str>,
    verbose: bool,
) -> SpkResult<()> {
    let mut target = DrivePath::new(remote);
    // `put report.pdf /docs/` keeps the local name
    if remote.ends_with('/') || target.is_root() {
        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SpkError::InvalidPath(local.display().to_string()))?;
        target = target.join(name);
    }

    let data = Bytes::from(tokio::fs::read(local).await?);
    if verbose {
        eprintln!("Uploading: {} -> {target} ({})", local.display(), bytesize::ByteSize(data.len() as u64));
    }

    let options = WriteOptions {
        mime_type: mime.map(String::from),
    };
    let item = sp.write(&target, data, &options).await?;
    println!("Uploaded {} -> {}", local.display(), item.display_path());
    Ok(())
}

/// Start a server-side copy
pub async fn cp(sp: &SharePointConnector, source: &str, dest: &str, verbose: bool) -> SpkResult<()> {
    let src_path = DrivePath::new(source);
    let dst_path = DrivePath::new(dest);
    if verbose {
        eprintln!("Copying: {src_path} -> {dst_path}");
    }

    let (target_dir, name) = dst_path
        .split_leaf()
        .ok_or_else(|| SpkError::InvalidPath("destination cannot be the root directory".into()))?;
    let status = sp.files().copy(&src_path, &target_dir, Some(name)).await?;

    match status.monitor_url {
        Some(url) if verbose => println!("Copy started {source} -> {dest} (monitor: {url})"),
        _ => println!("Copy started {source} -> {dest}"),
    }
    Ok(())
}

/// Move/rename files
pub async fn mv(sp: &SharePointConnector, source: &str, dest: &str, verbose: bool) -> SpkResult<()> {
    let src_path = DrivePath::new(source);
    let dst_path = DrivePath::new(dest);
    if verbose {
        eprintln!("Moving: {src_path} -> {dst_path}");
    }

    sp.move_to(&src_path, &dst_path).await?;
    println!("Moved {source} -> {dest}");
    Ok(())
}

fn delete_options(force: bool) -> DeleteOptions {
    if force {
        DeleteOptions::best_effort()
    } else {
        DeleteOptions::strict()
    }
}

/// Remove files
pub async fn rm(sp: &SharePointConnector, paths: &[String], force: bool, verbose: bool) -> SpkResult<()> {
    let options = delete_options(force);
    for path in paths {
        let target = DrivePath::new(path);
        if verbose {
            eprintln!("Removing: {target}");
        }

        if sp.delete(&target, &options).await? {
            println!("Removed {path}");
        } else {
            println!("{} {path}", style("Skipped").yellow());
        }
    }
    Ok(())
}

/// Remove directories and everything below them
pub async fn rmdir(sp: &SharePointConnector, paths: &[String], force: bool, verbose: bool) -> SpkResult<()> {
    let options = delete_options(force);
    for path in paths {
        let target = DrivePath::new(path);
        if verbose {
            eprintln!("Removing directory: {target}");
        }

        if sp.delete_directory(&target, &options).await? {
            println!("Removed {path}");
        } else {
            println!("{} {path}", style("Skipped").yellow());
        }
    }
    Ok(())
}

/// Create directories along with any missing parents
pub async fn mkdir(sp: &SharePointConnector, paths: &[String], verbose: bool) -> SpkResult<()> {
    for path in paths {
        let target = DrivePath::new(path);
        if verbose {
            eprintln!("Creating directory: {target}");
        }

        let item = sp.create_directory(&target).await?;
        println!("Created {}", item.display_path());
    }
    Ok(())
}

/// Show file/directory information
pub async fn stat(sp: &SharePointConnector, path: &str, verbose: bool) -> SpkResult<()> {
    let target = DrivePath::new(path);
    if verbose {
        eprintln!("Getting info: {target}");
    }

    let item = sp
        .metadata(&target)
        .await?
        .ok_or_else(|| SpkError::NotFound(target.to_string()))?;

    println!("  Path: {}", item.display_path());
    println!("  Id: {}", item.id);
    println!("  Type: {:?}", item.kind);

    if let Some(size) = item.size {
        println!("  Size: {} ({})", size, bytesize::ByteSize(size));
    }
    if let Some(mime) = &item.mime_type {
        println!("  MIME type: {mime}");
    }
    if item.last_modified.is_some() {
        println!("  Modified: {}", format_time(item.last_modified));
    }
    if let Some(url) = item.extra.get("webUrl").and_then(|v| v.as_str()) {
        println!("  URL: {url}");
    }

    Ok(())
}

/// Show the drive this configuration resolves to
pub async fn drive(sp: &SharePointConnector, _verbose: bool) -> SpkResult<()> {
    let context = sp.context();
    println!("Backend: {}", sp.display_name());
    println!("  Drive id: {}", context.drive_id());
    println!("  Prefix: {}", context.prefix());

    let root = DrivePath::root();
    let status = if sp.directory_exists(&root).await? {
        style("reachable").green()
    } else {
        style("missing").red()
    };
    println!("  Root: {status}");
    Ok(())
}
