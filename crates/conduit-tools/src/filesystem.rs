//! Filesystem capabilities confined to a workspace directory.
//!
//! Each operation is a variant of [`FsOperation`]; a [`FilesystemTool`] pairs
//! one operation with the shared [`Workspace`]. Arguments are paths relative
//! to the workspace root. Absolute paths, `..` components and symlinks that
//! lead outside the root are rejected.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use conduit_models::config::FilesystemToolsConfig;
use tokio::fs;
use tracing::{debug, warn};

use crate::capability::Capability;
use crate::error::CapabilityError;

/// The root directory the filesystem tools operate in.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    max_search_depth: usize,
}

impl Workspace {
    /// Open a workspace. The root must be an existing directory.
    pub fn open(root: impl AsRef<Path>, max_search_depth: usize) -> Result<Self, CapabilityError> {
        let root = std::fs::canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(CapabilityError::InvalidArgument(format!(
                "workspace root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            max_search_depth,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied relative path inside the workspace.
    ///
    /// The path is checked twice: lexically (no absolute paths or `..`) and
    /// after following symlinks on its longest existing prefix, which must
    /// still lie under the root.
    async fn resolve(&self, relative: &str) -> Result<PathBuf, CapabilityError> {
        let relative = clean_argument(relative);
        let mut joined = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(CapabilityError::PermissionDenied(format!(
                        "path escapes the workspace: {relative}"
                    )))
                }
            }
        }
        self.confine(&joined, relative).await?;
        Ok(joined)
    }

    /// Follow symlinks on the longest existing prefix of `path` and check
    /// it stays inside the root.
    async fn confine(&self, path: &Path, shown: &str) -> Result<(), CapabilityError> {
        let mut existing = path;
        let mut missing_tail = false;
        loop {
            match fs::canonicalize(existing).await {
                Ok(real) => {
                    if !real.starts_with(&self.root) {
                        return Err(CapabilityError::PermissionDenied(format!(
                            "path escapes the workspace through a symlink: {shown}"
                        )));
                    }
                    let is_dir = fs::metadata(&real).await.map(|m| m.is_dir()).unwrap_or(false);
                    if missing_tail && !is_dir {
                        return Err(CapabilityError::InvalidArgument(format!(
                            "'{}' is not a directory",
                            self.relative_display(existing)
                        )));
                    }
                    return Ok(());
                }
                Err(e) => {
                    // Missing entries and files used as directories are
                    // skipped. An entry that exists but cannot be resolved is
                    // a dangling link or unreadable.
                    if let Ok(meta) = fs::symlink_metadata(existing).await {
                        if meta.file_type().is_symlink() {
                            return Err(CapabilityError::PermissionDenied(format!(
                                "'{}' is a dangling symlink",
                                self.relative_display(existing)
                            )));
                        }
                        return Err(e.into());
                    }
                    missing_tail = true;
                    existing = match existing.parent() {
                        Some(parent) => parent,
                        None => return Ok(()),
                    };
                }
            }
        }
    }

    /// Metadata for a resolved path, with a missing entry reported as `NotFound`.
    async fn metadata(&self, path: &Path) -> Result<std::fs::Metadata, CapabilityError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CapabilityError::NotFound(
                format!("'{}' does not exist", self.relative_display(path)),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn relative_display(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            ".".to_string()
        } else {
            relative.display().to_string()
        }
    }

    async fn entry_names(&self, dir: &Path, want_dirs: bool) -> Result<Vec<String>, CapabilityError> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CapabilityError::NotFound(format!(
                    "directory '{}' does not exist",
                    self.relative_display(dir)
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() == want_dirs {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Breadth-first search for a file by exact name. Symlinks are not followed.
    async fn find(&self, target: &str) -> Result<Option<PathBuf>, CapabilityError> {
        let mut queue = VecDeque::from([(self.root.clone(), 0usize)]);

        while let Some((dir, depth)) = queue.pop_front() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            let mut found = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_file() && entry.file_name().to_string_lossy() == target {
                    found.push(entry.path());
                } else if file_type.is_dir() {
                    subdirs.push(entry.path());
                }
            }

            if let Some(path) = found.into_iter().next() {
                return Ok(Some(path));
            }

            if depth < self.max_search_depth {
                subdirs.sort();
                queue.extend(subdirs.into_iter().map(|d| (d, depth + 1)));
            }
        }

        Ok(None)
    }
}

/// Strip whitespace and quotes models tend to wrap arguments in.
fn clean_argument(argument: &str) -> &str {
    argument.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// One filesystem operation exposed as a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOperation {
    ReadFile,
    FileSize,
    ListFiles,
    ListDirectories,
    FindFile,
    WriteFile,
    DeleteFile,
}

impl FsOperation {
    pub const READ_ONLY: [FsOperation; 5] = [
        FsOperation::ReadFile,
        FsOperation::FileSize,
        FsOperation::ListFiles,
        FsOperation::ListDirectories,
        FsOperation::FindFile,
    ];

    pub const WRITES: [FsOperation; 2] = [FsOperation::WriteFile, FsOperation::DeleteFile];

    pub fn name(self) -> &'static str {
        match self {
            FsOperation::ReadFile => "read_file",
            FsOperation::FileSize => "file_size",
            FsOperation::ListFiles => "list_files",
            FsOperation::ListDirectories => "list_directories",
            FsOperation::FindFile => "find_file",
            FsOperation::WriteFile => "write_file",
            FsOperation::DeleteFile => "delete_file",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FsOperation::ReadFile => "Useful for getting the content of a file. Input: file path.",
            FsOperation::FileSize => "Useful for getting the size of a file in bytes. Input: file path.",
            FsOperation::ListFiles => {
                "Useful for listing files in a directory. Input: directory path, '.' for the root."
            }
            FsOperation::ListDirectories => {
                "Useful for listing directories in a directory. Input: directory path, '.' for the root."
            }
            FsOperation::FindFile => {
                "Useful for finding a file by name in the workspace and its subdirectories. Input: file name."
            }
            FsOperation::WriteFile => {
                "Useful for writing content to a file. Input: file path and content separated by a comma, \
                 e.g. notes.txt,Hello"
            }
            FsOperation::DeleteFile => "Useful for deleting a file. Input: file path.",
        }
    }
}

pub struct FilesystemTool {
    operation: FsOperation,
    workspace: Arc<Workspace>,
}

impl FilesystemTool {
    pub fn new(operation: FsOperation, workspace: Arc<Workspace>) -> Self {
        Self {
            operation,
            workspace,
        }
    }

    async fn read_file(&self, argument: &str) -> Result<String, CapabilityError> {
        let path = self.workspace.resolve(argument).await?;
        let shown = self.workspace.relative_display(&path);
        if self.workspace.metadata(&path).await?.is_dir() {
            return Err(CapabilityError::InvalidArgument(format!(
                "'{shown}' is a directory, use list_files"
            )));
        }
        let bytes = fs::read(&path).await?;
        String::from_utf8(bytes).map_err(|_| {
            CapabilityError::InvalidArgument(format!("file '{shown}' contains invalid characters"))
        })
    }

    async fn file_size(&self, argument: &str) -> Result<String, CapabilityError> {
        let path = self.workspace.resolve(argument).await?;
        let meta = self.workspace.metadata(&path).await?;
        Ok(format!("{} bytes", meta.len()))
    }

    async fn list(&self, argument: &str, want_dirs: bool) -> Result<String, CapabilityError> {
        let path = self.workspace.resolve(argument).await?;
        let shown = self.workspace.relative_display(&path);
        if !self.workspace.metadata(&path).await?.is_dir() {
            return Err(CapabilityError::InvalidArgument(format!(
                "'{shown}' is a file, not a directory"
            )));
        }
        let names = self.workspace.entry_names(&path, want_dirs).await?;
        if names.is_empty() {
            let kind = if want_dirs { "directories" } else { "files" };
            return Ok(format!("No {kind} in '{shown}'"));
        }
        Ok(names.join("\n"))
    }

    async fn find_file(&self, argument: &str) -> Result<String, CapabilityError> {
        let target = clean_argument(argument);
        if target.is_empty() || target.contains('/') || target.contains('\\') {
            return Err(CapabilityError::InvalidArgument(format!(
                "expected a bare file name, got '{target}'"
            )));
        }
        match self.workspace.find(target).await? {
            Some(path) => Ok(format!(
                "The file \"{target}\" was found at \"{}\"",
                self.workspace.relative_display(&path)
            )),
            None => Ok(format!(
                "The file \"{target}\" was not found in the workspace or its subdirectories"
            )),
        }
    }

    async fn write_file(&self, argument: &str) -> Result<String, CapabilityError> {
        let (path_part, content) = argument.split_once(',').ok_or_else(|| {
            CapabilityError::InvalidArgument(
                "expected 'path,content' separated by a comma".to_string(),
            )
        })?;
        if clean_argument(path_part).is_empty() {
            return Err(CapabilityError::InvalidArgument(
                "missing file path before the comma".to_string(),
            ));
        }
        let path = self.workspace.resolve(path_part).await?;
        let shown = self.workspace.relative_display(&path);
        if fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(CapabilityError::InvalidArgument(format!(
                "'{shown}' is a directory"
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(format!("Wrote {} bytes to '{shown}'", content.len()))
    }

    async fn delete_file(&self, argument: &str) -> Result<String, CapabilityError> {
        let path = self.workspace.resolve(argument).await?;
        let shown = self.workspace.relative_display(&path);
        if self.workspace.metadata(&path).await?.is_dir() {
            return Err(CapabilityError::InvalidArgument(format!(
                "'{shown}' is a directory, only files can be deleted"
            )));
        }
        fs::remove_file(&path).await?;
        Ok(format!("Deleted '{shown}'"))
    }
}

#[async_trait]
impl Capability for FilesystemTool {
    fn name(&self) -> &str {
        self.operation.name()
    }

    fn description(&self) -> &str {
        self.operation.description()
    }

    async fn invoke(&self, argument: &str) -> Result<String, CapabilityError> {
        debug!(tool = self.operation.name(), "Filesystem tool invoked");
        match self.operation {
            FsOperation::ReadFile => self.read_file(argument).await,
            FsOperation::FileSize => self.file_size(argument).await,
            FsOperation::ListFiles => self.list(argument, false).await,
            FsOperation::ListDirectories => self.list(argument, true).await,
            FsOperation::FindFile => self.find_file(argument).await,
            FsOperation::WriteFile => self.write_file(argument).await,
            FsOperation::DeleteFile => self.delete_file(argument).await,
        }
    }
}

/// Build the filesystem tools enabled by `config`.
pub fn filesystem_capabilities(
    config: &FilesystemToolsConfig,
) -> Result<Vec<Arc<dyn Capability>>, CapabilityError> {
    let workspace = Arc::new(Workspace::open(&config.root, config.max_search_depth)?);

    let mut operations = FsOperation::READ_ONLY.to_vec();
    if config.allow_writes {
        operations.extend(FsOperation::WRITES);
    }

    Ok(operations
        .into_iter()
        .map(|op| Arc::new(FilesystemTool::new(op, Arc::clone(&workspace))) as Arc<dyn Capability>)
        .collect())
}
