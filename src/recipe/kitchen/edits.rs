// src/recipe/kitchen/edits.rs

//! Source tree edits and patch application
//!
//! Edits are staged in memory and written only once every edit and patch has
//! applied cleanly. A failure leaves the source tree exactly as it was.

use crate::error::{Error, Result};
use crate::resolver::SourceEdit;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const DEV_NULL: &str = "/dev/null";

/// Staged changes to a source tree
pub struct SourceEdits {
    root: PathBuf,
    /// New content per relative path; `None` deletes the file
    staged: BTreeMap<PathBuf, Option<String>>,
}

impl SourceEdits {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    /// Current content of `rel`, staged or on disk
    fn content(&self, rel: &Path) -> Result<Option<String>> {
        if let Some(staged) = self.staged.get(rel) {
            return Ok(staged.clone());
        }
        let path = self.root.join(rel);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))
    }

    /// Stage a planned source edit
    pub fn apply_edit(&mut self, edit: &SourceEdit) -> Result<()> {
        match edit {
            SourceEdit::Replace {
                file,
                search,
                replacement,
            } => {
                let rel = PathBuf::from(file);
                let current = self.content(&rel)?.ok_or_else(|| Error::PatchApplicationError {
                    target: file.clone(),
                    reason: "file does not exist".to_string(),
                })?;
                if !current.contains(search.as_str()) {
                    return Err(Error::PatchApplicationError {
                        target: file.clone(),
                        reason: format!("pattern not found: {}", search),
                    });
                }
                debug!("Rewriting {} in {}", search, file);
                self.staged
                    .insert(rel, Some(current.replace(search.as_str(), replacement)));
            }
            SourceEdit::Create { file, contents } => {
                debug!("Creating {}", file);
                self.staged.insert(PathBuf::from(file), Some(contents.clone()));
            }
        }
        Ok(())
    }

    /// Stage every hunk of a unified diff file
    ///
    /// Paths are stripped of `strip` leading components, as `patch -p` does.
    pub fn apply_patch(&mut self, name: &str, text: &str, strip: usize) -> Result<()> {
        let sections = split_patch(text);
        if sections.is_empty() {
            return Err(Error::PatchApplicationError {
                target: name.to_string(),
                reason: "no file changes found".to_string(),
            });
        }

        let fail = |reason: String| Error::PatchApplicationError {
            target: name.to_string(),
            reason,
        };

        for section in sections {
            let patch = diffy::Patch::from_str(&section).map_err(|e| fail(e.to_string()))?;

            let original = patch.original().map(header_path);
            let modified = patch.modified().map(header_path);
            let target = match (original, modified) {
                (_, Some(m)) if m != DEV_NULL => m,
                (Some(o), _) if o != DEV_NULL => o,
                _ => return Err(fail("diff names no file".to_string())),
            };
            let rel = strip_components(target, strip)
                .ok_or_else(|| fail(format!("cannot strip {} components from {}", strip, target)))?;

            let creating = original == Some(DEV_NULL);
            let base = match self.content(&rel)? {
                Some(content) => content,
                None if creating => String::new(),
                None => {
                    return Err(fail(format!("{} does not exist", rel.display())));
                }
            };

            let patched = diffy::apply(&base, &patch)
                .map_err(|e| fail(format!("{}: {}", rel.display(), e)))?;

            if modified == Some(DEV_NULL) {
                self.staged.insert(rel, None);
            } else {
                self.staged.insert(rel, Some(patched));
            }
        }

        info!("Applied patch: {}", name);
        Ok(())
    }

    /// Stage every `*.patch` / `*.diff` file in `dir`, in file name order
    pub fn apply_patch_dir(&mut self, dir: &Path, strip: usize) -> Result<Vec<String>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", dir.display(), e)))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("patch") | Some("diff")
                    )
            })
            .collect();
        files.sort();

        let mut applied = Vec::with_capacity(files.len());
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = fs::read_to_string(&path)
                .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
            self.apply_patch(&name, &text, strip)?;
            applied.push(name);
        }
        Ok(applied)
    }

    /// Relative paths with staged changes
    pub fn touched(&self) -> Vec<&Path> {
        self.staged.keys().map(|p| p.as_path()).collect()
    }

    /// Write all staged changes to disk
    ///
    /// New contents go to temporary siblings first; the originals are only
    /// replaced once every file has been written out.
    pub fn commit(self) -> Result<usize> {
        let count = self.staged.len();
        let mut writes = Vec::new();
        let mut removals = Vec::new();

        for (rel, content) in self.staged {
            let path = self.root.join(&rel);
            match content {
                Some(content) => {
                    let parent = path.parent().unwrap_or(&self.root);
                    let staged = stage_file(parent, &content).map_err(|e| {
                        Error::IoError(format!("Failed to write {}: {}", path.display(), e))
                    })?;
                    writes.push((staged, path));
                }
                None => removals.push(path),
            }
        }

        for (staged, path) in writes {
            staged.persist(&path).map_err(|e| {
                Error::IoError(format!("Failed to replace {}: {}", path.display(), e))
            })?;
        }
        for path in removals {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(count)
    }
}

fn stage_file(dir: &Path, content: &str) -> std::io::Result<NamedTempFile> {
    fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

/// Split a multi-file unified diff into one section per file
fn split_patch(text: &str) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let starts_file = line.starts_with("--- ")
            && lines.peek().is_some_and(|next| next.starts_with("+++ "));
        if starts_file {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(String::new());
        }
        if let Some(section) = current.as_mut() {
            section.push_str(line);
            section.push('\n');
        }
    }
    if let Some(done) = current {
        sections.push(done);
    }
    sections
}

/// Path from a `---`/`+++` header, without a trailing timestamp
fn header_path(raw: &str) -> &str {
    raw.split('\t').next().unwrap_or(raw).trim()
}

/// Drop `strip` leading components and reject paths escaping the tree
fn strip_components(path: &str, strip: usize) -> Option<PathBuf> {
    let mut rel = PathBuf::new();
    for component in Path::new(path).components().skip(strip) {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!rel.as_os_str().is_empty()).then_some(rel)
}
