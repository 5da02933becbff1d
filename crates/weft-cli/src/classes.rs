use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use weft_classfile::ClassFile;
use weft_mixin::{ClassModel, InMemoryClassModels};

/// Loads every `.class` file under `root`.
///
/// Files that fail to parse are logged and skipped.
pub fn load_classes(root: &Path) -> Result<InMemoryClassModels> {
    if !root.is_dir() {
        anyhow::bail!("class directory {} does not exist", root.display());
    }

    let mut models = InMemoryClassModels::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("class") {
            continue;
        }

        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        match ClassFile::parse(&bytes) {
            Ok(class) => models.insert(ClassModel::from_classfile(class)),
            Err(err) => {
                tracing::warn!(
                    target = "weft.cli",
                    path = %path.display(),
                    error = %err,
                    "skipping unreadable class file"
                );
            }
        }
    }

    tracing::debug!(
        target = "weft.cli",
        root = %root.display(),
        classes = models.len(),
        "loaded class models"
    );
    Ok(models)
}
