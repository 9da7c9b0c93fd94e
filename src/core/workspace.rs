use crate::utils::error::{PcbLibError, Result};
use std::path::Path;
use tokio::fs;

/// 刪除並重新建立輸出目錄，確保不會留下上次執行的檔案
pub async fn rebuild_output_dir(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            tracing::debug!("Removing {}", path.display());
            fs::remove_dir_all(path)
                .await
                .map_err(|e| PcbLibError::filesystem(path, e))?;
        }
        Ok(_) => {
            fs::remove_file(path)
                .await
                .map_err(|e| PcbLibError::filesystem(path, e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(PcbLibError::filesystem(path, e)),
    }

    fs::create_dir_all(path)
        .await
        .map_err(|e| PcbLibError::filesystem(path, e))
}

/// Remove every top-level subdirectory of `path`, creating `path` if needed.
/// Regular files are left alone. Returns the number of directories removed.
pub async fn clear_subdirectories(path: &Path) -> Result<usize> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| PcbLibError::filesystem(path, e))?;

    let mut removed = 0;
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| PcbLibError::filesystem(path, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PcbLibError::filesystem(path, e))?
    {
        let entry_path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| PcbLibError::filesystem(&entry_path, e))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path)
                .await
                .map_err(|e| PcbLibError::filesystem(&entry_path, e))?;
            removed += 1;
        }
    }

    tracing::debug!("Removed {} directories under {}", removed, path.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rebuild_removes_stale_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("IPC7351-Least.pretty");
        std::fs::create_dir_all(out.join("nested")).unwrap();
        std::fs::write(out.join("stale.kicad_mod"), "old").unwrap();

        rebuild_output_dir(&out).await.unwrap();

        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a/b.pretty");
        rebuild_output_dir(&out).await.unwrap();
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_clear_subdirectories_keeps_files() {
        let dir = TempDir::new().unwrap();
        let models = dir.path().join("3d");
        std::fs::create_dir_all(models.join("smd/chip")).unwrap();
        std::fs::create_dir_all(models.join("dil")).unwrap();
        std::fs::write(models.join("license.txt"), "cc").unwrap();

        let removed = clear_subdirectories(&models).await.unwrap();

        assert_eq!(removed, 2);
        assert!(models.join("license.txt").exists());
        assert!(!models.join("smd").exists());
        assert!(!models.join("dil").exists());
    }

    #[tokio::test]
    async fn test_rebuild_under_regular_file_is_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let err = rebuild_output_dir(&blocker.join("IPC7351-Most.pretty"))
            .await
            .unwrap_err();

        match err {
            PcbLibError::FilesystemError { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("expected FilesystemError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_under_regular_file_is_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let err = clear_subdirectories(&blocker.join("3d")).await.unwrap_err();

        assert!(matches!(err, PcbLibError::FilesystemError { .. }));
        assert!(blocker.is_file());
    }
}
