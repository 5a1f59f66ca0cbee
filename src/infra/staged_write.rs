use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const STAGING_SUFFIX: &str = ".ccresume.tmp";

/// New contents for a file, fully written and synced next to the target but
/// not yet visible under the target's name.
///
/// Dropping an uncommitted stage removes the temp file, leaving the target
/// exactly as it was.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    staged: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn stage(target: &Path, contents: &[u8]) -> io::Result<Self> {
        let staged = staging_path(target);
        let stage = Self {
            target: target.to_path_buf(),
            staged,
            committed: false,
        };

        let mut file = File::create(&stage.staged)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        if let Ok(meta) = fs::metadata(target) {
            fs::set_permissions(&stage.staged, meta.permissions())?;
        }

        debug!(target = %stage.target.display(), bytes = contents.len(), "staged file");
        Ok(stage)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replaces the target with the staged contents.
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.staged, &self.target)?;
        self.committed = true;
        debug!(target = %self.target.display(), "replaced file");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.staged);
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("staged"));
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}
