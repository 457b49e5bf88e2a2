//! Per-scenario sandbox directories.

use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const LOG_DIR: &str = "log";
const TMP_DIR: &str = "tmp";
pub(crate) const EXTERNAL_CLIENT_DIR: &str = "extclients";

/// Directory tree owned by exactly one scenario.
///
/// Holds `log/` and `tmp/` for the tester, staged client libraries, and any
/// synthesized cluster files. The tree is removed by [`Sandbox::close`], or
/// on drop if the owner unwinds before getting there.
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
    log_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox with a random name under `parent`.
    pub fn create_in(parent: &Path) -> Result<Self> {
        fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("scenario-")
            .tempdir_in(parent)?;

        let log_dir = dir.path().join(LOG_DIR);
        let tmp_dir = dir.path().join(TMP_DIR);
        fs::create_dir(&log_dir)?;
        fs::create_dir(&tmp_dir)?;

        debug!(path = %dir.path().display(), "Created sandbox");
        Ok(Self {
            dir,
            log_dir,
            tmp_dir,
        })
    }

    /// Sandbox root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the tester writes its logs to.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Directory the tester uses for temporary files.
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Directory for the multi-library layout, created on first use.
    pub fn external_client_dir(&self) -> Result<PathBuf> {
        let dir = self.path().join(EXTERNAL_CLIENT_DIR);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes `contents` to a freshly named `.cluster` file inside the sandbox.
    pub fn write_cluster_file(&self, contents: &str) -> Result<PathBuf> {
        let name = format!("{}.cluster", uuid::Uuid::new_v4().simple());
        let path = self.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Writes every file under the log directory to `out`, framed by marker lines.
    ///
    /// Files are visited in name order.
    pub fn dump_logs(&self, out: &mut dyn Write) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        for file in files {
            writeln!(out, ">>>>>>>>>>>>>>>>>>>> Contents of {}:", file.display())?;
            let content = fs::read(&file)?;
            out.write_all(&content)?;
            if !content.ends_with(b"\n") {
                writeln!(out)?;
            }
            writeln!(out, ">>>>>>>>>>>>>>>>>>>> End of {}", file.display())?;
        }
        Ok(())
    }

    /// Removes the sandbox tree.
    pub fn close(self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to remove sandbox");
            e
        })?;
        Ok(())
    }
}
