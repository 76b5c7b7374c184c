use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_RUNS_DIR: &str = "fit/runs";

/// Output directories for fit runs, one per invocation, named by start time.
pub struct RunManager {
    root_path: PathBuf,
}

impl RunManager {
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root_path = root.as_ref().to_path_buf();
        fs::create_dir_all(&root_path)?;
        Ok(Self { root_path })
    }

    /// Creates `<root>/<timestamp>`, suffixed if a run already started in the same second.
    pub fn create_run(&self) -> io::Result<String> {
        let timestamp = Local::now().format("%Y-%m-%d-%H%M%S").to_string();

        let mut name = timestamp.clone();
        let mut suffix = 1;
        while self.run_path(&name).exists() {
            name = format!("{}-{}", timestamp, suffix);
            suffix += 1;
        }

        fs::create_dir_all(self.run_path(&name))?;
        Ok(name)
    }

    pub fn run_path(&self, run: &str) -> PathBuf {
        self.root_path.join(run)
    }
}
