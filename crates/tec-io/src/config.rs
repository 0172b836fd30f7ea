use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUFFIX: &str = "_nf.dat";
pub const DEFAULT_OUTPUT_DIR: &str = "vtk_output";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// File-name suffix selecting inputs.
    pub suffix: String,
    /// Output directory. Relative paths resolve against the batch root.
    pub output_dir: PathBuf,
    /// Convert files on the rayon pool instead of one after another.
    pub parallel: bool,
    /// Where to write the JSON batch report, if anywhere.
    pub report: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            parallel: false,
            report: None,
        }
    }
}

impl BatchConfig {
    pub fn resolved_output_dir(&self, root: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            root.join(&self.output_dir)
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> io::Result<BatchConfig> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
