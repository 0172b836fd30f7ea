//! Conversion of Tecplot FEBLOCK exports into legacy VTK files.
//!
//! This crate provides:
//! - **Legacy VTK writer** (`UNSTRUCTURED_GRID`, ASCII) for a parsed [`tec_dat::MeshRecord`]
//! - **Single-file conversion** (read, parse, write) returning a [`MeshSummary`]
//! - **Discovery** of input files below a root directory by file-name suffix
//! - **Batch conversion** with per-file isolation, optionally on a rayon pool
//! - **JSON batch config and report** persistence

mod batch;
mod config;
mod convert;
pub mod error;
pub mod vtk_writer;

pub use batch::{BatchReport, FileOutcome, FileStatus, convert_batch, save_report};
pub use config::{BatchConfig, DEFAULT_OUTPUT_DIR, DEFAULT_SUFFIX, load_config};
pub use convert::{collect_dat_files, convert_file, output_path_for, read_mesh};
pub use error::{ConvertError, Result};
pub use vtk_writer::{VtkCellType, VtkWriter};

pub use tec_model::{FileKind, MeshSummary};
