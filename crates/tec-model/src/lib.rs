//! Per-file summary extracted from a parsed mesh record.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tec_dat::{ElementKind, MeshRecord};

/// Export family, guessed from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Line,
    Surface,
    Nacelle,
    Other,
}

impl FileKind {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("line") {
            FileKind::Line
        } else if lower.contains("surface") {
            FileKind::Surface
        } else if lower.contains("nacelle") {
            FileKind::Nacelle
        } else {
            FileKind::Other
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.file_name()
            .map(|name| Self::from_file_name(&name.to_string_lossy()))
            .unwrap_or(FileKind::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Line => "line",
            FileKind::Surface => "surface",
            FileKind::Nacelle => "nacelle",
            FileKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSummary {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub element_kind: ElementKind,
    /// Nodal fields excluding the coordinate axes.
    pub point_fields: usize,
    pub cell_fields: usize,
    pub connectivity_len: usize,
}

impl MeshSummary {
    pub fn from_record(mesh: &MeshRecord) -> Self {
        Self {
            num_nodes: mesh.num_nodes,
            num_elements: mesh.num_elements,
            element_kind: mesh.element_kind,
            point_fields: mesh.point_scalars().count(),
            cell_fields: mesh.cell_fields.len(),
            connectivity_len: mesh.connectivity.len(),
        }
    }

    /// `"<point>+<cell>"`, the field tally printed per converted file.
    pub fn field_tally(&self) -> String {
        format!("{}+{}", self.point_fields, self.cell_fields)
    }
}
