//! Legacy VTK writer for ParaView visualization
//!
//! Serializes a parsed Tecplot zone into the legacy ASCII `UNSTRUCTURED_GRID`
//! grammar. Sections are written in a fixed order:
//!
//! 1. Preamble (version, description, `ASCII`, `DATASET UNSTRUCTURED_GRID`)
//! 2. `POINTS` from the `x`/`y`/`z` nodal fields (any case, missing axes are zero)
//! 3. `CELLS` with indices rebased from 1-based to 0-based
//! 4. `CELL_TYPES`
//! 5. `POINT_DATA` for nodal fields other than the coordinates
//! 6. `CELL_DATA` for cell-centered fields
//!
//! Empty data sections are left out entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tec_dat::MeshRecord;
//! use tec_io::VtkWriter;
//!
//! let raw = std::fs::read_to_string("wing_surface_nf.dat")?;
//! let mesh = MeshRecord::parse_str(&raw)?;
//! VtkWriter::new(&mesh).write_vtk("wing_surface_nf.vtk")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tec_dat::{ElementKind, MeshRecord};

pub const DEFAULT_TITLE: &str = "Converted from Tecplot";

/// The legacy header line is limited to 256 characters.
const MAX_TITLE_LEN: usize = 256;

/// VTK element type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtkCellType {
    Line = 3,
    Triangle = 5,
    Quad = 9,
}

impl From<ElementKind> for VtkCellType {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Line => VtkCellType::Line,
            ElementKind::Triangle => VtkCellType::Triangle,
            ElementKind::Quad => VtkCellType::Quad,
        }
    }
}

/// VTK writer for one mesh record
pub struct VtkWriter<'a> {
    mesh: &'a MeshRecord,
    title: String,
}

impl<'a> VtkWriter<'a> {
    pub fn new(mesh: &'a MeshRecord) -> Self {
        Self {
            mesh,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Replace the description line. Line breaks are flattened to spaces.
    pub fn with_title(mut self, title: &str) -> Self {
        let mut flat: String = title
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();
        if flat.len() > MAX_TITLE_LEN {
            let mut cut = MAX_TITLE_LEN;
            while !flat.is_char_boundary(cut) {
                cut -= 1;
            }
            flat.truncate(cut);
        }
        self.title = flat;
        self
    }

    /// Write a legacy `.vtk` file
    pub fn write_vtk<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()
    }

    /// Render the whole file into a string
    pub fn serialize(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_vtk_header(out)?;
        self.write_vtk_points(out)?;
        self.write_vtk_cells(out)?;
        self.write_vtk_point_data(out)?;
        self.write_vtk_cell_data(out)?;
        Ok(())
    }

    fn write_vtk_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# vtk DataFile Version 3.0")?;
        writeln!(out, "{}", self.title)?;
        writeln!(out, "ASCII")?;
        writeln!(out, "DATASET UNSTRUCTURED_GRID")?;
        Ok(())
    }

    /// Write node coordinates (POINTS)
    fn write_vtk_points<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let n = self.mesh.num_nodes;
        writeln!(out, "POINTS {n} float")?;

        // Present axes always hold `n` values; absent ones read as zero.
        let x = self.mesh.coordinate("x");
        let y = self.mesh.coordinate("y");
        let z = self.mesh.coordinate("z");

        for i in 0..n {
            writeln!(
                out,
                "{:.6} {:.6} {:.6}",
                axis_value(x, i),
                axis_value(y, i),
                axis_value(z, i)
            )?;
        }
        Ok(())
    }

    /// Write element connectivity (CELLS) and CELL_TYPES
    fn write_vtk_cells<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let num_elements = self.mesh.num_elements;
        let npe = self.mesh.nodes_per_element();

        writeln!(out)?;
        writeln!(out, "CELLS {} {}", num_elements, num_elements * (npe + 1))?;
        for element in self.mesh.elements() {
            write!(out, "{npe}")?;
            for &node in element {
                // Tecplot is 1-based, VTK is 0-based.
                write!(out, " {}", node - 1)?;
            }
            writeln!(out)?;
        }

        let cell_type = VtkCellType::from(self.mesh.element_kind) as i32;
        writeln!(out)?;
        writeln!(out, "CELL_TYPES {num_elements}")?;
        for _ in 0..num_elements {
            writeln!(out, "{cell_type}")?;
        }
        Ok(())
    }

    /// Write non-coordinate nodal fields (POINT_DATA)
    fn write_vtk_point_data<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut scalars = self.mesh.point_scalars().peekable();
        if scalars.peek().is_none() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "POINT_DATA {}", self.mesh.num_nodes)?;
        for (name, values) in scalars {
            write_scalars(out, name, values)?;
        }
        Ok(())
    }

    /// Write cell-centered fields (CELL_DATA)
    fn write_vtk_cell_data<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.mesh.cell_fields.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "CELL_DATA {}", self.mesh.num_elements)?;
        for (name, values) in self.mesh.cell_fields.iter() {
            write_scalars(out, name, values)?;
        }
        Ok(())
    }
}

fn axis_value(axis: Option<&[f64]>, i: usize) -> f64 {
    axis.map_or(0.0, |values| values[i])
}

fn write_scalars<W: Write>(out: &mut W, name: &str, values: &[f64]) -> io::Result<()> {
    writeln!(out, "SCALARS {} float 1", sanitize_name(name))?;
    writeln!(out, "LOOKUP_TABLE default")?;
    for value in values {
        writeln!(out, "{value:.6}")?;
    }
    Ok(())
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
