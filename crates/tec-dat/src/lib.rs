//! Reader for single-zone Tecplot ASCII FEBLOCK files.
//!
//! A file is parsed in two passes over the same text: a set of independent
//! directive lookups over the header (see [`header`]), then one flat numeric
//! stream that is sliced into nodal blocks, cell-centered blocks and the
//! connectivity block, in that order.
//!
//! ```
//! use tec_dat::{ElementKind, MeshRecord};
//!
//! let raw = "VARIABLES = \"X\",\"Y\"\nZONE N=2, E=1, ZONETYPE=FELINESEG\n0 1\n0 0\n1 2\n";
//! let mesh = MeshRecord::parse_str(raw)?;
//! assert_eq!(mesh.element_kind, ElementKind::Line);
//! assert_eq!(mesh.connectivity, vec![1, 2]);
//! # Ok::<(), tec_dat::FormatError>(())
//! ```

mod error;
mod header;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::FormatError;

/// Finite-element zone shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Line,
    Triangle,
    Quad,
}

impl ElementKind {
    /// Classify a normalized zone type by substring, so `FELINESEG`,
    /// `FETRIANGLE` and `FEQUADRILATERAL` all resolve.
    pub fn classify(zone_type: &str) -> Option<Self> {
        let upper = zone_type.to_ascii_uppercase();
        if upper.contains("LINESEG") {
            Some(ElementKind::Line)
        } else if upper.contains("TRIANGLE") {
            Some(ElementKind::Triangle)
        } else if upper.contains("QUAD") {
            Some(ElementKind::Quad)
        } else {
            None
        }
    }

    pub fn nodes_per_element(self) -> usize {
        match self {
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
            ElementKind::Quad => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Line => "FELINESEG",
            ElementKind::Triangle => "FETRIANGLE",
            ElementKind::Quad => "FEQUADRILATERAL",
        }
    }
}

/// Where a variable is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLocation {
    Nodal,
    CellCentered,
}

impl FieldLocation {
    fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("NODAL") {
            Some(FieldLocation::Nodal)
        } else if keyword.eq_ignore_ascii_case("CELLCENTERED") {
            Some(FieldLocation::CellCentered)
        } else {
            None
        }
    }
}

/// Named scalar columns kept in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Vec<f64>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column. Re-inserting an existing name replaces its values
    /// but keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = values,
            None => self.entries.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Exact match first, then the first ASCII case-insensitive match.
    pub fn get_ignore_case(&self, name: &str) -> Option<&[f64]> {
        self.get(name).or_else(|| {
            self.entries
                .iter()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
                .map(|(_, values)| values.as_slice())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True for `x`, `y` or `z` in any case.
pub fn is_coordinate(name: &str) -> bool {
    ["x", "y", "z"]
        .iter()
        .any(|axis| name.eq_ignore_ascii_case(axis))
}

/// One parsed FE zone.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub element_kind: ElementKind,
    /// Variable names in header order.
    pub variables: Vec<String>,
    /// One location per entry of `variables`.
    pub locations: Vec<FieldLocation>,
    pub nodal_fields: Fields,
    pub cell_fields: Fields,
    /// 1-based node indices, `nodes_per_element()` per element.
    pub connectivity: Vec<usize>,
}

impl MeshRecord {
    pub fn parse_str(raw: &str) -> Result<Self, FormatError> {
        let variables = header::variables(raw)?;
        let zone = header::zone(raw)?;
        let (num_nodes, num_elements) = header::dimensions(zone.line)?;
        let element_kind = header::element_kind(zone.line)?;
        let locations = header::locations(zone.line, variables.len())?;

        let data = header::numeric_tokens(&raw[header::data_start(raw, zone.end)..]);
        let mut cursor = DataCursor::new(&data);

        let mut nodal_fields = Fields::new();
        for name in located(&variables, &locations, FieldLocation::Nodal) {
            nodal_fields.insert(name, cursor.take(num_nodes, name)?.to_vec());
        }

        let mut cell_fields = Fields::new();
        for name in located(&variables, &locations, FieldLocation::CellCentered) {
            cell_fields.insert(name, cursor.take(num_elements, name)?.to_vec());
        }

        let nodes_per_element = element_kind.nodes_per_element();
        let raw_connectivity = cursor.take(
            num_elements.saturating_mul(nodes_per_element),
            "connectivity",
        )?;
        let connectivity = raw_connectivity
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                node_index(value, num_nodes).ok_or(FormatError::ConnectivityOutOfRange {
                    element: i / nodes_per_element + 1,
                    value,
                    num_nodes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MeshRecord {
            num_nodes,
            num_elements,
            element_kind,
            variables,
            locations,
            nodal_fields,
            cell_fields,
            connectivity,
        })
    }

    pub fn nodes_per_element(&self) -> usize {
        self.element_kind.nodes_per_element()
    }

    /// 1-based node indices of element `index` (0-based).
    pub fn element(&self, index: usize) -> Option<&[usize]> {
        let npe = self.nodes_per_element();
        let start = index.checked_mul(npe)?;
        self.connectivity.get(start..start + npe)
    }

    pub fn elements(&self) -> impl Iterator<Item = &[usize]> {
        self.connectivity.chunks_exact(self.nodes_per_element())
    }

    /// Coordinate column for `axis` (`"x"`, `"y"` or `"z"`), any case.
    pub fn coordinate(&self, axis: &str) -> Option<&[f64]> {
        self.nodal_fields.get_ignore_case(axis)
    }

    /// Nodal fields other than the coordinate axes.
    pub fn point_scalars(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.nodal_fields
            .iter()
            .filter(|(name, _)| !is_coordinate(name))
    }
}

impl FromStr for MeshRecord {
    type Err = FormatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse_str(raw)
    }
}

fn located<'a>(
    variables: &'a [String],
    locations: &'a [FieldLocation],
    wanted: FieldLocation,
) -> impl Iterator<Item = &'a str> {
    variables
        .iter()
        .zip(locations)
        .filter(move |(_, location)| **location == wanted)
        .map(|(name, _)| name.as_str())
}

/// Truncates toward zero; some exporters write indices as floats.
fn node_index(value: f64, num_nodes: usize) -> Option<usize> {
    let index = value.trunc();
    (index >= 1.0 && index <= num_nodes as f64).then_some(index as usize)
}

struct DataCursor<'a> {
    data: &'a [f64],
    pos: usize,
}

impl<'a> DataCursor<'a> {
    fn new(data: &'a [f64]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, count: usize, section: &str) -> Result<&'a [f64], FormatError> {
        let available = self.data.len() - self.pos;
        if count > available {
            return Err(FormatError::DataUnderflow {
                section: section.to_string(),
                needed: count,
                available,
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }
}
