use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tec_dat::MeshRecord;
use tec_model::MeshSummary;

use crate::error::Result;
use crate::vtk_writer::VtkWriter;

pub fn read_mesh(path: impl AsRef<Path>) -> Result<MeshRecord> {
    let raw = fs::read_to_string(path)?;
    Ok(MeshRecord::parse_str(&raw)?)
}

/// Read, parse and write one file. Nothing is written when parsing fails,
/// and a failed write leaves any previous `output` untouched.
pub fn convert_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<MeshSummary> {
    let mesh = read_mesh(input)?;
    let output = output.as_ref();
    ensure_parent_dir(output)?;
    write_replacing(&VtkWriter::new(&mesh), output)?;
    Ok(MeshSummary::from_record(&mesh))
}

/// Write into a hidden sibling and rename it over `output` once complete.
fn write_replacing(writer: &VtkWriter<'_>, output: &Path) -> io::Result<()> {
    let staging = staging_path(output);
    let written = writer
        .write_vtk(&staging)
        .and_then(|()| fs::rename(&staging, output));
    if written.is_err() {
        let _ = fs::remove_file(&staging);
    }
    written
}

fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

/// `<out_dir>/<name>` with `suffix` swapped for its `.vtk` counterpart
/// (`wing_nf.dat` -> `wing_nf.vtk`), or the extension replaced otherwise.
pub fn output_path_for(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let renamed = match (name.strip_suffix(suffix), suffix.rsplit_once('.')) {
        (Some(stem), Some((suffix_stem, _))) => format!("{stem}{suffix_stem}.vtk"),
        _ => Path::new(&name)
            .with_extension("vtk")
            .to_string_lossy()
            .into_owned(),
    };
    out_dir.join(renamed)
}

/// Recursively collect files whose name ends with `suffix`, sorted.
///
/// The `skip` directory (normally the output directory) is not entered, nor
/// is any directory below `root` carrying the same name, such as the
/// `case1/vtk_output` left behind by a run rooted at `case1`.
pub fn collect_dat_files(root: &Path, suffix: &str, skip: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let skip = skip.map(|dir| SkipDir {
        name: dir.file_name().map(|name| name.to_os_string()),
        canonical: fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()),
    });
    let mut out = Vec::<PathBuf>::new();
    collect_dat_files_inner(root, suffix, skip.as_ref(), &mut out)?;
    out.sort();
    Ok(out)
}

struct SkipDir {
    name: Option<OsString>,
    canonical: PathBuf,
}

impl SkipDir {
    fn matches(&self, path: &Path) -> bool {
        if self.name.is_some() && path.file_name() == self.name.as_deref() {
            return true;
        }
        path == self.canonical
            || fs::canonicalize(path).is_ok_and(|canonical| canonical == self.canonical)
    }
}

fn collect_dat_files_inner(
    root: &Path,
    suffix: &str,
    skip: Option<&SkipDir>,
    out: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            if skip.is_some_and(|skip| skip.matches(&path)) {
                continue;
            }
            collect_dat_files_inner(&path, suffix, skip, out)?;
            continue;
        }
        if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    const LINE_ZONE: &str = "VARIABLES = \"X\",\"Y\",\"Z\",\"Cp\"\n\
                             ZONE N=3, E=2, ZONETYPE=FELINESEG\n\
                             0 1 2\n0 0 0\n0 0 0\n0.1 0.2 0.3\n1 2\n2 3\n";

    #[test]
    fn output_name_swaps_suffix() {
        let out = Path::new("/out");
        assert_eq!(
            output_path_for(Path::new("/runs/a/wing_surface_nf.dat"), out, "_nf.dat"),
            PathBuf::from("/out/wing_surface_nf.vtk")
        );
        assert_eq!(
            output_path_for(Path::new("/runs/a/station.plt"), out, ".plt"),
            PathBuf::from("/out/station.vtk")
        );
        assert_eq!(
            output_path_for(Path::new("/runs/a/station.dat"), out, "_nf.dat"),
            PathBuf::from("/out/station.vtk")
        );
    }

    #[test]
    fn converts_into_missing_directory() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let input = dir.path().join("cut_line_nf.dat");
        fs::write(&input, LINE_ZONE).expect("write input");
        let output = dir.path().join("nested/out/cut_line_nf.vtk");

        let summary = convert_file(&input, &output).expect("conversion should succeed");
        assert_eq!(summary.num_nodes, 3);
        assert_eq!(summary.num_elements, 2);
        assert_eq!(summary.point_fields, 1);

        let vtk = fs::read_to_string(&output).expect("vtk should be readable");
        assert!(vtk.contains("CELLS 2 6\n2 0 1\n2 1 2\n"));
    }

    #[test]
    fn format_errors_leave_no_output() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let input = dir.path().join("bad_nf.dat");
        fs::write(&input, "ZONE N=1, E=1\n").expect("write input");
        let output = dir.path().join("bad_nf.vtk");

        let err = convert_file(&input, &output).expect_err("conversion should fail");
        assert!(matches!(err, ConvertError::Format(_)));
        assert!(!output.exists());
    }

    #[test]
    fn unreadable_input_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let err = read_mesh(dir.path().join("missing_nf.dat")).expect_err("should fail");
        assert!(matches!(err, ConvertError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn collects_by_suffix_and_skips_output_dir() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let root = dir.path();
        fs::create_dir_all(root.join("case_b")).expect("mkdir");
        fs::create_dir_all(root.join("vtk_output")).expect("mkdir");
        fs::write(root.join("case_b/wing_nf.dat"), "").expect("write");
        fs::write(root.join("a_nf.dat"), "").expect("write");
        fs::write(root.join("notes.dat"), "").expect("write");
        fs::write(root.join("vtk_output/stale_nf.dat"), "").expect("write");

        let files = collect_dat_files(root, "_nf.dat", Some(root.join("vtk_output").as_path()))
            .expect("collection should succeed");
        assert_eq!(files, vec![root.join("a_nf.dat"), root.join("case_b/wing_nf.dat")]);
    }

    #[test]
    fn skips_output_dirs_left_in_subdirectories() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let root = dir.path();
        fs::create_dir_all(root.join("case1/vtk_output")).expect("mkdir");
        fs::write(root.join("case1/wing_nf.dat"), "").expect("write");
        fs::write(root.join("case1/vtk_output/stale_nf.dat"), "").expect("write");

        let files = collect_dat_files(root, "_nf.dat", Some(root.join("vtk_output").as_path()))
            .expect("collection should succeed");
        assert_eq!(files, vec![root.join("case1/wing_nf.dat")]);
    }

    #[test]
    fn failed_write_keeps_previous_output() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let input = dir.path().join("cut_line_nf.dat");
        fs::write(&input, LINE_ZONE).expect("write input");

        // A directory in the output's place makes the final rename fail.
        let output = dir.path().join("out/cut_line_nf.vtk");
        fs::create_dir_all(output.join("keep")).expect("mkdir");

        let err = convert_file(&input, &output).expect_err("conversion should fail");
        assert!(matches!(err, ConvertError::Io(_)));
        assert!(output.join("keep").is_dir());

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
            .expect("list output dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("cut_line_nf.vtk")]);
    }

    #[test]
    fn successful_write_replaces_stale_output() {
        let dir = tempfile::tempdir().expect("create temp directory");
        let input = dir.path().join("cut_line_nf.dat");
        fs::write(&input, LINE_ZONE).expect("write input");
        let output = dir.path().join("cut_line_nf.vtk");
        fs::write(&output, "stale").expect("write stale output");

        convert_file(&input, &output).expect("conversion should succeed");
        let vtk = fs::read_to_string(&output).expect("vtk should be readable");
        assert!(vtk.starts_with("# vtk DataFile Version 3.0\n"));
        assert!(!dir.path().join(".cut_line_nf.vtk.partial").exists());
    }
}
