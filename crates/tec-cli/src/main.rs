use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tec_dat::MeshRecord;
use tec_io::{BatchConfig, BatchReport, FileKind, FileStatus, MeshSummary, load_config, save_report};

fn usage() {
    eprintln!("usage:");
    eprintln!("  tec-cli inspect <input.dat>");
    eprintln!("  tec-cli convert <input.dat> <output.vtk>");
    eprintln!(
        "  tec-cli batch <root> [--out DIR] [--suffix SUFFIX] [--config FILE] [--report FILE] [--parallel]"
    );
}

fn print_summary(summary: &MeshSummary, kind: FileKind) {
    println!("kind: {}", kind.as_str());
    println!("zone_type: {}", summary.element_kind.as_str());
    println!("nodes: {}", summary.num_nodes);
    println!("elements: {}", summary.num_elements);
    println!("point_fields: {}", summary.point_fields);
    println!("cell_fields: {}", summary.cell_fields);
}

fn inspect_file(path: &Path) -> Result<(), String> {
    let mesh = tec_io::read_mesh(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    print_summary(&MeshSummary::from_record(&mesh), FileKind::from_path(path));
    print_variables(&mesh);
    Ok(())
}

fn print_variables(mesh: &MeshRecord) {
    for (name, location) in mesh.variables.iter().zip(&mesh.locations) {
        println!("variable: {name} ({location:?})");
    }
}

fn convert(input: &Path, output: &Path) -> Result<(), String> {
    let summary = tec_io::convert_file(input, output)
        .map_err(|err| format!("{}: {}", input.display(), err))?;
    println!("{} -> {}", input.display(), output.display());
    print_summary(&summary, FileKind::from_path(input));
    Ok(())
}

/// Parse `batch` arguments (everything after the subcommand) into a root
/// directory and a config. Flags override values loaded with `--config`.
fn parse_batch_args(args: &[String]) -> Result<(PathBuf, BatchConfig), String> {
    let mut root: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut suffix: Option<String> = None;
    let mut report: Option<PathBuf> = None;
    let mut parallel = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--out" => out = Some(PathBuf::from(value("--out")?)),
            "--suffix" => suffix = Some(value("--suffix")?),
            "--config" => config_path = Some(PathBuf::from(value("--config")?)),
            "--report" => report = Some(PathBuf::from(value("--report")?)),
            "--parallel" => parallel = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ if root.is_none() => root = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }

    let root = root.ok_or_else(|| "missing <root>".to_string())?;
    let mut config = match config_path {
        Some(path) => load_config(&path)
            .map_err(|err| format!("failed to load config {}: {err}", path.display()))?,
        None => BatchConfig::default(),
    };
    if let Some(out) = out {
        config.output_dir = out;
    }
    if let Some(suffix) = suffix {
        config.suffix = suffix;
    }
    if report.is_some() {
        config.report = report;
    }
    config.parallel |= parallel;

    Ok((root, config))
}

fn print_batch(report: &BatchReport) {
    if report.outcomes.is_empty() {
        println!("no input files found in {}", report.root.display());
        return;
    }

    for outcome in &report.outcomes {
        match (outcome.status, &outcome.summary) {
            (FileStatus::Success, Some(summary)) => println!(
                "ok: {} -> {} kind={} points={} cells={} fields={}",
                outcome.input.display(),
                outcome.output.display(),
                outcome.kind.as_str(),
                summary.num_nodes,
                summary.num_elements,
                summary.field_tally()
            ),
            _ => eprintln!(
                "convert_error: {}: {}",
                outcome.input.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    println!("root: {}", report.root.display());
    println!("total_files: {}", report.total());
    println!("converted: {}", report.succeeded);
    println!("failed: {}", report.failed);
    println!("output_dir: {}", report.output_dir.display());
}

fn run_batch(args: &[String]) -> Result<usize, String> {
    let (root, config) = parse_batch_args(args)?;
    let report = tec_io::convert_batch(&root, &config)
        .map_err(|err| format!("{}: {}", root.display(), err))?;
    print_batch(&report);

    if let Some(path) = &config.report {
        save_report(path, &report)
            .map_err(|err| format!("failed to write report {}: {err}", path.display()))?;
        println!("report: {}", path.display());
    }
    Ok(report.failed)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("inspect") if args.len() == 3 => match inspect_file(Path::new(&args[2])) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("inspect_error: {err}");
                ExitCode::from(1)
            }
        },
        Some("convert") if args.len() == 4 => {
            match convert(Path::new(&args[2]), Path::new(&args[3])) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("convert_error: {err}");
                    ExitCode::from(1)
                }
            }
        }
        Some("batch") if args.len() >= 3 => match run_batch(&args[2..]) {
            Ok(0) => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(1),
            Err(err) => {
                eprintln!("batch_error: {err}");
                ExitCode::from(1)
            }
        },
        _ => {
            usage();
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn batch_defaults() {
        let (root, config) = parse_batch_args(&args(&["runs/case1"])).expect("should parse");
        assert_eq!(root, PathBuf::from("runs/case1"));
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn batch_flags_override_defaults() {
        let (root, config) = parse_batch_args(&args(&[
            "--parallel",
            "runs",
            "--out",
            "/tmp/vtk",
            "--suffix",
            ".dat",
            "--report",
            "report.json",
        ]))
        .expect("should parse");
        assert_eq!(root, PathBuf::from("runs"));
        assert!(config.parallel);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/vtk"));
        assert_eq!(config.suffix, ".dat");
        assert_eq!(config.report, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn batch_rejects_bad_arguments() {
        assert!(parse_batch_args(&args(&[])).is_err());
        assert!(parse_batch_args(&args(&["runs", "--out"])).is_err());
        assert!(parse_batch_args(&args(&["runs", "--jobs", "4"])).is_err());
        assert!(parse_batch_args(&args(&["runs", "more"])).is_err());
    }
}
