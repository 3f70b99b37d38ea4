//! The `poodle` binary.
//!
//! Compiles each input `.poo` file into a Go source file next to it (or in
//! `--out-dir`), optionally tidying imports with `goimports` and watching
//! for changes.

mod watch;

use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Parser;
use poodle_codegen::Options;
use poodle_workspace::Workspace;

#[derive(Parser)]
#[command(name = "poodle")]
#[command(about = "Compiles .poo templates into Go rendering functions")]
#[command(version)]
struct Cli {
    /// Folder to put generated files in
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Package name to set on generated files
    #[arg(long = "pkg", default_value = "main")]
    pkg: String,

    /// Make the first letter of all template names uppercase
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    export: bool,

    /// Run goimports on each file after it is generated
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    goimports: bool,

    /// Watch files for changes and recompile automatically
    #[arg(short = 'w', long)]
    watch: bool,

    /// Files to compile
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let opts = Options {
        package: cli.pkg.clone(),
        force_export: cli.export,
    };

    if let Err(err) = generate_all(&cli, &opts) {
        eprintln!("failed to generate files: {err}");
        std::process::exit(1);
    }

    if cli.watch {
        if let Err(err) = watch::watch_files(&cli, &opts) {
            eprintln!("failed to watch files: {err}");
            std::process::exit(1);
        }
    }
}

fn generate_all(cli: &Cli, opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut ws = Workspace::new(std::env::current_dir()?);
    for file in &cli.files {
        generate_file(&mut ws, file, cli, opts)
            .map_err(|err| format!("load file \"{}\": {err}", file.display()))?;
    }
    Ok(())
}

/// Compile one template and write `<out-dir>/<file>.go`.
fn generate_file(
    ws: &mut Workspace,
    file: &Path,
    cli: &Cli,
    opts: &Options,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let rel = file.to_string_lossy();
    let parsed = ws.load(&rel)?;
    let output = poodle_codegen::generate(&parsed, opts)?;

    let out_path = cli.out_dir.join(format!("{rel}.go"));
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("create output directory: {err}"))?;
        }
    }
    std::fs::write(&out_path, output).map_err(|err| format!("create output file: {err}"))?;

    if cli.goimports {
        let status = Command::new("goimports")
            .arg("-w")
            .arg(&out_path)
            .status()
            .map_err(|err| format!("run goimports on \"{}\": {err}", out_path.display()))?;
        if !status.success() {
            return Err(
                format!("run goimports on \"{}\": {status}", out_path.display()).into(),
            );
        }
    }

    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["poodle", "index.poo"]);
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert_eq!(cli.pkg, "main");
        assert!(cli.export);
        assert!(cli.goimports);
        assert!(!cli.watch);
        assert_eq!(cli.files, vec![PathBuf::from("index.poo")]);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "poodle",
            "--out-dir",
            "gen",
            "--pkg",
            "views",
            "--export",
            "false",
            "--goimports",
            "false",
            "-w",
            "a.poo",
            "b.poo",
        ]);
        assert_eq!(cli.out_dir, PathBuf::from("gen"));
        assert_eq!(cli.pkg, "views");
        assert!(!cli.export);
        assert!(!cli.goimports);
        assert!(cli.watch);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["poodle"]).is_err());
    }

    #[test]
    fn test_generate_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.poo"), "div Hello").unwrap();

        let cli = Cli::parse_from([
            "poodle",
            "--out-dir",
            dir.path().to_str().unwrap(),
            "--goimports",
            "false",
            "page.poo",
        ]);
        let opts = Options {
            package: "main".to_string(),
            force_export: true,
        };

        let mut ws = Workspace::new(dir.path());
        let out_path = generate_file(&mut ws, Path::new("page.poo"), &cli, &opts).unwrap();

        let generated = std::fs::read_to_string(out_path).unwrap();
        assert!(generated.contains("func Page(w *bufio.Writer) {"));
        assert!(generated.contains("w.WriteString(\"<div>Hello</div>\")"));
    }
}
