//! CLI glue: argument-count dispatch, source loading, and exit codes. Thin
//! on purpose: no argument-parsing crate for three branches of logic.
//!
//! This crate has no code generator, an external collaborator's job, so
//! "generated output" here is a debug dump of the parsed [`Item`] forest
//! rather than emitted object code. A real deployment wires a
//! [`kaleidoscope::CodeGenerator`] in before this dump step; this binary
//! exists to exercise the front end end-to-end, not to produce a linkable
//! `.o` file.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kaleidoscope::{parse_source, Config, Item, Source};

fn main() -> ExitCode {
    let args: Vec<OsString> = env::args_os().skip(1).collect();
    match args.as_slice() {
        [] => run_stdin(),
        [path] => run_file(path),
        _ => {
            eprintln!("usage: kaleidoscope [path]");
            ExitCode::from(1)
        }
    }
}

fn run_stdin() -> ExitCode {
    let mut contents = String::new();
    if io::stdin().read_to_string(&mut contents).is_err() {
        eprintln!("error: could not read standard input");
        return ExitCode::from(1);
    }
    let source = Source::new("<stdin>", contents);
    compile_and_report(source, None)
}

fn run_file(path: &OsString) -> ExitCode {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => {
            eprintln!("error: could not open '{}'", Path::new(path).display());
            return ExitCode::from(1);
        }
    };
    let name = Path::new(path).to_string_lossy().into_owned();
    let source = Source::new(name, contents);
    compile_and_report(source, Some(Path::new(path)))
}

fn compile_and_report(source: std::rc::Rc<Source>, output_path: Option<&Path>) -> ExitCode {
    let config = Config::from_env();
    let (result, report) = parse_source(source);

    for diagnostic in report.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    let items = match result {
        Ok(items) => items,
        // The fatal diagnostic is already among `report.diagnostics()` and
        // was printed by the loop above; nothing further to report here.
        Err(_fatal) => return ExitCode::from(1),
    };

    match output_path {
        None => {
            print!("{}", render(&items));
            ExitCode::SUCCESS
        }
        Some(path) => write_outputs(path, &items, &config),
    }
}

fn write_outputs(path: &Path, items: &[Item], config: &Config) -> ExitCode {
    let rendered = render(items);
    let object_path = with_appended_suffix(path, ".o");
    if fs::write(&object_path, &rendered).is_err() {
        eprintln!("error: could not write '{}'", object_path.display());
        return ExitCode::from(1);
    }
    if config.keep_intermediate_ir {
        let ir_path = with_appended_suffix(path, ".o.ll");
        if fs::write(&ir_path, &rendered).is_err() {
            eprintln!("error: could not write '{}'", ir_path.display());
            return ExitCode::from(1);
        }
    }
    ExitCode::SUCCESS
}

fn render(items: &[Item]) -> String {
    format!("{:#?}\n", items)
}

fn with_appended_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
