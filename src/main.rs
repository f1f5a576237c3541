// ==============================================================================
// CLI for the Thrift IDL Compiler
// ==============================================================================
//
//   h2o-thrift [OPTIONS] [CATALOG]
//
// Reads the schema catalog JSON from CATALOG (or stdin) and writes
// `<dest>/<namespace path>/H2O.thrift`, or prints it with `--stdout`.

use std::io::{self, IsTerminal as _, Read as _, Write as _};
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

use h2o_thrift::{Thrift, ThriftOutput};

const USAGE: &str = "Usage: h2o-thrift [OPTIONS] [CATALOG]";

const HELP: &str = "\
Compile an H2O schema catalog (JSON) into a Thrift IDL file.

Usage: h2o-thrift [OPTIONS] [CATALOG]

Arguments:
  [CATALOG]  Catalog JSON file (reads from stdin if omitted or `-`)

Options:
  -d, --dest <DIR>        Destination root for the generated file [default: .]
      --stdout            Print the document instead of writing a file
      --namespace <NS>    Thrift namespace, also used as the output path
                          [default: water.bindings.structs]
      --deny-cycles       Fail on dependency cycles instead of warning
  -v, --verbose           Log progress and the type translation map
  -h, --help              Print help
  -V, --version           Print version
";

// ==============================================================================
// Argument Parsing
// ==============================================================================

struct Args {
    catalog: Option<PathBuf>,
    dest: PathBuf,
    stdout: bool,
    namespace: Option<String>,
    deny_cycles: bool,
    verbose: bool,
}

enum Invocation {
    Run(Args),
    /// `--help` or `--version` was handled; nothing left to do.
    Done,
}

fn parse_args() -> Result<Invocation, lexopt::Error> {
    use lexopt::prelude::*;

    let mut args = Args {
        catalog: None,
        dest: PathBuf::from("."),
        stdout: false,
        namespace: None,
        deny_cycles: false,
        verbose: false,
    };

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('d') | Long("dest") => args.dest = parser.value()?.into(),
            Long("stdout") => args.stdout = true,
            Long("namespace") => args.namespace = Some(parser.value()?.string()?),
            Long("deny-cycles") => args.deny_cycles = true,
            Short('v') | Long("verbose") => args.verbose = true,
            Short('h') | Long("help") => {
                print!("{HELP}");
                return Ok(Invocation::Done);
            }
            Short('V') | Long("version") => {
                println!("h2o-thrift {}", env!("CARGO_PKG_VERSION"));
                return Ok(Invocation::Done);
            }
            Value(value) if args.catalog.is_none() => args.catalog = Some(value.into()),
            _ => return Err(arg.unexpected()),
        }
    }
    Ok(Invocation::Run(args))
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    let args = match parse_args() {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Done) => return Ok(()),
        Err(e) => {
            return Err(miette::miette!(
                help = "run `h2o-thrift --help` for all options",
                "{e}\n\n{USAGE}"
            ));
        }
    };

    init_logging(args.verbose);
    run(args)
}

/// `--verbose` turns on debug output for this crate; otherwise `RUST_LOG`
/// decides, defaulting to warnings only.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("h2o_thrift=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(args: Args) -> miette::Result<()> {
    let mut thrift = Thrift::new();
    if let Some(namespace) = args.namespace {
        thrift.namespace(namespace);
    }
    thrift.deny_cycles(args.deny_cycles);

    let result = match args.catalog.as_deref() {
        None => compile_stdin(&mut thrift),
        Some(path) if path == Path::new("-") => compile_stdin(&mut thrift),
        Some(path) => thrift.compile(path),
    };
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            for warning in thrift.drain_warnings() {
                eprintln!("{warning:?}");
            }
            return Err(e);
        }
    };

    for warning in &output.warnings {
        eprintln!("{warning:?}");
    }
    log_translation_map(&output);

    if args.stdout {
        write_stdout(&output.document)
    } else {
        output.write_to(&args.dest)?;
        Ok(())
    }
}

fn compile_stdin(thrift: &mut Thrift) -> miette::Result<ThriftOutput> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .into_diagnostic()
        .wrap_err("read catalog from stdin")?;
    thrift.compile_str_named(&source, "<stdin>")
}

fn log_translation_map(output: &ThriftOutput) {
    tracing::debug!("Type translation map:");
    for t in &output.translations {
        match &t.schema_name {
            Some(schema) => tracing::debug!("  {} ({schema}) -> {}", t.descriptor, t.thrift),
            None => tracing::debug!("  {} -> {}", t.descriptor, t.thrift),
        }
    }
}

/// Print the document. A closed pipe (e.g. `h2o-thrift --stdout | head`) is
/// not an error.
fn write_stdout(document: &str) -> miette::Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(document.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e).into_diagnostic().wrap_err("write to stdout"),
    }
}
