use loxwalk::{
    interpreter::Interpreter,
    printer,
    Error,
};
use clap::Parser;
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process,
};

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;

/// A tree-walking interpreter for Lox scripts. Starts an interactive prompt
/// when no script is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to run, or `-` to read it from standard input.
    script: Option<PathBuf>,

    /// Print the parsed program instead of running it.
    #[arg(long)]
    print_ast: bool,
}

fn main() -> io::Result<()> {
    let args = Args::try_parse().unwrap_or_else(|e| {
        if !e.use_stderr() {
            e.exit()
        }
        let _ = e.print();
        process::exit(EX_USAGE);
    });

    init_tracing();

    match args.script {
        Some(path) => run_file(&path, args.print_ast),
        None => run_prompt(args.print_ast),
    }
}

// Diagnostics go to stderr and only when RUST_LOG is set; stdout carries
// the program's own output.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_script(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(path)
    }
}

fn run_file(path: &Path, print_ast: bool) -> io::Result<()> {
    let source = read_script(path).unwrap_or_else(|e| {
        eprintln!("Could not read '{}': {}", path.display(), e);
        process::exit(EX_USAGE);
    });

    let mut lox = Lox::new(io::stdout(), io::stderr(), print_ast);
    match lox.run(source.as_str())? {
        Status::Success => Ok(()),
        failed => process::exit(failed.exit_code()),
    }
}

fn run_prompt(print_ast: bool) -> io::Result<()> {
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut out = io::stdout();

    let mut lox = Lox::new(io::stdout(), io::stderr(), print_ast);

    loop {
        write!(out, "> ")?;
        out.flush()?;

        buffer.clear();

        let num_bytes = stdin.read_line(&mut buffer)?;
        if num_bytes == 0 { break };

        lox.run(buffer.as_str())?;
    }

    Ok(())
}

enum Status {
    Success,
    StaticError,
    RuntimeError,
}

impl Status {
    fn exit_code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::StaticError => EX_DATAERR,
            Status::RuntimeError => EX_SOFTWARE,
        }
    }
}

/// One interpreter session. Globals persist from one `run` to the next.
struct Lox<Out, ErrOut> {
    interpreter: Interpreter<Out>,
    err_out: ErrOut,
    print_ast: bool,
}

impl <Out: Write, ErrOut: Write> Lox<Out, ErrOut> {
    fn new(out: Out, err_out: ErrOut, print_ast: bool) -> Self {
        Self {
            interpreter: Interpreter::new(out),
            err_out,
            print_ast,
        }
    }

    fn run(&mut self, source: &str) -> io::Result<Status> {
        let result = if self.print_ast {
            self.print(source)?
        } else {
            loxwalk::run(source, &mut self.interpreter)
        };

        match result {
            Ok(()) => Ok(Status::Success),
            Err(errors) => {
                for e in errors.iter() {
                    writeln!(self.err_out, "{}", e)?;
                }
                Ok(if errors.iter().all(is_static_error) {
                    Status::StaticError
                } else {
                    Status::RuntimeError
                })
            }
        }
    }

    fn print(&mut self, source: &str) -> io::Result<Result<(), Vec<Error>>> {
        let statements = match loxwalk::parse(source) {
            Ok(statements) => statements,
            Err(errors) => return Ok(Err(errors)),
        };

        let out = self.interpreter.writer_mut();
        for statement in statements.iter() {
            writeln!(out, "{}", printer::print_stmt(statement))?;
        }
        Ok(Ok(()))
    }
}

fn is_static_error(e: &Error) -> bool {
    e.lexical_kind().is_some() || e.syntax_kind().is_some()
}
