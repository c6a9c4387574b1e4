use std::fmt::Display;
use std::io::IsTerminal;
use std::process;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, ValueEnum};
use exprcc::{CompileError, EvalError, codegen, parser, tokenizer, vm};
use tracing::{Level, info};

/// What to write to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
  /// Complete Intel-syntax program, ready for an assembler.
  Asm,
  /// Bare instruction list, one per line.
  Instructions,
  /// Token list with byte spans.
  Tokens,
  /// Expression tree as an s-expression.
  Ast,
}

#[derive(Debug, Parser)]
#[command(
  name = "exprcc",
  version,
  about = "Compile an arithmetic expression to x86-64 assembly"
)]
struct Cli {
  /// Expression to compile, e.g. "1+2*3"
  #[arg(allow_hyphen_values = true)]
  expr: String,

  #[arg(long, value_enum, default_value_t = Emit::Asm)]
  emit: Emit,

  /// Evaluate on the built-in stack machine and print the result
  #[arg(long, conflicts_with = "emit")]
  run: bool,

  /// Raise log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
      err.exit()
    }
    Err(err) => {
      let rendered = err.render().to_string();
      report(CompileError::usage(rendered.trim_end()))
    }
  };

  init_logging(cli.verbose);
  info!(expr = %cli.expr, emit = ?cli.emit, run = cli.run, "compiling");

  match render(&cli) {
    Ok(out) => print!("{out}"),
    Err(err) => report(err),
  }
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_target(false)
    .with_ansi(std::io::stderr().is_terminal())
    .with_writer(std::io::stderr)
    .init();
}

/// Single exit point for every failure: print the diagnostic and stop.
fn report(err: impl Display) -> ! {
  eprintln!("{err}");
  process::exit(1);
}

fn render(cli: &Cli) -> Result<String, EvalError> {
  let src = cli.expr.as_str();
  let tokens = tokenizer::tokenize(src)?;

  if cli.emit == Emit::Tokens {
    return Ok(
      tokens
        .iter()
        .map(|token| format!("{}\n", token.display(src)))
        .collect(),
    );
  }

  let ast = parser::parse(tokens, src)?;
  if cli.emit == Emit::Ast {
    return Ok(format!("{ast}\n"));
  }

  let code = codegen::generate(&ast);
  if cli.run {
    let value = vm::execute(&code)?;
    return Ok(format!("{value}\n"));
  }

  Ok(match cli.emit {
    Emit::Instructions => code.iter().map(|inst| format!("{inst}\n")).collect(),
    _ => codegen::render_program(&code),
  })
}
