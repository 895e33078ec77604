use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use rng_check_core::{simplify, Root, SimplifyError, Validator, XmlNode};
use rng_check_xml::{parse_document, parse_grammar};

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(author, version, about = "Simplify Relax NG grammars and validate XML against them")]
struct App {
  #[clap(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Reduce a grammar to RELAX NG simple form and print it
  #[clap(display_order = 1)]
  Simplify(SimplifyArg),
  /// Reduce a grammar and report whether it certifies as simple form
  #[clap(display_order = 2)]
  Check(CheckArg),
  /// Validate an XML document against a grammar
  #[clap(display_order = 3)]
  Validate(ValidateArg),
}

#[derive(Args)]
struct SimplifyArg {
  /// Grammar file in RNG XML form
  grammar: PathBuf,
  /// Print the simplified grammar as JSON instead of the debug tree
  #[clap(long)]
  json: bool,
}

#[derive(Args)]
struct CheckArg {
  /// Grammar file in RNG XML form
  grammar: PathBuf,
}

#[derive(Args)]
struct ValidateArg {
  /// Grammar file in RNG XML form
  grammar: PathBuf,
  /// XML document to validate
  document: PathBuf,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();
  let app = App::parse();
  let result = match app.command {
    Commands::Simplify(arg) => run_simplify(arg),
    Commands::Check(arg) => run_check(arg),
    Commands::Validate(arg) => run_validate(arg),
  };
  if let Err(error) = result {
    exit_with_error(error);
  }
}

/// Structural grammar errors exit 2, everything else exits 1.
fn exit_with_error(error: anyhow::Error) -> ! {
  eprintln!("{error:#}");
  let structural =
    error.chain().any(|cause| cause.downcast_ref::<SimplifyError>().is_some());
  std::process::exit(if structural { 2 } else { 1 })
}

fn load_grammar(path: &Path) -> Result<Root> {
  let text = fs::read_to_string(path)
    .with_context(|| format!("cannot read grammar {}", path.display()))?;
  parse_grammar(&text).with_context(|| format!("cannot parse grammar {}", path.display()))
}

fn load_simplified(path: &Path) -> Result<Root> {
  let mut root = load_grammar(path)?;
  simplify(&mut root)
    .with_context(|| format!("cannot simplify grammar {}", path.display()))?;
  Ok(root)
}

fn run_simplify(arg: SimplifyArg) -> Result<()> {
  let root = load_simplified(&arg.grammar)?;
  if arg.json {
    println!("{}", serde_json::to_string_pretty(&root)?);
  } else {
    println!("{:#?}", root.pattern);
  }
  Ok(())
}

fn run_check(arg: CheckArg) -> Result<()> {
  let mut root = load_grammar(&arg.grammar)?;
  match simplify(&mut root) {
    Ok(()) => {
      println!("{}: valid simple form", arg.grammar.display());
      Ok(())
    }
    Err(SimplifyError::NotSimple) => {
      eprintln!("{}: did not reduce to simple form", arg.grammar.display());
      std::process::exit(1)
    }
    Err(error) => Err(error)
      .with_context(|| format!("cannot simplify grammar {}", arg.grammar.display())),
  }
}

fn run_validate(arg: ValidateArg) -> Result<()> {
  let root = load_simplified(&arg.grammar)?;
  let text = fs::read_to_string(&arg.document)
    .with_context(|| format!("cannot read document {}", arg.document.display()))?;
  let document = parse_document(&text)
    .with_context(|| format!("cannot parse document {}", arg.document.display()))?;

  let validator = Validator::new(&root);
  let plausible = validator
    .validate(&document)
    .with_context(|| format!("cannot validate {}", arg.document.display()))?;

  let problems = document.collect_problems(true);
  for (node, message) in &problems {
    println!("{}: {}", describe(node), message);
  }
  if !plausible || !problems.is_empty() {
    eprintln!("{}: invalid ({} problems)", arg.document.display(), problems.len());
    std::process::exit(1);
  }
  println!("{}: valid", arg.document.display());
  Ok(())
}

fn describe(node: &XmlNode) -> String {
  match node.name() {
    Some(name) => format!("<{name}>"),
    None => "#text".to_string(),
  }
}
