//! INI command-line tool for checking, formatting, editing, and transcoding
//! INI documents.
//!
//! Usage: ini [OPTIONS] [FILE]
//!
//! Reads FILE (or stdin), applies any `--set`/`--remove` edits, and prints the
//! document in the requested format. Set `RUST_LOG=debug` to see what the
//! parser and the edits are doing.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use libini::{
    encode, parse_with_filename, read_or_default, AddOptions, CommentUpdate, Document, Format,
    IniError, IniLine, Recovery, Scope, Section, Value,
};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod transcode;

/// Exit status when `--get` finds nothing.
const EXIT_NOT_FOUND: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Ini,
    Toml,
    #[value(alias = "yml")]
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// INI, untouched lines exactly as read
    Ini,
    /// INI, every line rebuilt in canonical form
    Canonical,
    Json,
    Toml,
    #[value(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ini | OutputFormat::Canonical => "ini",
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
            OutputFormat::Yaml => "yaml",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ini")]
#[command(about = "Check, format, edit, and transcode INI documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Input file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = InputFormat::Ini)]
    from: InputFormat,

    /// Output format
    #[arg(short, long, value_enum, env = "INI_FORMAT", default_value_t = OutputFormat::Ini)]
    to: OutputFormat,

    /// Check that the input is valid and print nothing else
    #[arg(long)]
    check: bool,

    /// Section for --get, --set, and --remove (default: the global scope)
    #[arg(long, value_name = "NAME")]
    section: Option<String>,

    /// Print one value; exits with status 2 if the key is absent
    #[arg(long, value_name = "KEY", conflicts_with_all = ["set", "remove", "check"])]
    get: Option<String>,

    /// Set or add a value, written as INI value text
    #[arg(long, value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Let --set change the kind of an existing value
    #[arg(long, requires = "set")]
    force_type: bool,

    /// Remove a key
    #[arg(long, value_name = "KEY")]
    remove: Vec<String>,

    /// Write output back to the input file (extension follows --to)
    #[arg(short, long, conflicts_with = "output")]
    write: bool,

    /// Write output to the specified file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Start from an empty document when the input is malformed
    #[arg(long)]
    reset_invalid: bool,
}

fn entrypoint() -> Result<ExitCode> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut doc = load(&cli)?;

    if cli.check {
        println!("ok");
        return Ok(ExitCode::SUCCESS);
    }

    let section = cli.section.as_deref();

    if let Some(key) = &cli.get {
        return Ok(match lookup(&doc, section, key) {
            Some(value) => {
                println!("{}", value);
                ExitCode::SUCCESS
            }
            None => {
                debug!("{} not found", key);
                ExitCode::from(EXIT_NOT_FOUND)
            }
        });
    }

    for assignment in &cli.set {
        set_entry(&mut doc, section, assignment, cli.force_type)
            .with_context(|| format!("--set {}", assignment))?;
    }
    for key in &cli.remove {
        let removed = match section {
            Some(name) => doc.remove_value_in(name, key),
            None => doc.remove_value(key),
        };
        if removed {
            info!("removed {}", key);
        } else {
            warn!("--remove {}: no such key", key);
        }
    }

    let output = render(&doc, cli.to)?;
    write_output(&output, &cli)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match entrypoint() {
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
        Ok(code) => code,
    }
}

/// Read and decode the input.
fn load(cli: &Cli) -> Result<Document> {
    if cli.from == InputFormat::Ini && cli.reset_invalid {
        if let Some(path) = &cli.file {
            let (doc, recovery) = read_or_default(path)?;
            if let Recovery::Reset(e) = &recovery {
                info!("ignoring malformed input: {}", e);
            }
            return Ok(doc);
        }
    }

    let input = read_input(cli.file.as_deref())?;
    match cli.from {
        InputFormat::Ini => {
            let filename = cli.file.as_deref().map(display_name);
            match parse_with_filename(&input, filename.as_deref()) {
                Ok(doc) => Ok(doc),
                Err(e) if cli.reset_invalid && e.is_malformed_document() => {
                    warn!("{}; starting from an empty document", e);
                    Ok(Document::new())
                }
                Err(e) => Err(e.into()),
            }
        }
        InputFormat::Toml => transcode::toml::decode(&input),
        InputFormat::Yaml => transcode::yaml::decode(&input),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Error reading stdin")?;
            Ok(buffer)
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn scope<'a>(doc: &'a Document, section: Option<&str>) -> Option<&'a Scope> {
    match section {
        Some(name) => doc.section(name).map(Section::body),
        None => Some(doc.root()),
    }
}

fn lookup<'a>(doc: &'a Document, section: Option<&str>, key: &str) -> Option<&'a Value> {
    scope(doc, section).and_then(|s| s.get(key))
}

/// Apply one `KEY=VALUE` assignment. Existing keys keep their kind unless
/// `force_type` is set; missing sections are created.
fn set_entry(
    doc: &mut Document,
    section: Option<&str>,
    assignment: &str,
    force_type: bool,
) -> Result<()> {
    let (key, text) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE"))?;
    let (key, text) = (key.trim(), text.trim());
    if text.is_empty() {
        bail!("empty value for {}", key);
    }

    let scope = match section {
        Some(name) => {
            if doc.create_section(name, &[], None)? {
                info!("created section [{}]", name);
            }
            doc.section_mut(name)
                .map(Section::body_mut)
                .ok_or_else(|| anyhow!("section [{}] is missing", name))?
        }
        None => doc.root_mut(),
    };

    match scope.find(key).and_then(IniLine::value_type) {
        Some(kind) if !force_type => {
            let value = Value::decode_as(text, kind).map_err(|found| IniError::TypeMismatch {
                key: key.to_string(),
                expected: kind,
                found,
            })?;
            scope.set_value(key, value, CommentUpdate::Keep)?;
            debug!("set {} = {}", key, text);
        }
        Some(_) => {
            scope.set_value_ignoring_type(key, Value::infer(text), CommentUpdate::Keep)?;
            debug!("set {} = {} (kind may change)", key, text);
        }
        None => {
            scope.add_value(key, Value::infer(text), AddOptions::default())?;
            info!("added {} = {}", key, text);
        }
    }
    Ok(())
}

fn render(doc: &Document, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Ini => Ok(encode(doc, Format::Ini)),
        OutputFormat::Canonical => Ok(encode(doc, Format::Canonical)),
        OutputFormat::Json => Ok(encode(doc, Format::Json)),
        OutputFormat::Toml => {
            transcode::toml::encode(doc).context("Cannot convert to TOML")
        }
        OutputFormat::Yaml => {
            transcode::yaml::encode(doc).context("Cannot convert to YAML")
        }
    }
}

fn write_output(output: &str, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.output {
        fs::write(path, output).with_context(|| format!("Error writing {}", path.display()))?;
    } else if cli.write {
        let input_path = cli
            .file
            .as_deref()
            .ok_or_else(|| anyhow!("--write requires an input file"))?;
        let output_path = input_path.with_extension(cli.to.extension());
        fs::write(&output_path, output)
            .with_context(|| format!("Error writing {}", output_path.display()))?;
        info!("wrote {}", output_path.display());
    } else {
        print!("{}", output);
        if !output.is_empty() && !output.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
