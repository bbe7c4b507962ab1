//! Assay CLI — record fusion and quality grading pipeline.
//!
//! Usage:
//!   assay fuse <FILES>... [--tag semantic] [--frequency 415.3]
//!   assay grade <FILE> [--standard A-minus] [--minimum 0.88]
//!   assay process <FILE>
//!   assay run <FILES>... [--tag semantic] [--standard A-minus]
//!   assay stages

use assay::{
    AssayEngine, AttrValue, Attrs, CompositeRecord, InputRecord, InputTag, SessionConfig, Stage,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "assay",
    version,
    about = "Record fusion and weighted quality grading engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse input record files into one composite record
    Fuse {
        /// JSON files, one input record's content each
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Tag applied to every input (semantic, contextual, historical, vector)
        #[arg(long, default_value = "semantic")]
        tag: String,
        /// Base resonance frequency
        #[arg(long)]
        frequency: Option<f64>,
    },
    /// Grade a composite record against a quality standard
    Grade {
        /// JSON file holding a composite record or a plain attribute map
        file: PathBuf,
        /// Quality standard name
        #[arg(long, default_value = "A-minus")]
        standard: String,
        /// Minimum score for the default standard
        #[arg(long)]
        minimum: Option<f64>,
    },
    /// Apply the narrow/boost/stabilize chain to a record payload
    Process {
        /// JSON file holding the record payload
        file: PathBuf,
    },
    /// Run the full fuse → grade → process pipeline
    Run {
        /// JSON files, one input record's content each
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Tag applied to every input
        #[arg(long, default_value = "semantic")]
        tag: String,
        /// Quality standard name
        #[arg(long, default_value = "A-minus")]
        standard: String,
        /// Base resonance frequency
        #[arg(long)]
        frequency: Option<f64>,
        /// Minimum score for the default standard
        #[arg(long)]
        minimum: Option<f64>,
    },
    /// List the grading stages with their bases, caps, and weights
    Stages,
}

fn load_json(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e))
}

fn load_inputs(files: &[PathBuf], tag: InputTag) -> Result<Vec<InputRecord>, String> {
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        let value = load_json(file)?;
        inputs.push(InputRecord::new(AttrValue::from_json(value), tag));
    }
    Ok(inputs)
}

/// Accepts either a serialized composite record or a plain attribute map
fn load_composite(path: &Path) -> Result<CompositeRecord, String> {
    let value = load_json(path)?;
    if value.get("fusion_id").is_some() && value.get("attrs").is_some() {
        return serde_json::from_value(value)
            .map_err(|e| format!("invalid composite record in '{}': {}", path.display(), e));
    }
    match AttrValue::from_json(value) {
        AttrValue::Map(attrs) => Ok(CompositeRecord::new("external", attrs)),
        _ => Err(format!(
            "'{}' must contain a JSON object",
            path.display()
        )),
    }
}

fn load_attrs(path: &Path) -> Result<Attrs, String> {
    match AttrValue::from_json(load_json(path)?) {
        AttrValue::Map(attrs) => Ok(attrs),
        _ => Err(format!("'{}' must contain a JSON object", path.display())),
    }
}

fn parse_tag(tag: &str) -> Result<InputTag, String> {
    InputTag::from_name(tag).ok_or_else(|| {
        format!(
            "unknown tag '{}' (expected semantic, contextual, historical, or vector)",
            tag
        )
    })
}

fn print_attrs(attrs: &Attrs) {
    let value = AttrValue::Map(attrs.clone()).to_json();
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: cannot serialize output: {}", e),
    }
}

fn session_config(frequency: Option<f64>, minimum: Option<f64>) -> SessionConfig {
    let mut config = SessionConfig::new();
    if let Some(freq) = frequency {
        config = config.with_base_frequency(freq);
    }
    if let Some(min) = minimum {
        config = config.with_minimum(min);
    }
    config
}

fn cmd_fuse(files: &[PathBuf], tag: &str, frequency: Option<f64>) -> i32 {
    let inputs = match parse_tag(tag).and_then(|t| load_inputs(files, t)) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let engine = AssayEngine::new();
    let id = engine.create_session(session_config(frequency, None));
    match engine.fuse(&id, &inputs) {
        Ok(composite) => {
            print_attrs(&composite.attrs);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_grade(file: &Path, standard: &str, minimum: Option<f64>) -> i32 {
    let composite = match load_composite(file) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let engine = AssayEngine::new();
    let id = engine.create_session(session_config(None, minimum));
    match engine.grade(&id, &composite, Some(standard)) {
        Ok(graded) => {
            match serde_json::to_string_pretty(&graded) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: cannot serialize output: {}", e);
                    return 1;
                }
            }
            if graded.passes {
                0
            } else {
                2
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_process(file: &Path) -> i32 {
    let attrs = match load_attrs(file) {
        Ok(attrs) => attrs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let engine = AssayEngine::new();
    let id = engine.create_session(SessionConfig::default());
    match engine.process(&id, &attrs) {
        Ok(processed) => {
            print_attrs(&processed);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_run(
    files: &[PathBuf],
    tag: &str,
    standard: &str,
    frequency: Option<f64>,
    minimum: Option<f64>,
) -> i32 {
    let inputs = match parse_tag(tag).and_then(|t| load_inputs(files, t)) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let engine = AssayEngine::new();
    let id = engine.create_session(session_config(frequency, minimum));
    match engine.run(&id, &inputs, Some(standard)) {
        Ok(out) => {
            print_attrs(&out);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stages() -> i32 {
    println!(
        "{:<10}  {:>5}  {:>5}  {:>6}  DESCRIPTION",
        "STAGE", "BASE", "CAP", "WEIGHT"
    );
    println!("{}", "-".repeat(76));
    for stage in Stage::ALL {
        println!(
            "{:<10}  {:>5.2}  {:>5.2}  {:>6.1}  {}",
            stage.name(),
            stage.base(),
            stage.cap(),
            stage.weight(),
            stage.description()
        );
    }
    0
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match &cli.command {
        Commands::Fuse {
            files,
            tag,
            frequency,
        } => cmd_fuse(files, tag, *frequency),
        Commands::Grade {
            file,
            standard,
            minimum,
        } => cmd_grade(file, standard, *minimum),
        Commands::Process { file } => cmd_process(file),
        Commands::Run {
            files,
            tag,
            standard,
            frequency,
            minimum,
        } => cmd_run(files, tag, standard, *frequency, *minimum),
        Commands::Stages => cmd_stages(),
    };

    std::process::exit(code);
}
