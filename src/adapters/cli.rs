use clap::Parser;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::models::{Assumptions, Stream};
use crate::speciation::solver::EquilibriumOutcome;

#[derive(Parser, Debug)]
#[command(author, version, about = "pH and alkalinity of a digester stream from its acid-base species", long_about = None)]
pub struct Args {
    #[arg(long)]
    json: bool,
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with a stream and optional assumptions; '-' reads from stdin"
    )]
    input: Option<String>,
    #[arg(
        long,
        value_name = "JSON",
        help = "Inline JSON for the stream (overrides --input)"
    )]
    stream_json: Option<String>,
    #[arg(
        long,
        value_name = "JSON",
        help = "Inline JSON for assumptions (optional, supplements --stream-json)"
    )]
    assumptions_json: Option<String>,
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// A stream to speciate, optionally with its own solver assumptions.
///
/// This is the shape of `--input` documents; `--stream-json` and
/// `--assumptions-json` fill the same two parts separately.
#[derive(serde::Deserialize)]
struct StreamDocument {
    stream: Stream,
    #[serde(default)]
    assumptions: Option<Assumptions>,
}

fn from_json<T: DeserializeOwned>(text: &str, origin: &'static str) -> Result<T, AppError> {
    serde_json::from_str(text).map_err(|source| AppError::InvalidJson { origin, source })
}

fn read_document(path: &str) -> Result<StreamDocument, AppError> {
    let text = if path == "-" {
        let mut s = String::new();
        io::stdin()
            .read_to_string(&mut s)
            .map(|_| s)
            .map_err(|source| AppError::ReadInput { path: "stdin".into(), source })?
    } else {
        fs::read_to_string(path)
            .map_err(|source| AppError::ReadInput { path: path.to_owned(), source })?
    };
    from_json(&text, "input document")
}

/// Stream and assumptions from the command line. Inline JSON wins over `--input`.
pub fn parse_inputs(args: &Args) -> Result<(Stream, Assumptions), AppError> {
    let doc = match (&args.stream_json, &args.input) {
        (Some(stream), _) => StreamDocument {
            stream: from_json(stream, "--stream-json")?,
            assumptions: args
                .assumptions_json
                .as_deref()
                .map(|a| from_json(a, "--assumptions-json"))
                .transpose()?,
        },
        (None, Some(path)) => read_document(path)?,
        (None, None) => return Err(AppError::MissingInputData),
    };
    Ok((doc.stream, doc.assumptions.unwrap_or_default()))
}

#[derive(Serialize, Debug, Clone)]
pub struct CalculationOutput {
    pub id: String,
    pub ph: f64,
    pub alkalinity_meq_l: f64,
    pub s_ic_mg_l: Option<f64>,
    pub tss_mg_l: f64,
    pub outcome: EquilibriumOutcome,
}

impl CalculationOutput {
    pub fn new(stream: &Stream, outcome: EquilibriumOutcome) -> Self {
        Self {
            id: stream.id.clone(),
            ph: stream.ph,
            alkalinity_meq_l: stream.alkalinity,
            s_ic_mg_l: stream.concentrations.s_ic,
            tss_mg_l: stream.total_suspended_solids(None),
            outcome,
        }
    }
}

pub fn print_output(out: &CalculationOutput, args: &Args) -> Result<(), AppError> {
    if args.json {
        let s = serde_json::to_string_pretty(&out)
            .map_err(|source| AppError::SerializeOutput { source })?;
        println!("{}", s);
    } else {
        println!("pH: {:.2}", out.ph);
        println!("Alkalinity: {:.2} meq/L", out.alkalinity_meq_l);
        if let Some(s_ic) = out.s_ic_mg_l {
            println!("S_IC: {:.2} mg/L", s_ic);
        }
        println!("TSS: {:.2} mg/L", out.tss_mg_l);
        if !out.outcome.is_solved() {
            println!("Note: {:?}", out.outcome);
        }
    }

    Ok(())
}
