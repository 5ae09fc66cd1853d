//! Render command - Bind a template to JSON data and print the result

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;
use sinopia_armature::ParseError;
use sinopia_tempera::{Object, Value};

use super::{read_or_exit, runtime_from};
use crate::config::SinopiaConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    #[default]
    Html,
    Json,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Template markup file
    pub template: PathBuf,

    /// JSON file with the data object (defaults to `{}`)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = RenderFormat::Html)]
    pub format: RenderFormat,
}

#[derive(Serialize)]
struct RenderOutput<'a> {
    html: String,
    ticks: usize,
    pending: usize,
    errors: &'a [ParseError],
}

pub fn run(args: RenderArgs, config: &SinopiaConfig) {
    let markup = read_or_exit(&args.template, "template");
    let data = match &args.data {
        Some(path) => parse_data(&read_or_exit(path, "data")),
        None => Ok(Object::new()),
    };
    let data = match data {
        Ok(data) => data,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };

    let runtime = runtime_from(config);
    let template = runtime.template(&markup);
    let view = runtime.render(&template, &data);
    let ticks = runtime.run_until_idle(config.max_ticks);
    tracing::debug!(ticks, template = template.id(), "render settled");

    match args.format {
        RenderFormat::Html => println!("{}", view.html()),
        RenderFormat::Json => {
            let output = RenderOutput {
                html: view.html(),
                ticks,
                pending: runtime.scheduler().pending(),
                errors: template.errors(),
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(error) => {
                    eprintln!("Error serializing output: {}", error);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Parse the data file. The top level must be an object.
fn parse_data(content: &str) -> Result<Object, String> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|error| format!("invalid data JSON: {}", error))?;
    match Value::from_json(&json) {
        Value::Object(object) => Ok(object),
        other => Err(format!("data must be a JSON object, found {}", other.type_name())),
    }
}
