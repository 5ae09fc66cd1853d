//! Inspect command - Print the compiled binding map of a template

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;
use sinopia_armature::ParseError;
use sinopia_atelier::{BindingDescription, Template};

use super::{read_or_exit, runtime_from};
use crate::config::SinopiaConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Template markup file
    pub template: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = InspectFormat::Text)]
    pub format: InspectFormat,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    content: String,
    bindings: Vec<BindingDescription>,
    errors: &'a [ParseError],
}

pub fn run(args: InspectArgs, config: &SinopiaConfig) {
    let markup = read_or_exit(&args.template, "template");
    let runtime = runtime_from(config);
    let template = runtime.template(&markup);

    match args.format {
        InspectFormat::Text => print!("{}", describe_text(&template)),
        InspectFormat::Json => {
            let output = InspectOutput {
                content: template.html(),
                bindings: template.bindings().describe(),
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

fn describe_text(template: &Template) -> String {
    let bindings = template.bindings().describe();
    let width = bindings
        .iter()
        .map(|binding| binding.path.to_string().len())
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{} binding(s), {} parse error(s)\n",
        bindings.len(),
        template.errors().len()
    );
    for binding in &bindings {
        let path = binding.path.to_string();
        for directive in &binding.directives {
            out.push_str(&format!("  {:<width$}  {}\n", path, directive, width = width));
        }
    }
    for error in template.errors() {
        out.push_str(&format!("  error: {}\n", error));
    }
    out
}
