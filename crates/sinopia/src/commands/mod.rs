//! CLI subcommands.

pub mod inspect;
pub mod render;

use std::path::Path;
use std::rc::Rc;

use sinopia_atelier::Runtime;

use crate::config::SinopiaConfig;

/// Read a file or exit with a message.
pub(crate) fn read_or_exit(path: &Path, what: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("Error reading {} {}: {}", what, path.display(), error);
            std::process::exit(1);
        }
    }
}

/// A runtime configured from `config`, falling back to the standard
/// directive set when the configured one is invalid.
pub(crate) fn runtime_from(config: &SinopiaConfig) -> Rc<Runtime> {
    let directives = config.directive_set().unwrap_or_else(|error| {
        tracing::warn!(%error, "using the standard directive set");
        Default::default()
    });
    Runtime::with_options(directives, config.parser_options())
}
