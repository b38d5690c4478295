use scenario_eval::{core_value, EvalError, Registry};

use crate::{report_error, OutputFormat};

/// Walk `path` through nested namespaces and render the matching help.
fn render(path: &[String]) -> Result<String, EvalError> {
    let mut registry: &Registry = core_value::registry()?;
    let (last, namespaces) = match path.split_last() {
        Some(split) => split,
        None => return registry.help(),
    };

    for name in namespaces {
        let nested = registry
            .candidates(name)
            .find_map(|f| f.sub_registry())
            .ok_or_else(|| EvalError::UnknownCommand {
                namespace: registry.namespace().to_string(),
                name: name.to_string(),
            })?;
        registry = nested()?;
    }

    registry
        .help_for(last)?
        .ok_or_else(|| EvalError::UnknownCommand {
            namespace: registry.namespace().to_string(),
            name: last.to_string(),
        })
}

pub(crate) fn cmd_help(path: &[String], output: OutputFormat, quiet: bool) {
    let text = match render(path) {
        Ok(t) => t,
        Err(e) => report_error(&format!("error: {}", e), output, quiet),
    };
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => print!("{}", text),
        OutputFormat::Json => println!("{}", serde_json::json!({ "help": text })),
    }
}
