use std::path::Path;

use scenario_eval::{World, WorldConfig};

use crate::{report_error, OutputFormat};

fn load_world(path: Option<&Path>) -> Result<World, scenario_eval::EvalError> {
    let config = match path {
        Some(p) => WorldConfig::load(p)?,
        None => WorldConfig::default(),
    };
    config.into_world()
}

pub(crate) fn cmd_eval(src: &str, world_path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let expr = match scenario_core::parse_command(src) {
        Ok(e) => e,
        Err(e) => report_error(&format!("error: {}", e), output, quiet),
    };

    let mut world = match load_world(world_path) {
        Ok(w) => w,
        Err(e) => report_error(&format!("error: {}", e), output, quiet),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => report_error(&format!("error: cannot start runtime: {e}"), output, quiet),
    };

    tracing::debug!(expression = %expr, network = world.network(), "evaluating");
    let value = match rt.block_on(scenario_eval::evaluate(&mut world, &expr)) {
        Ok(v) => v,
        Err(e) => report_error(&format!("error: {}", e), output, quiet),
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "expression": expr.to_string(),
                "value": value.to_json(),
            });
            let pretty = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());
            println!("{}", pretty);
        }
    }
}
