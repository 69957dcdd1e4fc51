//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::Cli;

/// Report a fatal error and exit with status 1.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().map(ToString::to_string).collect();
        println!(
            "{}",
            serde_json::json!({ "succeeded": false, "errors": causes })
        );
    } else {
        eprintln!("{}", output::format_error(err));
    }
    std::process::exit(1)
}
