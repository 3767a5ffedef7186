//! Calculator Function Calling Example
//!
//! Declares two arithmetic functions, lets the model call them and prints the
//! final answer along with every call the loop made.
//!
//! Usage:
//! ```bash
//! GEMINI_API_KEY=... cargo run --example calculator -- "What is (17 + 25) * 3?"
//!
//! # Run the calls of a batch concurrently, at most two at a time
//! cargo run --example calculator -- --parallel --max-concurrency 2 "..."
//! ```

use clap::Parser;
use gemini_fc_ox::prelude::*;
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "calculator")]
#[command(about = "Answers arithmetic questions with Gemini function calling")]
struct Cli {
    /// The question to ask.
    prompt: String,
    #[arg(long, default_value = "gemini-2.5-flash")]
    model: String,
    #[arg(long, default_value_t = 10)]
    max_calls: usize,
    #[arg(long)]
    parallel: bool,
    #[arg(long)]
    max_concurrency: Option<usize>,
}

fn number(args: &Args, key: &str) -> anyhow::Result<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow::anyhow!("`{key}` must be a number"))
}

fn binary_operation(name: &str, description: &str) -> FunctionMetadata {
    FunctionMetadata::new(
        name,
        description,
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        }),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let gemini = Gemini::load_from_env()?;

    let registry = Registry::new()
        .with(
            "add",
            Handler::sync(|args: &Args| Ok(number(args, "a")? + number(args, "b")?)),
        )
        .with(
            "multiply",
            Handler::sync(|args: &Args| Ok(number(args, "a")? * number(args, "b")?)),
        );

    let config = LoopConfig::builder()
        .max_calls(cli.max_calls)
        .parallel_execution(cli.parallel)
        .maybe_max_concurrency(cli.max_concurrency)
        .build();

    let request = gemini
        .generate_content()
        .model(cli.model)
        .content(cli.prompt)
        .tool(vec![
            binary_operation("add", "Adds two numbers"),
            binary_operation("multiply", "Multiplies two numbers"),
        ])
        .build();

    let outcome = request.run_with_functions(&registry, &config).await?;

    for call in &outcome.call_history {
        println!("→ {}({})", call.name, Value::Object(call.args.clone()));
    }
    println!("stopped: {} after {} call(s)", outcome.stop_reason, outcome.call_count);

    let response = outcome.into_response()?;
    println!("{}", response.text().unwrap_or_default());
    Ok(())
}
