use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use ragdoc_core::config::Config;
use ragdoc_embed::shared_embedder;
use ragdoc_llm::{ModelFactory, Provider, ProviderRegistry};
use ragdoc_pipeline::RetrievalPipeline;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: ragdoc <prompt|ask> <file> \"<question>\" [--top-k N]";

struct Args { cmd: String, file: PathBuf, question: String, top_k: Option<usize> }

fn parse_args() -> Args {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut positional = Vec::new(); let mut top_k = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--top-k" | "-k" => { match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) { Some(k) => { top_k = Some(k); i += 1; } None => { eprintln!("Error: --top-k requires a number"); std::process::exit(1); } } }
        "--help" | "-h" => { println!("{}", USAGE); std::process::exit(0); }
        other => positional.push(other.to_string()) } i += 1; }
    if positional.len() != 3 { eprintln!("{}", USAGE); std::process::exit(1); }
    let question = positional.pop().unwrap_or_default(); let file = PathBuf::from(positional.pop().unwrap_or_default());
    Args { cmd: positional.pop().unwrap_or_default(), file, question, top_k }
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings();
    let args = parse_args();
    if args.cmd != "prompt" && args.cmd != "ask" { eprintln!("Unknown command: {}\n{}", args.cmd, USAGE); std::process::exit(1); }
    let top_k = args.top_k.unwrap_or(settings.rag.top_k);

    let pb = spinner("Loading embedding model")?;
    let embedder = shared_embedder(&settings.embedding)?;
    let pipeline = RetrievalPipeline::from_settings(embedder, &settings.rag)?;
    pb.set_message(format!("Preparing {}", args.file.display()));
    let summary = pipeline.prepare(&args.file).with_context(|| format!("failed to prepare {}", args.file.display()));
    pb.finish_and_clear();
    let summary = summary?;
    tracing::info!(passages = summary.passages, dimension = summary.dimension, "document prepared");

    let prompt = pipeline.build_grounded_prompt(&args.question, top_k)?;
    if args.cmd == "prompt" { println!("{}", prompt); return Ok(()); }

    let rag = &settings.rag;
    let provider: Provider = rag.answer_provider.parse()?;
    let registry = ProviderRegistry::new(settings.providers.clone())?;
    let model = registry.model(provider, &rag.answer_model, Some(rag.answer_temperature))?;
    let pb = spinner(&format!("Asking {} ({})", provider, rag.answer_model))?;
    let answer = tokio::runtime::Runtime::new()?.block_on(async { model.answer(&prompt).await });
    pb.finish_and_clear();
    println!("{}", answer?);
    Ok(())
}
