//! Textblk Translator CLI - translate text fragments, one per line.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use textblk_translator_core::{AppConfig, Translator, create_translator, translator::registry};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "textblk-translate")]
#[command(author, version, about = "Translate text fragments in batches", long_about = None)]
struct Args {
    /// Input file with one fragment per line (default: stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language display name (e.g. "日本語", "Auto")
    #[arg(short = 's', long)]
    source: Option<String>,

    /// Target language display name (e.g. "English", "繁體中文")
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Registered backend name
    #[arg(short, long)]
    backend: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Fragments per request (0 = everything in one request)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seconds to wait between requests
    #[arg(long)]
    delay: Option<f64>,

    /// Fall back to the first supported languages instead of failing
    #[arg(long)]
    allow_fallback: bool,

    /// List the languages the backend supports and exit
    #[arg(long)]
    list_languages: bool,

    /// List registered backends and exit
    #[arg(long)]
    list_backends: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Override config with CLI arguments
    fn apply(&self, config: &mut AppConfig) {
        if let Some(ref source) = self.source {
            config.lang_source.clone_from(source);
        }
        if let Some(ref target) = self.target {
            config.lang_target.clone_from(target);
        }
        if let Some(ref backend) = self.backend {
            config.backend.clone_from(backend);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.allow_fallback {
            config.raise_unsupported_lang = false;
        }
        for (key, value) in [
            ("api_base", &self.api_base),
            ("api_key", &self.api_key),
            ("model", &self.model),
        ] {
            if let Some(value) = value {
                config.params.insert(key, value.as_str());
            }
        }
        if let Some(delay) = self.delay {
            config.params.insert("delay", delay);
        }
    }
}

fn read_fragments(input: Option<&PathBuf>) -> Result<Vec<String>> {
    let lines: Vec<String> = if let Some(path) = input {
        std::fs::read_to_string(path)
            .context(format!("Failed to read input: {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect()
    } else {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<_>>()
            .context("Failed to read stdin")?
    };
    Ok(lines)
}

/// Wait between batches; negative delays mean no wait
fn request_delay(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).context(format!("Invalid delay: {secs}s"))
}

async fn translate_all(translator: &Translator, fragments: Vec<String>, batch_size: usize) -> Result<Vec<String>> {
    let chunk = if batch_size == 0 { fragments.len().max(1) } else { batch_size };
    let delay = request_delay(translator.delay())?;

    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(fragments.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut translated = Vec::with_capacity(fragments.len());
    for (i, batch) in fragments.chunks(chunk).enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = translator
            .translate_batch(batch.to_vec())
            .await
            .context(format!("Failed to translate batch {}", i + 1))?;
        translated.extend(result);
        pb.inc(batch.len() as u64);
    }

    pb.finish_and_clear();
    Ok(translated)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    args.apply(&mut config);

    let stdout = std::io::stdout();

    if args.list_backends {
        let mut out = stdout.lock();
        for name in registry::builtin().names() {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let translator = create_translator(&config)
        .context(format!("Failed to initialize translator '{}'", config.backend))?;
    info!(
        "Using {} ({} -> {})",
        translator.name(),
        translator.lang_source(),
        translator.lang_target()
    );

    if args.list_languages {
        let mut out = stdout.lock();
        for lang in translator.supported_languages() {
            writeln!(out, "{lang}")?;
        }
        return Ok(());
    }

    let fragments = read_fragments(args.input.as_ref())?;
    info!("Translating {} fragments", fragments.len());

    let translated = translate_all(&translator, fragments, config.batch_size).await?;
    let text = translated.join("\n");

    if let Some(ref path) = args.output {
        std::fs::write(path, text + "\n")
            .context(format!("Failed to write output: {}", path.display()))?;
        info!("Translations saved to {}", path.display());
    } else {
        let mut out = stdout.lock();
        writeln!(out, "{text}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_delay_accepts_fractional_seconds() {
        assert_eq!(request_delay(0.5).unwrap(), Duration::from_millis(500));
        assert!(request_delay(-3.0).unwrap().is_zero());
    }

    #[test]
    fn test_request_delay_rejects_huge_values() {
        let err = request_delay(1e20).unwrap_err();
        assert!(err.to_string().contains("Invalid delay"));
    }
}
