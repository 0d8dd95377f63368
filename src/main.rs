use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::speech::{SpeechSynthesizer, SynthesisRoute};
use parley::{CallConfig, config};

/// Parley - conversation turn engine for AI-driven phone calls
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rehearse a call in the terminal (typed lines act as recognition)
    Simulate {
        /// Phone target; a placeholder is fine for a simulation
        #[arg(short, long, env = "PARLEY_PHONE", default_value = "+15550100")]
        phone: String,

        /// Locale pack to use (e.g. "en", "ru")
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Synthesize a phrase through the resolved voice route into a file
    Say {
        /// Text to synthesize
        #[arg(default_value = "Hello! This is a synthesis check.")]
        text: String,

        /// Output path; derived from the provider when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Simulate { phone, locale } => simulate(phone, locale).await,
        Command::Say { text, output } => say(&text, output).await,
        Command::ShowConfig => show_config(),
    }
}

/// Run a simulated call in the terminal
async fn simulate(phone: String, locale: Option<String>) -> anyhow::Result<()> {
    let mut config = CallConfig::load(Some(phone))?;
    if let Some(locale) = locale {
        config.locale = locale;
    }

    tracing::info!(
        locale = %config.locale,
        max_turns = config.max_turns,
        "starting simulated call"
    );

    parley::simulate::run_simulation(config).await?;
    Ok(())
}

/// Synthesize a phrase and write the audio to disk
async fn say(text: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = CallConfig::resolve(None);
    let route = SynthesisRoute::resolve(&config.voice);

    let output = output.unwrap_or_else(|| {
        let extension = match route.provider() {
            "elevenlabs" => "mp3",
            _ => "ogg",
        };
        PathBuf::from(format!("parley-say.{extension}"))
    });

    println!("Synthesizing via {}: \"{text}\"", route.provider());

    let synthesizer = SpeechSynthesizer::new(route)?;
    let audio = synthesizer.synthesize(text).await?;

    std::fs::write(&output, &audio)?;
    println!("Wrote {} bytes to {}", audio.len(), output.display());

    Ok(())
}

/// Print the resolved configuration with secrets masked
fn show_config() -> anyhow::Result<()> {
    let config = CallConfig::resolve(None);

    println!("config file:        {}", config::config_file_path().display());
    println!("phone:              {}", mask_empty(&config.phone));
    println!("caller id:          {}", mask_empty(config.caller_id.as_deref().unwrap_or_default()));
    println!("locale:             {}", config.locale);
    println!("llm endpoint:       {}", config.llm.endpoint);
    println!("llm model:          {}", config.llm.model);
    println!("llm api key:        {}", mask_secret(config.llm.api_key.as_deref()));
    println!("elevenlabs key:     {}", mask_secret(config.voice.elevenlabs_api_key.as_deref()));
    println!("speechkit key:      {}", mask_secret(config.voice.speechkit_api_key.as_deref()));
    println!("synthesis route:    {}", SynthesisRoute::resolve(&config.voice).provider());
    println!("recognition:        {} ({})", config.recognition.locale, config.recognition.model);
    println!("debounce:           {:?}", config.timing.debounce);
    println!("no-input window:    {:?}", config.timing.no_input);
    println!("max turns:          {}", config.max_turns);
    println!("max silence:        {}", config.max_silence_strikes);

    match config.validate() {
        Ok(()) => println!("status:             ready"),
        Err(e) => println!("status:             not ready ({e})"),
    }

    Ok(())
}

/// Render an optional secret as set/unset
fn mask_secret(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "set",
        _ => "unset",
    }
}

/// Render a possibly-empty value
fn mask_empty(value: &str) -> &str {
    if value.trim().is_empty() { "(unset)" } else { value }
}
