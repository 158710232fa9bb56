use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use voxlate::cli::{Cli, Commands};
use voxlate::config::{Backend, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        None => {
            let config = load_config(&cli)?;
            run_listen(config, None, None, cli.quiet).await?;
        }
        Some(Commands::Listen {
            ref device,
            phrase_timeout,
        }) => {
            let config = load_config(&cli)?;
            run_listen(config, device.clone(), phrase_timeout, cli.quiet).await?;
        }
        Some(Commands::Serve { ref bind }) => {
            let mut config = load_config(&cli)?;
            if let Some(bind) = bind {
                config.server.bind = bind.clone();
            }
            voxlate::app::run_serve(config, cli.quiet)
                .await
                .context("HTTP server failed")?;
        }
        Some(Commands::Translate { ref file }) => {
            let config = load_config(&cli)?;
            let output = voxlate::app::run_translate_file(&config, file)
                .await
                .with_context(|| format!("Failed to translate {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::History { count }) => {
            let config = load_config(&cli)?;
            let count = count.unwrap_or(config.history.recent_count);
            let records = voxlate::app::recent_history(&config, count).await;
            voxlate::output::render_history(&records);
        }
        Some(Commands::Languages) => {
            voxlate::output::render_languages();
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "voxlate", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// `-q` shows errors only; each `-v` raises the level one step from WARN.
/// `RUST_LOG` directives are applied on top.
fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults, then apply overrides.
///
/// Priority order (later wins):
/// 1. Built-in defaults
/// 2. Config file (--config, or ~/.config/voxlate/config.toml if present)
/// 3. Environment variables
/// 4. Global CLI flags (--target, --offline)
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(path) = cli.config.as_deref() {
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
            .with_context(|| format!("Failed to load {}", default_path.display()))?
    };

    let mut config = config.with_env_overrides()?;

    if let Some(target) = &cli.target {
        config.translation.target_language = target.clone();
    }
    if cli.offline {
        config.services.backend = Backend::Stub;
    }
    Ok(config)
}

#[cfg(feature = "cpal-audio")]
async fn run_listen(
    mut config: Config,
    device: Option<String>,
    phrase_timeout: Option<u64>,
    quiet: bool,
) -> Result<()> {
    if let Some(device) = device {
        config.audio.device = Some(device);
    }
    if let Some(secs) = phrase_timeout {
        config.audio.phrase_timeout_secs = secs;
    }
    voxlate::app::run_listen(config, quiet).await?;
    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
async fn run_listen(
    _config: Config,
    _device: Option<String>,
    _phrase_timeout: Option<u64>,
    _quiet: bool,
) -> Result<()> {
    anyhow::bail!("Microphone input is not available: voxlate was built without the cpal-audio feature")
}

#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    use owo_colors::OwoColorize;

    let devices = voxlate::audio::capture::list_devices()?;

    if devices.is_empty() {
        eprintln!("{}", "No audio input devices found".red());
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  {} {}", format!("[{idx}]").dimmed(), device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    anyhow::bail!("Device listing is not available: voxlate was built without the cpal-audio feature")
}
