use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use lifegrid::codec;
use lifegrid::config::ServerConfig;
use lifegrid::country::{find_country, COUNTRIES};
use lifegrid::runtime::{Engine, PREVIEW_SIZE};
use lifegrid::server::{AppState, Server};
use lifegrid::settings::{parse_settings_json, Settings};
use lifegrid::theme::theme_catalog;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lifegrid")]
#[command(about = "Render week-of-life calendar wallpapers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a full-size wallpaper as PNG
    Render {
        #[command(flatten)]
        input: SettingsInput,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Render a scaled preview with phone chrome as PNG
    Preview {
        #[command(flatten)]
        input: SettingsInput,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = PREVIEW_SIZE.0)]
        width: u32,
        #[arg(long, default_value_t = PREVIEW_SIZE.1)]
        height: u32,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the token for a settings JSON document
    Token {
        /// Settings JSON file, or '-' for stdin
        #[arg(default_value = "-")]
        settings: String,
        /// Replace the life expectancy with a country preset (e.g. JP)
        #[arg(long)]
        country: Option<String>,
    },
    /// Print the settings a token carries
    Decode { token: String },
    /// List known device profiles
    Devices {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// List preset themes
    Themes,
    /// List life expectancy presets by country
    Countries,
    /// Run the HTTP API
    Serve {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bind: Option<String>,
        /// Worker threads (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Where the settings come from: a token or a settings JSON document
#[derive(Args, Debug)]
struct SettingsInput {
    #[arg(short, long, conflicts_with = "settings")]
    token: Option<String>,
    /// Settings JSON file, or '-' for stdin
    #[arg(short, long)]
    settings: Option<String>,
    /// Reference date (YYYY-MM-DD) instead of the current time
    #[arg(long)]
    now: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Device table CSV replacing the built-in one
    #[arg(long)]
    devices: Option<PathBuf>,
    #[arg(long)]
    fallback_device: Option<String>,
    #[arg(long)]
    gap_ratio: Option<f64>,
}

impl EngineArgs {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(path) = self.devices {
            config.devices_csv = Some(path);
        }
        if let Some(id) = self.fallback_device {
            config.fallback_device = id;
        }
        if let Some(gap) = self.gap_ratio {
            config.layout.gap_ratio = gap;
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render { input, output, engine } => {
            let engine = build_engine(config_with(engine)?)?;
            let (settings, now) = input.resolve()?;
            let png = engine
                .render_png(&settings, now)
                .context("Failed to render wallpaper")?;
            write_output(output.as_deref(), &png)
        }
        Command::Preview { input, output, width, height, engine } => {
            let engine = build_engine(config_with(engine)?)?;
            let (settings, now) = input.resolve()?;
            let png = engine
                .render_preview(&settings, width, height, now)
                .and_then(|surface| surface.to_png())
                .context("Failed to render preview")?;
            write_output(output.as_deref(), &png)
        }
        Command::Token { settings, country } => {
            let mut settings = read_settings(&settings)?;
            if let Some(code) = country {
                let preset = find_country(&code)
                    .with_context(|| format!("Unknown country code '{}'", code))?;
                settings = settings.with_country(preset);
            }
            println!("{}", codec::encode(&settings));
            Ok(())
        }
        Command::Decode { token } => {
            let settings = codec::decode(token.trim()).context("Invalid token")?;
            println!("{}", serde_json::to_string_pretty(&settings.to_wire())?);
            Ok(())
        }
        Command::Devices { engine } => {
            let config = config_with(engine)?;
            let devices = config.load_devices().context("Failed to load device table")?;
            let listing = serde_json::json!({
                "fallback": devices.fallback().id,
                "devices": devices.iter().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
        Command::Themes => {
            println!("{}", serde_json::to_string_pretty(&theme_catalog())?);
            Ok(())
        }
        Command::Countries => {
            println!("{}", serde_json::to_string_pretty(&COUNTRIES)?);
            Ok(())
        }
        Command::Serve { config, bind, workers, engine } => {
            let mut config = match config {
                Some(path) => ServerConfig::from_json_file(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            engine.apply(&mut config);
            config.validate()?;

            let workers = config.worker_count();
            let state = AppState {
                download_name: config.download_name.clone(),
                engine: build_engine(config.clone())?,
            };
            Server::bind(&config.bind, state)?.run(workers)
        }
    }
}

fn config_with(engine: EngineArgs) -> Result<ServerConfig> {
    let mut config = ServerConfig::default();
    engine.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn build_engine(config: ServerConfig) -> Result<Engine> {
    let devices = config.load_devices().context("Failed to load device table")?;
    log::info!(
        "Loaded {} device profiles (fallback '{}')",
        devices.len(),
        devices.fallback().id
    );
    Ok(Engine::new(devices, config.layout))
}

impl SettingsInput {
    fn resolve(self) -> Result<(Settings, DateTime<Utc>)> {
        let settings = match (self.token, self.settings) {
            (Some(token), _) => codec::decode(token.trim()).context("Invalid token")?,
            (None, Some(source)) => read_settings(&source)?,
            (None, None) => anyhow::bail!("Provide either --token or --settings"),
        };
        let now = match self.now {
            Some(date) => date.and_hms_opt(0, 0, 0).map(|t| t.and_utc()).unwrap_or_else(Utc::now),
            None => Utc::now(),
        };
        Ok((settings, now))
    }
}

fn read_settings(source: &str) -> Result<Settings> {
    let text = if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read settings from stdin")?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read settings file {}", source))?
    };
    parse_settings_json(&text).context("Invalid settings")
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(bytes)
                .context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}
