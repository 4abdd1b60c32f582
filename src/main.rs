use anyhow::{Context, Result, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use voxline::audio::capture::list_devices;
use voxline::cli::{Cli, Commands};
use voxline::{
    Config, ConnectionStatus, ControllerEvent, CpalEngine, LiveConfig, SessionController, Speaker,
    WsTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => list_audio_devices(),
        None => run_session(cli).await,
    }
}

fn list_audio_devices() -> Result<()> {
    let devices = list_devices().context("Failed to list audio devices")?;
    if devices.is_empty() {
        println!("No input devices found");
        return Ok(());
    }
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}

async fn run_session(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path);

    let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
        bail!("GEMINI_API_KEY is not set");
    };

    let mut live = LiveConfig::from_config(&config, api_key);
    if let Some(model) = cli.model {
        live = live.with_model(model);
    }
    if let Some(voice) = cli.voice {
        live = live.with_voice(voice);
    }

    let device = cli.device.or(config.audio.input_device);
    let (event_tx, event_rx) = crossbeam_channel::unbounded();

    let controller = SessionController::new(
        live,
        Box::new(WsTransport::new()),
        Box::new(CpalEngine::new(device)),
    )
    .with_events(event_tx);
    controller.set_muted(cli.muted);

    let quiet = cli.quiet;
    let render_thread = std::thread::spawn(move || {
        for event in event_rx {
            render_event(&event, quiet);
        }
    });

    controller.connect().await?;

    // Run until Ctrl+C or the session dies on its own.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {
                match controller.status() {
                    ConnectionStatus::Disconnected => break,
                    ConnectionStatus::Error => bail!("session ended with an error, reconnect to continue"),
                    _ => {}
                }
            }
        }
    }

    controller.disconnect().await;
    drop(controller);
    let _ = render_thread.join();
    Ok(())
}

fn render_event(event: &ControllerEvent, quiet: bool) {
    match event {
        ControllerEvent::Status(status) => {
            let label = match status {
                ConnectionStatus::Disconnected => "disconnected".dimmed().to_string(),
                ConnectionStatus::Connecting => "connecting...".yellow().to_string(),
                ConnectionStatus::Connected => "connected, speak now".green().to_string(),
                ConnectionStatus::Error => "error".red().to_string(),
            };
            eprintln!("voxline: {}", label);
        }
        ControllerEvent::Turn(entries) => {
            if quiet {
                return;
            }
            for entry in entries {
                match entry.speaker {
                    Speaker::User => println!("{} {}", "you:".cyan().bold(), entry.text),
                    Speaker::Model => println!("{} {}", "model:".magenta().bold(), entry.text),
                }
            }
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxline")
        .join("config.toml")
}
