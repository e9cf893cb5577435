//! touch_continuum — command-line entry point.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use touch_continuum::app::{run, AppConfig};
use touch_continuum::config::{ContinuumConfig, EngineSettings, CONFIG_FILE};
use touch_continuum::output::list_output_ports;
use touch_continuum::script::TouchScript;
use touch_continuum::touch::{spawn_touch_source, ScriptTouchSource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Continuous-pitch touch keyboard → MIDI")]
struct Cli {
    /// Settings file (JSON).  Missing file = defaults.
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Touch script to play.  Reads stdin when omitted or `-`.
    #[arg(short, long)]
    script: Option<PathBuf>,
    /// MIDI output port (name or part of it); overrides `MIDI.Device`.
    #[arg(short, long)]
    port: Option<String>,
    /// Print the available MIDI output ports and exit.
    #[arg(long)]
    list_ports: bool,
    /// Also record the performance to this Standard MIDI File.
    #[arg(long)]
    record: Option<PathBuf>,
    /// Write the effective settings to `--config` and exit.
    #[arg(long)]
    write_config: bool,
    /// Debug-level logging (unless RUST_LOG is set).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_ports {
        let ports = list_output_ports()?;
        if ports.is_empty() {
            println!("no MIDI output ports");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("{i:>3}  {name}");
        }
        return Ok(());
    }

    let config = ContinuumConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.write_config {
        config.save_to(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    let settings = EngineSettings::try_from(&config).context("invalid configuration")?;
    let script = load_script(cli.script.as_ref())?;

    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║        Touch Continuum — continuous-pitch MIDI keyboard      ║");
    eprintln!("╚══════════════════════════════════════════════════════════════╝");
    eprintln!(
        "  {} keys · bend ±{} · transpose {:+} · channel {} · y-axis {}{}",
        settings.geometry.key_count(),
        settings.midi.pitchbend_range,
        settings.midi.transpose,
        settings.midi.channel,
        settings.midi.y_axis.name(),
        if settings.rounding.pitch_lock { " · pitch lock" } else { "" },
    );
    eprintln!();

    let events = spawn_touch_source(ScriptTouchSource::new(script));
    let app = AppConfig {
        settings,
        port:   cli.port.or(config.midi.device),
        record: cli.record,
        ..AppConfig::default()
    };
    run(app, events)?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "touch_continuum=debug" } else { "touch_continuum=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn load_script(path: Option<&PathBuf>) -> Result<TouchScript> {
    match path {
        Some(p) if p.as_os_str() != "-" => Ok(TouchScript::from_file(p)?),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read touch script from stdin")?;
            Ok(TouchScript::parse(&text)?)
        }
    }
}
