mod console;

use std::{
    cell::RefCell,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc,
    thread,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};

use console::{ConsoleLine, Gesture};
use launchpad_emu::{
    config::DEFAULT_CLIENT_NAME,
    midi::{self, MidiCommandSource, MidiEventSink},
    CommandDispatcher, DeviceState, EmulatorConfig, Event,
};

const DEFAULT_CONFIG_FILE: &str = "launchpad-emu.yml";

/// Launchpad S emulator. Reads JSON commands on stdin, writes interactions as
/// JSON lines on stdout, and optionally speaks the device's MIDI dialect.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// YAML configuration file. Defaults to ./launchpad-emu.yml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reject unknown commands instead of ignoring them.
    #[arg(long)]
    strict: bool,
    /// Brightness level at start-up, 0-15.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    brightness: Option<u8>,
    /// Input port hint for commands sent by the host application.
    #[arg(long)]
    midi_in: Option<String>,
    /// Output port hint for reporting interactions.
    #[arg(long)]
    midi_out: Option<String>,
    /// Publish a virtual MIDI port pair with this name.
    #[arg(long = "virtual")]
    virtual_port: Option<String>,
}

#[derive(Debug)]
enum ControlMessage {
    Console(String),
    Midi(Vec<u8>),
    StdinClosed,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let dispatcher = config.dispatcher();

    let mut state = DeviceState::new();
    state.set_brightness(config.brightness_level()?);

    let (tx, rx) = mpsc::channel::<ControlMessage>();
    let (source, sink) = connect_midi(&config, &tx)?;
    let sink = Rc::new(RefCell::new(sink));

    let listener_sink = Rc::clone(&sink);
    state.set_listener(move |event: Event| {
        let line = CommandDispatcher::encode(event);
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
            warn!("failed to write event: {err}");
        }
        if let Some(sink) = listener_sink.borrow_mut().as_mut() {
            if let Err(err) = sink.send(event) {
                warn!("{err}");
            }
        }
    });

    spawn_stdin_reader(tx);
    info!(
        "emulator ready ({} mode)",
        if dispatcher.is_strict() { "strict" } else { "lenient" }
    );

    let mut last_render = state.snapshot();
    while let Ok(message) = rx.recv() {
        match message {
            ControlMessage::Midi(bytes) => {
                // Already logged by the dispatcher; the session keeps going.
                let _ = dispatcher.handle_midi(&mut state, &bytes);
            }
            ControlMessage::Console(line) => match console::parse(&line) {
                Ok(ConsoleLine::Empty) => {}
                Ok(ConsoleLine::Json(text)) => {
                    // Already logged by the dispatcher; the session keeps going.
                    let _ = dispatcher.handle(&mut state, &text);
                }
                Ok(ConsoleLine::Interact { gesture, control }) => {
                    if matches!(gesture, Gesture::Press | Gesture::Click | Gesture::Hold) {
                        state.notify(Event::pressed(control));
                    }
                    if matches!(gesture, Gesture::Release | Gesture::Click) {
                        state.notify(Event::released(control));
                    }
                }
                Ok(ConsoleLine::Show) => {
                    let snapshot = state.snapshot();
                    eprint!("{}", console::render(&snapshot, &last_render));
                    last_render = snapshot;
                }
                Ok(ConsoleLine::Quit) => break,
                Err(err) => warn!("{err:#}"),
            },
            ControlMessage::StdinClosed => {
                if source.is_none() {
                    break;
                }
                debug!("stdin closed, still serving MIDI");
            }
        }
    }

    state.clear_listener();
    if let Some(source) = source {
        debug!("closing MIDI input \"{}\"", source.port_name());
        source.close();
    }
    if let Some(sink) = sink.borrow_mut().take() {
        debug!("closing MIDI output \"{}\"", sink.port_name());
        sink.close();
    }
    info!("emulator stopped");
    Ok(())
}

fn load_config(args: &Args) -> Result<EmulatorConfig> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let mut config = match &args.config {
        Some(path) => EmulatorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if default_path.exists() => EmulatorConfig::load(default_path)
            .with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))?,
        None => EmulatorConfig::default(),
    };

    config.strict |= args.strict;
    if let Some(level) = args.brightness {
        config.brightness = level;
    }
    if args.midi_in.is_some() {
        config.midi.input_port = args.midi_in.clone();
    }
    if args.midi_out.is_some() {
        config.midi.output_port = args.midi_out.clone();
    }
    if args.virtual_port.is_some() {
        config.midi.virtual_port = args.virtual_port.clone();
    }
    if config.midi.client_name.trim().is_empty() {
        config.midi.client_name = DEFAULT_CLIENT_NAME.to_string();
    }
    Ok(config)
}

fn connect_midi(
    config: &EmulatorConfig,
    tx: &mpsc::Sender<ControlMessage>,
) -> Result<(Option<MidiCommandSource>, Option<MidiEventSink>)> {
    if !config.midi_enabled() {
        return Ok((None, None));
    }

    let client_name = config.midi.client_name.as_str();
    let forwarder = || {
        let tx = tx.clone();
        move |bytes: &[u8]| {
            let _ = tx.send(ControlMessage::Midi(bytes.to_vec()));
        }
    };

    if let Some(port_name) = &config.midi.virtual_port {
        let (source, sink) = midi::create_virtual(client_name, port_name, forwarder())?;
        return Ok((Some(source), Some(sink)));
    }

    let source = config
        .midi
        .input_port
        .as_deref()
        .map(|hint| MidiCommandSource::connect(client_name, hint, forwarder()))
        .transpose()?;
    let sink = config
        .midi
        .output_port
        .as_deref()
        .map(|hint| MidiEventSink::connect(client_name, hint))
        .transpose()?;
    Ok((source, sink))
}

fn spawn_stdin_reader(tx: mpsc::Sender<ControlMessage>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(ControlMessage::Console(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    error!("failed to read stdin: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(ControlMessage::StdinClosed);
    });
}
