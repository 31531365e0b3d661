use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use tracing::{info, warn};

use tuner_core::{
    build_tuner_app, load_tuner_config, load_tuner_config_from_env, run_tick, vehicle_manifest,
    EditOutcome, InMemoryHost, LoadOutcome, RowView, Transmission, TunerSession, TunerTick,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Line console for live vehicle tuning", long_about = None)]
struct Cli {
    /// Directory holding the operator profile.
    #[arg(long, default_value = ".")]
    profile_dir: PathBuf,
    /// Tuner config JSON; falls back to TUNER_CONFIG_PATH, then the builtin.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Milliseconds between frames.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (config, source) = match cli.config.as_deref() {
        Some(path) => load_tuner_config(Some(path)),
        None => load_tuner_config_from_env(),
    };

    let host = InMemoryHost::vehicle_demo();
    let mut session = TunerSession::new(
        &vehicle_manifest(),
        Arc::new(host.clone()),
        &cli.profile_dir,
        Arc::clone(&config),
    );
    if config.load_on_start() && session.load().is_err() {
        println!("profile could not be loaded; keeping current values");
    }

    let mut app = build_tuner_app(session);
    let command_rx = spawn_stdin_listener();
    let frame = Duration::from_millis(cli.frame_ms.max(1));

    info!(
        target: "tuner::console",
        profile_dir = %cli.profile_dir.display(),
        config = ?source,
        "tuner console ready"
    );

    'frames: loop {
        loop {
            match command_rx.try_recv() {
                Ok(Command::Quit) | Err(TryRecvError::Disconnected) => break 'frames,
                Ok(command) => handle_command(&mut app, &host, command),
                Err(TryRecvError::Empty) => break,
            }
        }
        run_tick(&mut app);
        thread::sleep(frame);
    }

    let session = app.world.resource::<TunerSession>();
    if config.save_on_exit() {
        if let Ok(path) = session.save() {
            println!("saved {}", path.display());
        }
    }
    info!(
        target: "tuner::console",
        frames = app.world.resource::<TunerTick>().0,
        "tuner console stopped"
    );
}

#[derive(Debug, PartialEq)]
enum Command {
    Show,
    Set { key: String, text: String },
    Inc(String),
    Dec(String),
    Step(String),
    Flag { key: String, on: bool },
    Trans { key: String, value: Transmission },
    Override { key: String, on: bool },
    Offsets { key: String, on: bool },
    GearAdd { key: String, at_front: bool },
    GearRemove { key: String, index: usize },
    GearSet { key: String, index: usize, text: String },
    GearReset(String),
    Ready { subsystem: String, on: bool },
    Save,
    Load,
    Restore,
    Quit,
}

fn spawn_stdin_listener() -> Receiver<Command> {
    let (sender, receiver) = unbounded::<Command>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(target: "tuner::console", error = %err, "stdin read error");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_command(trimmed) {
                Some(command) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                None => warn!(target: "tuner::console", input = trimmed, "invalid command"),
            }
        }
    });
    receiver
}

fn parse_command(input: &str) -> Option<Command> {
    let mut parts = input.split_whitespace();
    let command = match parts.next()? {
        "show" => Command::Show,
        "set" => {
            let key = parts.next()?.to_string();
            let text = parts.collect::<Vec<_>>().join(" ");
            Command::Set { key, text }
        }
        "inc" => Command::Inc(parts.next()?.to_string()),
        "dec" => Command::Dec(parts.next()?.to_string()),
        "step" => Command::Step(parts.next()?.to_string()),
        "flag" => Command::Flag {
            key: parts.next()?.to_string(),
            on: parse_switch(parts.next()?)?,
        },
        "trans" => Command::Trans {
            key: parts.next()?.to_string(),
            value: parts.next()?.parse().ok()?,
        },
        "override" => Command::Override {
            key: parts.next()?.to_string(),
            on: parse_switch(parts.next()?)?,
        },
        "offsets" => Command::Offsets {
            key: parts.next()?.to_string(),
            on: parse_switch(parts.next()?)?,
        },
        "gear" => {
            let key = parts.next()?.to_string();
            match parts.next()? {
                "add" => Command::GearAdd {
                    key,
                    at_front: match parts.next().unwrap_or("bottom") {
                        "top" | "front" => true,
                        "bottom" | "back" => false,
                        _ => return None,
                    },
                },
                "remove" => Command::GearRemove {
                    key,
                    index: parts.next()?.parse().ok()?,
                },
                "set" => Command::GearSet {
                    key,
                    index: parts.next()?.parse().ok()?,
                    text: parts.next()?.to_string(),
                },
                "reset" => Command::GearReset(key),
                _ => return None,
            }
        }
        "ready" => Command::Ready {
            subsystem: parts.next()?.to_string(),
            on: parse_switch(parts.next()?)?,
        },
        "save" => Command::Save,
        "load" => Command::Load,
        "restore" => Command::Restore,
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn parse_switch(input: &str) -> Option<bool> {
    match input {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn handle_command(app: &mut bevy::prelude::App, host: &InMemoryHost, command: Command) {
    let mut session = app.world.resource_mut::<TunerSession>();
    let outcome = match command {
        Command::Show => {
            print_view(&session);
            return;
        }
        Command::Set { key, text } => session.commit(&key, &text),
        Command::Inc(key) => session.increment(&key),
        Command::Dec(key) => session.decrement(&key),
        Command::Step(text) => session.set_step(&text),
        Command::Flag { key, on } => session.set_flag(&key, on),
        Command::Trans { key, value } => session.set_transmission(&key, value),
        Command::Override { key, on } => session.set_override_enabled(&key, on),
        Command::Offsets { key, on } => session.set_offsets_enabled(&key, on),
        Command::GearAdd { key, at_front } => session.sequence_add(&key, at_front),
        Command::GearRemove { key, index } => session.sequence_remove(&key, index),
        Command::GearSet { key, index, text } => session.sequence_commit(&key, index, &text),
        Command::GearReset(key) => session.sequence_reset(&key),
        Command::Ready { subsystem, on } => {
            host.set_ready(subsystem, on);
            return;
        }
        Command::Save => {
            match session.save() {
                Ok(path) => println!("saved {}", path.display()),
                Err(err) => println!("save failed: {err}"),
            }
            return;
        }
        Command::Load => {
            match session.load() {
                Ok(LoadOutcome::Applied(report)) => println!(
                    "loaded {} entries ({} zero entries skipped)",
                    report.written, report.zero_skipped
                ),
                Ok(LoadOutcome::NothingToLoad) => println!("nothing to load"),
                Err(err) => println!("load failed: {err}"),
            }
            return;
        }
        Command::Restore => {
            let report = session.restore_all();
            println!("restored {} fields", report.fields);
            return;
        }
        Command::Quit => return,
    };

    match outcome {
        EditOutcome::Changed => {}
        EditOutcome::Unchanged => println!("no change"),
        EditOutcome::Unbound => println!("unknown key"),
    }
}

fn print_view(session: &TunerSession) {
    let view = session.view();
    println!("step = {}", view.step.buffer);
    for row in &view.rows {
        match row {
            RowView::Number { key, buffer, .. } => println!("{key} = {buffer}"),
            RowView::Flag { key, value, .. } => println!("{key} = {}", on_off(*value)),
            RowView::Transmission { key, value, .. } => println!("{key} = {value}"),
            RowView::Sequence {
                key,
                entries,
                dirty,
                ..
            } => {
                let values: Vec<_> = entries.iter().map(|entry| entry.buffer.as_str()).collect();
                let marker = if *dirty { " (modified)" } else { "" };
                println!("{key} = [{}]{marker}", values.join(", "));
            }
            RowView::Override {
                key,
                enabled,
                applied,
                ready,
                value,
                ..
            } => {
                println!(
                    "{key} = {} (applied {}, ready {})",
                    on_off(*enabled),
                    on_off(*applied),
                    on_off(*ready)
                );
                println!("  {} = {}", value.key, value.buffer);
            }
            RowView::Offsets {
                key, enabled, axles, ..
            } => {
                println!("{key} = {}", on_off(*enabled));
                for axle in axles {
                    println!("  {} = {}", axle.key, axle.buffer);
                }
            }
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
