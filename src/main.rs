use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn, Level};

use pixoo_max::config::Config;
use pixoo_max::output::{hex_dump, Output};
use pixoo_max::{encode_animation, encode_brightness, encode_command, encode_static_image};
use pixoo_max::{PixelGrid, Rgb};

#[derive(Parser)]
#[command(name = "pixoo_max")]
#[command(about = "Pixoo Max - drive a 32x32 Divoom LED matrix over its serial link", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON)
    config: String,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Enable detailed debug (hex dumps of every message)
    #[arg(long)]
    ddebug: bool,

    /// Encode and print messages without opening the serial port
    #[arg(long)]
    dry_run: bool,

    /// Send the command this many times
    #[arg(long, global = true, default_value_t = 1)]
    repeat: u32,

    /// Pause between repeats in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set brightness in percent (0-100)
    Brightness {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
    /// Show a single color on every pixel
    Fill { color: Rgb },
    /// Show a two-color checkerboard
    Checker { a: Rgb, b: Rgb },
    /// Play an animation alternating between two solid colors
    Blink {
        a: Rgb,
        b: Rgb,
        /// Number of animation frames
        #[arg(long, default_value_t = 2)]
        frames: usize,
        /// Duration of each frame in milliseconds
        #[arg(long, default_value_t = 500)]
        duration_ms: u16,
    },
    /// Send a raw command byte with arguments (hex like 0x45 or decimal)
    Raw {
        #[arg(value_parser = parse_byte)]
        command: u8,
        #[arg(value_parser = parse_byte)]
        args: Vec<u8>,
    },
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte {:?}: {}", s, e))
}

fn checkerboard(a: Rgb, b: Rgb) -> PixelGrid {
    let mut grid = PixelGrid::new();
    grid.transform(|x, y, _, _| if (x + y) % 2 == 0 { a } else { b });
    grid
}

/// Encode the requested command into the messages to send, in order
fn encode(command: &Command) -> Result<Vec<Vec<u8>>> {
    let messages = match command {
        Command::Brightness { level } => vec![encode_brightness(*level)?],
        Command::Fill { color } => vec![encode_static_image(&PixelGrid::filled(*color))?],
        Command::Checker { a, b } => vec![encode_static_image(&checkerboard(*a, *b))?],
        Command::Blink {
            a,
            b,
            frames,
            duration_ms,
        } => {
            let grids: Vec<PixelGrid> = (0..*frames)
                .map(|i| PixelGrid::filled(if i % 2 == 0 { *a } else { *b }))
                .collect();
            encode_animation(&grids, *duration_ms)?
        }
        Command::Raw { command, args } => vec![encode_command(*command, args)?],
    };
    Ok(messages)
}

/// Open the serial output, or nothing for a dry run.
///
/// The config file is only read when a port is actually opened.
fn open_output(cli: &Cli) -> Result<Option<Output>> {
    if cli.dry_run {
        return Ok(None);
    }

    let config_data = fs::read_to_string(&cli.config)
        .context(format!("Failed to read config {}", cli.config))?;
    let config: Config = serde_json::from_str(&config_data)
        .context(format!("Failed to parse config {}", cli.config))?;

    Ok(Some(Output::open(&config)?))
}

/// Sleep for `duration`, waking early once `running` is cleared
fn pause(running: &AtomicBool, duration: Duration) {
    let step = Duration::from_millis(50);
    let mut remaining = duration;
    while !remaining.is_zero() && running.load(Ordering::Relaxed) {
        let nap = remaining.min(step);
        thread::sleep(nap);
        remaining -= nap;
    }
}

/// Send the message group `repeat` times, returning how many rounds went out.
///
/// A group is never split: animation chunks all declare the full animation
/// length, so Ctrl-C is honored only before a round starts.
fn send_rounds<F>(
    messages: &[Vec<u8>],
    repeat: u32,
    interval: Duration,
    running: &AtomicBool,
    mut send: F,
) -> Result<u32>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut rounds = 0;
    for round in 0..repeat {
        if round > 0 {
            pause(running, interval);
        }
        if !running.load(Ordering::Relaxed) {
            break;
        }
        for message in messages {
            send(message)?;
        }
        rounds += 1;
    }
    Ok(rounds)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.ddebug {
        Level::TRACE
    } else if cli.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let messages = encode(&cli.command)?;
    info!(
        messages = messages.len(),
        bytes = messages.iter().map(Vec::len).sum::<usize>(),
        "encoded command"
    );

    // Stop between rounds on Ctrl-C
    let running = Arc::new(AtomicBool::new(true));
    let handler_running = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Shutting down...");
        handler_running.store(false, Ordering::Relaxed);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let mut output = open_output(&cli)?;

    let rounds = send_rounds(
        &messages,
        cli.repeat,
        Duration::from_millis(cli.interval_ms),
        &running,
        |message| match output.as_mut() {
            Some(output) => output.send(message.to_vec()),
            None => {
                info!("{}", hex_dump(message));
                Ok(())
            }
        },
    )?;

    if let Some(mut output) = output {
        output.finish()?;
        info!(port = output.name(), sent = output.messages_sent(), rounds, "done");
    }

    Ok(())
}
