//! doorlock-sim: runs one or both controllers on the host.
//!
//! ```text
//! ┌───────────────────────────┐          ┌───────────────────────────┐
//! │  FrontService             │  Link    │  BackService              │
//! │  keypad: stdin / --keys   │◀────────▶│  store: --eeprom / RAM    │
//! │  display: log             │ (memory  │  actuator: log            │
//! │  timer: thread / instant  │ or tty)  │  timer: thread / instant  │
//! └───────────────────────────┘          └───────────────────────────┘
//! ```
//!
//! `--role both` wires the two services together in-process, the back on
//! its own thread.  `--role front` and `--role back` run a single side
//! over `--device`, e.g. a serial node or a pty pair.
#![deny(unused_must_use)]

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use doorlock::Error;
use doorlock::adapters::console::{LineKeypad, LogDisplay, ScriptedKeypad};
use doorlock::adapters::eeprom::{FileEeprom, MemoryEeprom};
use doorlock::adapters::hardware::LogActuator;
use doorlock::adapters::log_sink::LogEventSink;
use doorlock::adapters::timer::{StepTimer, ThreadTick, ThreadTimer};
use doorlock::app::ports::{ActuationTimer, CredentialStore, Keypad};
use doorlock::app::service::{BackService, FrontService};
use doorlock::config::LockConfig;
use doorlock::error::LinkError;
use doorlock::link::{IoLink, Link, MemoryLink};
use doorlock::tick::TickCounter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-controller door-lock simulator")]
struct Cli {
    /// Which controller(s) to run.
    #[arg(long, value_enum, default_value_t = RoleArg::Both)]
    role: RoleArg,

    /// Byte-stream device for single-role runs.
    #[arg(long, value_name = "PATH")]
    device: Option<PathBuf>,

    /// JSON configuration file.  Missing fields take defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// EEPROM image file for the back controller.  RAM only when omitted.
    #[arg(long, value_name = "PATH")]
    eeprom: Option<PathBuf>,

    /// Scripted key presses instead of stdin, e.g. "12345=12345=+12345=".
    #[arg(long, value_name = "KEYS")]
    keys: Option<String>,

    /// Deliver ticks as fast as the loop polls instead of on the wall clock.
    #[arg(long)]
    instant: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RoleArg {
    Both,
    Front,
    Back,
}

// ── Timer selection ───────────────────────────────────────────

/// Wall-clock or instant ticks, chosen at startup.
enum SimTimer {
    Wall(ThreadTimer),
    Instant(StepTimer),
}

impl SimTimer {
    fn new(instant: bool) -> Self {
        if instant {
            Self::Instant(StepTimer::new())
        } else {
            Self::Wall(ThreadTimer::new())
        }
    }
}

impl ActuationTimer for SimTimer {
    type Handle = Option<ThreadTick>;

    fn subscribe(&mut self, interval_ms: u32, ticks: TickCounter) -> Option<ThreadTick> {
        match self {
            Self::Wall(t) => Some(t.subscribe(interval_ms, ticks)),
            Self::Instant(t) => {
                t.subscribe(interval_ms, ticks);
                None
            }
        }
    }

    fn unsubscribe(&mut self, handle: Option<ThreadTick>) {
        match (self, handle) {
            (Self::Wall(t), Some(h)) => t.unsubscribe(h),
            (Self::Instant(t), _) => t.unsubscribe(()),
            (Self::Wall(_), None) => {}
        }
    }

    fn idle(&mut self) {
        match self {
            Self::Wall(t) => t.idle(),
            Self::Instant(t) => t.idle(),
        }
    }
}

// ── Wiring ────────────────────────────────────────────────────

type SimLink = Box<dyn Link + Send>;

fn open_device(cli: &Cli) -> Result<SimLink> {
    let Some(path) = &cli.device else {
        bail!("--device is required with --role {:?}", cli.role);
    };
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    info!("link: {}", path.display());
    Ok(Box::new(IoLink::new(file)))
}

fn keypad(cli: &Cli) -> Box<dyn Keypad> {
    match &cli.keys {
        Some(script) => Box::new(ScriptedKeypad::new(script)),
        None => Box::new(LineKeypad::new(io::stdin().lock())),
    }
}

fn store(cli: &Cli) -> Result<Box<dyn CredentialStore + Send>> {
    let store: Box<dyn CredentialStore + Send> = match &cli.eeprom {
        Some(path) => Box::new(
            FileEeprom::open(path).with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(MemoryEeprom::new()),
    };
    Ok(store)
}

fn run_front(cli: &Cli, link: SimLink, config: LockConfig) {
    let mut front = FrontService::new(
        link,
        keypad(cli),
        LogDisplay::default(),
        SimTimer::new(cli.instant),
        LogEventSink::new(),
        config,
    );
    front.start();
    match front.run() {
        Error::InputClosed => info!("front: keypad input finished"),
        e => warn!("front: {e}"),
    }
}

fn run_back(
    instant: bool,
    link: SimLink,
    store: Box<dyn CredentialStore + Send>,
    config: LockConfig,
) -> Result<()> {
    let mut back = BackService::new(
        link,
        store,
        SimTimer::new(instant),
        LogActuator,
        LogEventSink::new(),
        config,
    )
    .context("configuring back controller")?;
    back.start();
    match back.run() {
        Error::Link(LinkError::Closed) => info!("back: link closed"),
        e => warn!("back: {e}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => LockConfig::from_json_file(path)
            .map_err(Error::from)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LockConfig::default(),
    };
    info!("doorlock-sim: role={:?} instant={}", cli.role, cli.instant);

    match cli.role {
        RoleArg::Front => run_front(&cli, open_device(&cli)?, config),
        RoleArg::Back => run_back(cli.instant, open_device(&cli)?, store(&cli)?, config)?,
        RoleArg::Both => {
            let (front_end, back_end) = MemoryLink::pair();
            let store = store(&cli)?;
            let back_config = config.clone();
            let instant = cli.instant;
            let back = thread::Builder::new()
                .name("back".into())
                .spawn(move || run_back(instant, Box::new(back_end), store, back_config))
                .context("spawning back controller")?;

            run_front(&cli, Box::new(front_end), config);
            match back.join() {
                Ok(result) => result?,
                Err(_) => bail!("back controller panicked"),
            }
        }
    }
    Ok(())
}
