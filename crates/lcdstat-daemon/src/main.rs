//! lcdstat Daemon
//!
//! Renders memory, CPU, filesystem usage and the time on a character LCD
//! once per refresh period.

mod config;
mod screen;
mod sensors;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use lcdstat_hw::Lcd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use sensors::{Sensors, SystemData};

/// Configuration file used when none is given.
const DEFAULT_CONFIG: &str = "config/default.toml";

/// Minimum time between logs of a repeating render error.
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "lcdstatd")]
#[command(about = "Show system statistics on an HD44780 character LCD")]
#[command(version)]
struct Cli {
    /// Configuration file (default: config/default.toml)
    config: Option<PathBuf>,

    /// I2C bus device, overrides the configuration
    #[arg(long)]
    device: Option<String>,

    /// I2C address (e.g. 0x3f), overrides the configuration
    #[arg(long, value_parser = parse_address)]
    address: Option<u8>,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_address(s: &str) -> std::result::Result<u8, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid address {}: {}", s, e))?;
    if value > 0x7F {
        return Err(format!("address 0x{:02X} is not a 7-bit address", value));
    }
    Ok(value)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            Ok(config)
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            let config = Config::load(DEFAULT_CONFIG).context("Failed to load configuration")?;
            info!("Loaded configuration from: {}", DEFAULT_CONFIG);
            Ok(config)
        }
        None => {
            info!("No configuration file, using defaults");
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.display.device = device;
    }
    if let Some(address) = cli.address {
        config.display.address = address;
    }

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let geometry = config
        .display
        .geometry()
        .context("Invalid display geometry")?;
    let pins = config
        .display
        .pins
        .to_pin_map()
        .context("Invalid pin configuration")?;
    let cursor = config
        .display
        .cursor_style()
        .context("Invalid cursor style")?;

    let mut lcd = Lcd::open(&config.display.device, config.display.address, geometry, pins)
        .with_context(|| {
            format!(
                "Failed to set up LCD at {} (0x{:02X})",
                config.display.device, config.display.address
            )
        })?;
    if !config.display.backlight {
        lcd.backlight_off().context("Failed to switch backlight off")?;
    }
    lcd.set_cursor_style(cursor).context("Failed to set cursor style")?;
    lcd.define_bar_glyphs().context("Failed to load bar glyphs")?;
    lcd.buffer_on();

    let mut sensors =
        Sensors::new(config.filesystem.clone()).context("Failed to initialise sensors")?;

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    // The loop only yields between frames, so stopping never interrupts a transfer.
    tokio::select! {
        _ = render_loop(&mut lcd, &mut sensors, config.refresh) => {}
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    if config.display.blank_on_exit {
        if let Err(e) = tokio::task::block_in_place(|| blank(&mut lcd)) {
            warn!("Failed to blank display: {}", e);
        }
    }

    Ok(())
}

async fn render_loop<I2C: I2c, D: DelayNs>(
    lcd: &mut Lcd<I2C, D>,
    sensors: &mut Sensors,
    refresh_ms: u64,
) {
    let mut throttle = ErrorThrottle::default();

    loop {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        tokio::time::sleep(until_next_tick(now, refresh_ms)).await;

        let result = tokio::task::block_in_place(|| {
            let data = sensors.sample().context("Failed to sample sensors")?;
            debug!(
                "Sampled cpu={:.2} mem={:.2} fs={:.2}",
                data.cpu_usage, data.mem_resident, data.fs_used
            );
            draw_frame(lcd, &data)
        });

        match result {
            Ok(()) => {
                let unlogged = throttle.success();
                if unlogged > 0 {
                    info!("Rendering recovered ({} errors not logged)", unlogged);
                }
            }
            Err(e) => match throttle.failure(Instant::now()) {
                Some(ErrorReport::First) => warn!("Render error: {:#}", e),
                Some(ErrorReport::Repeated { count, elapsed }) => warn!(
                    "Render error (repeated {} times in {:?}): {:#}",
                    count, elapsed, e
                ),
                None => {}
            },
        }
    }
}

/// What to log for a failed frame.
#[derive(Debug, PartialEq, Eq)]
enum ErrorReport {
    /// First failure after a good frame.
    First,
    /// Failures since the previous log line.
    Repeated { count: u32, elapsed: Duration },
}

/// Collapses a run of render errors into one line per [`ERROR_LOG_INTERVAL`].
#[derive(Debug, Default)]
struct ErrorThrottle {
    last_log: Option<Instant>,
    unlogged: u32,
}

impl ErrorThrottle {
    fn failure(&mut self, now: Instant) -> Option<ErrorReport> {
        let Some(last_log) = self.last_log else {
            self.last_log = Some(now);
            return Some(ErrorReport::First);
        };

        self.unlogged += 1;
        let elapsed = now.saturating_duration_since(last_log);
        if elapsed < ERROR_LOG_INTERVAL {
            return None;
        }
        self.last_log = Some(now);
        Some(ErrorReport::Repeated {
            count: std::mem::take(&mut self.unlogged),
            elapsed,
        })
    }

    /// Ends the current run. Returns the errors that were never logged.
    fn success(&mut self) -> u32 {
        self.last_log = None;
        std::mem::take(&mut self.unlogged)
    }
}

/// Redraws the screen, re-initialising the controller first if the
/// previous frame lost a transfer.
fn draw_frame<I2C: I2c, D: DelayNs>(lcd: &mut Lcd<I2C, D>, data: &SystemData) -> Result<()> {
    if lcd.needs_resync() {
        lcd.resync().context("Failed to re-initialise LCD")?;
    }
    screen::render(lcd, data).context("Failed to draw status screen")
}

fn blank(lcd: &mut Lcd) -> lcdstat_hw::Result<()> {
    lcd.buffer_off();
    lcd.clear()?;
    lcd.backlight_off()?;
    info!("Display blanked");
    Ok(())
}

/// Time from `now` (since the epoch) to the next multiple of the period.
fn until_next_tick(now: Duration, period_ms: u64) -> Duration {
    let period = period_ms.max(1);
    let now_ms = now.as_millis() as u64;
    Duration::from_millis(period - now_ms % period)
}
