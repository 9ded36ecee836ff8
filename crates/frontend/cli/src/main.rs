mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::Settings;
use dmg_core::logging::LogConfig;
use dmg_core::timing::{frame_duration, FrameTiming};
use dmg_system::{BootRom, Cartridge, DmgSystem};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "dmg", version, about = "Game Boy CPU and memory emulator")]
pub struct Args {
    /// Path to a cartridge ROM image
    pub rom: PathBuf,

    /// 256-byte boot ROM mapped over 0x0000-0x00FF until 0xFF50 is written
    #[arg(long)]
    pub boot_rom: Option<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop after this many frames (default: run until interrupted)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Frame budget: "refresh" (70221 cycles) or "scanline" (154 x 114)
    #[arg(long, value_parser = config::parse_timing)]
    pub timing: Option<FrameTiming>,

    /// Run frames back to back instead of pacing them at 59.73 Hz
    #[arg(long, default_value_t = false)]
    pub unthrottled: bool,

    /// Print the cartridge header as JSON and exit
    #[arg(long, default_value_t = false)]
    pub header: bool,

    /// Global log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Per-category log level, e.g. `--log cpu=debug` (repeatable)
    #[arg(long = "log", value_name = "CATEGORY=LEVEL")]
    pub log: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    frames: u64,
    cycles: u64,
    instructions: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_or_default(args.config.as_deref())?;
    settings.apply_args(&args)?;
    settings.apply_logging()?;

    let filter = config::level_filter(LogConfig::global().max_level());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter.to_string()))
        .init();

    let cartridge = Cartridge::from_path(&args.rom)
        .with_context(|| format!("failed to load ROM {}", args.rom.display()))?;

    if args.header {
        println!("{}", serde_json::to_string_pretty(&cartridge.header_json())?);
        return Ok(());
    }

    let boot_rom = settings
        .boot_rom
        .as_ref()
        .map(|path| {
            BootRom::from_path(path)
                .with_context(|| format!("failed to load boot ROM {}", path.display()))
        })
        .transpose()?;

    log::info!(
        "loaded \"{}\" ({}, {} bytes){}",
        cartridge.header.title(),
        cartridge.header.cartridge_type_name(),
        cartridge.len(),
        if boot_rom.is_some() { " with boot ROM" } else { "" }
    );

    let mut system = DmgSystem::new(cartridge, boot_rom).with_timing(settings.timing);

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("failed to install signal handler")?;

    let started = Instant::now();
    let pacing = settings.throttle.then(frame_duration);
    let outcome = run(&mut system, args.frames, pacing, &running);
    let elapsed = started.elapsed();

    let summary = match &outcome {
        Ok(summary) => *summary,
        Err((summary, _)) => *summary,
    };
    log::info!(
        "ran {} frames, {} instructions, {} machine cycles in {:.2?}",
        summary.frames,
        summary.instructions,
        summary.cycles,
        elapsed
    );

    outcome
        .map(|_| ())
        .map_err(|(_, err)| err)
        .with_context(|| format!("emulation stopped at PC={:04X}", system.cpu().regs.pc))
}

/// Run frames until `running` clears, `frame_limit` is reached or the CPU
/// traps. With `pacing`, each frame is stretched to at least that long.
fn run(
    system: &mut DmgSystem,
    frame_limit: Option<u64>,
    pacing: Option<Duration>,
    running: &AtomicBool,
) -> Result<RunSummary, (RunSummary, dmg_system::DmgError)> {
    let mut summary = RunSummary::default();
    let mut deadline = Instant::now();

    while running.load(Ordering::SeqCst) {
        if frame_limit.is_some_and(|limit| summary.frames >= limit) {
            break;
        }

        let report = match system.step_frame_until(|| !running.load(Ordering::Relaxed)) {
            Ok(report) => report,
            Err(err) => return Err((summary, err)),
        };
        summary.cycles += report.cycles;
        summary.instructions += report.instructions;
        if report.interrupted {
            break;
        }
        summary.frames += 1;

        if let Some(frame_time) = pacing {
            deadline += frame_time;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind; don't try to catch up.
                deadline = now;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmg_system::cartridge::computed_header_checksum;

    fn looping_system(program: &[u8]) -> DmgSystem {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
        rom[0x0150..0x0150 + program.len()].copy_from_slice(program);
        rom[0x014D] = computed_header_checksum(&rom);
        DmgSystem::new(Cartridge::from_bytes(&rom).unwrap(), None)
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["dmg", "tetris.gb", "--frames", "10", "--header"]);
        assert_eq!(args.rom, PathBuf::from("tetris.gb"));
        assert_eq!(args.frames, Some(10));
        assert!(args.header);
        assert!(!args.unthrottled);
        assert_eq!(args.timing, None);
    }

    #[test]
    fn test_args_reject_unknown_timing() {
        assert!(Args::try_parse_from(["dmg", "a.gb", "--timing", "vsync"]).is_err());
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let mut sys = looping_system(&[0x18, 0xFE]);
        let running = AtomicBool::new(true);
        let summary = run(&mut sys, Some(3), None, &running).unwrap();
        assert_eq!(summary.frames, 3);
        assert!(summary.cycles >= 3 * 70221);
        assert_eq!(summary.cycles, sys.cpu().cycles());
    }

    #[test]
    fn test_run_honors_cleared_flag() {
        let mut sys = looping_system(&[0x18, 0xFE]);
        let running = AtomicBool::new(false);
        let summary = run(&mut sys, None, None, &running).unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_run_reports_trap_with_progress() {
        let mut sys = looping_system(&[0x00, 0xDD]);
        let running = AtomicBool::new(true);
        let (summary, err) = run(&mut sys, None, None, &running).unwrap_err();
        assert_eq!(summary.frames, 0);
        assert!(err.to_string().contains("0xDD"));
        assert!(err.to_string().contains("0x0151"));
    }
}
