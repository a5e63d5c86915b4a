mod cli;

use c8vm::{
    dasm::disassemble,
    vm::{disp::Display, run::Runner, RunnerEvent},
};

use anyhow::Context;
use clap::Parser;
use cli::{Cli, CliCommand};
use crossterm::style::Stylize;

use std::{
    fs,
    path::Path,
    time::{Duration, Instant},
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(level) = cli.command.log_level().to_level() {
        simple_logger::init_with_level(level)?;
    }

    match &cli.command {
        CliCommand::Run { path, seconds, .. } => {
            let config = cli
                .command
                .vm_config()
                .context("run command without a machine configuration")?;
            let rom = read_rom(path)?;

            let duration = Duration::try_from_secs_f64(*seconds)
                .context("--seconds must be a finite, non-negative number")?;
            let deadline = Instant::now()
                .checked_add(duration)
                .context("--seconds is too large")?;

            let runner = Runner::spawn(config, rom_name(path), &rom)?;

            let mut frame: Option<Display> = None;
            let mut beeps = 0;

            while Instant::now() < deadline && !runner.is_finished() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match runner.recv_event_timeout(remaining.min(Duration::from_millis(50))) {
                    Some(RunnerEvent::Frame(new_frame)) => frame = Some(new_frame),
                    Some(RunnerEvent::Beep) => beeps += 1,
                    // logged where it was raised, counted in the analytics
                    Some(RunnerEvent::Fault(_)) | None => (),
                }
            }

            let analytics = runner.exit()?;

            match frame {
                Some(frame) => println!("{}", frame),
                None => println!("  {} no frame was drawn", String::from("Note:").yellow().bold()),
            }
            if beeps > 0 {
                println!("  {} {} beeps", String::from("Heard").green().bold(), beeps);
            }
            println!("{}", analytics);
        }

        CliCommand::Dasm { path, .. } => {
            let rom = read_rom(path)?;
            for line in disassemble(&rom) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn read_rom(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("unable to read ROM at {}", path.display()))
}

fn rom_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
