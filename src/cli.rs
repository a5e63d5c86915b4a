use c8vm::{
    config::{VMConfig, INSTRUCTION_FREQUENCY},
    util::IntervalAccuracy,
};

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

const DEFAULT_RUN_SECONDS: f64 = 10.0;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// C8VM: headless CHIP-8 virtual machine and disassembler.
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevelOption {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevelOption {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevelOption::Trace => LevelFilter::Trace,
            LogLevelOption::Debug => LevelFilter::Debug,
            LogLevelOption::Info => LevelFilter::Info,
            LogLevelOption::Warn => LevelFilter::Warn,
            LogLevelOption::Error => LevelFilter::Error,
        }
    }
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// C8VM RUN: Loads a CHIP-8 ROM and runs it for a fixed wall-clock duration
    Run {
        /// Path of the ROM to load
        #[arg(value_name = "ROM")]
        path: PathBuf,

        /// Sets the instructions executed per second
        #[arg(long, default_value_t = INSTRUCTION_FREQUENCY)]
        hz: u32,

        /// Seconds to run before stopping the machine
        #[arg(long, default_value_t = DEFAULT_RUN_SECONDS)]
        seconds: f64,

        /// Seeds the random number generator for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Disables the 64x64 COSMAC VIP display switch for ROMs booting with 0x1260
        #[arg(long)]
        no_vip_quirk: bool,

        /// Sleeps through the OS scheduler only, trading pacing accuracy for CPU time
        #[arg(long)]
        coarse_sleep: bool,

        /// Enable logging
        #[arg(short, long, value_enum, value_name = "LEVEL")]
        log: Option<LogLevelOption>,
    },

    /// C8VM DASM: Disassembles a CHIP-8 ROM
    Dasm {
        /// Path of the ROM to load
        #[arg(value_name = "ROM")]
        path: PathBuf,

        /// Enable logging
        #[arg(short, long, value_enum, value_name = "LEVEL")]
        log: Option<LogLevelOption>,
    },
}

impl CliCommand {
    pub fn log_level(&self) -> LevelFilter {
        match self {
            CliCommand::Run { log, .. } | CliCommand::Dasm { log, .. } => log
                .map(LogLevelOption::to_level_filter)
                .unwrap_or(LevelFilter::Off),
        }
    }

    /// Machine configuration for `run`, `None` for commands that never start a machine.
    pub fn vm_config(&self) -> Option<VMConfig> {
        match *self {
            CliCommand::Run {
                hz,
                seed,
                no_vip_quirk,
                coarse_sleep,
                ..
            } => Some(VMConfig {
                instruction_frequency: hz,
                vip_hires_quirk: !no_vip_quirk,
                seed,
                pacing: if coarse_sleep {
                    IntervalAccuracy::Default
                } else {
                    IntervalAccuracy::High
                },
                ..Default::default()
            }),
            CliCommand::Dasm { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["c8vm", "run", "game.ch8"]).unwrap();
        assert_eq!(cli.command.log_level(), LevelFilter::Off);

        let config = cli.command.vm_config().unwrap();
        assert_eq!(config, VMConfig::default());

        match cli.command {
            CliCommand::Run { path, seconds, .. } => {
                assert_eq!(path, PathBuf::from("game.ch8"));
                assert_eq!(seconds, DEFAULT_RUN_SECONDS);
            }
            CliCommand::Dasm { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn run_options_reach_config() {
        let cli = Cli::try_parse_from([
            "c8vm", "run", "game.ch8", "--hz", "1000", "--seed", "42", "--no-vip-quirk", "--log", "warn",
        ])
        .unwrap();
        assert_eq!(cli.command.log_level(), LevelFilter::Warn);

        let config = cli.command.vm_config().unwrap();
        assert_eq!(config.instruction_frequency, 1000);
        assert_eq!(config.seed, Some(42));
        assert!(!config.vip_hires_quirk);
        assert_eq!(config.pacing, IntervalAccuracy::High);
    }

    #[test]
    fn coarse_sleep_selects_scheduler_pacing() {
        let cli = Cli::try_parse_from(["c8vm", "run", "game.ch8", "--coarse-sleep"]).unwrap();
        let config = cli.command.vm_config().unwrap();
        assert_eq!(config.pacing, IntervalAccuracy::Default);
        assert_eq!(config.instruction_frequency, INSTRUCTION_FREQUENCY);
    }

    #[test]
    fn dasm_has_no_machine() {
        let cli = Cli::try_parse_from(["c8vm", "dasm", "game.ch8", "-l", "debug"]).unwrap();
        assert_eq!(cli.command.log_level(), LevelFilter::Debug);
        assert!(cli.command.vm_config().is_none());
    }

    #[test]
    fn rom_path_is_required() {
        assert!(Cli::try_parse_from(["c8vm", "run"]).is_err());
    }
}
