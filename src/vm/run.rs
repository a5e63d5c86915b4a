use super::{
    core::VM,
    disp::Display,
    interp::Fault,
    mem::LoadError,
};

use crate::{
    config::{VMConfig, GOOD_IPS_DIFF, OKAY_IPS_DIFF},
    util::{Interval, TimerClock},
};

use crossterm::style::Stylize;

use std::{
    any::Any,
    fmt,
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

pub type RunResult = Result<RunAnalytics, RunnerError>;

// Host -> VM thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    KeyDown(u8),
    KeyUp(u8),
    Quit,
}

// VM thread -> host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    Frame(Display),
    Beep,
    Fault(Fault),
}

#[derive(Debug)]
pub enum RunnerError {
    Load(LoadError),
    ThreadNotResponding,
    ThreadPanic(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Load(err) => write!(f, "unable to load ROM: {}", err),
            RunnerError::ThreadNotResponding => write!(f, "VM thread is not responding"),
            RunnerError::ThreadPanic(message) => write!(f, "VM thread panicked: {}", message),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<LoadError> for RunnerError {
    fn from(err: LoadError) -> Self {
        RunnerError::Load(err)
    }
}

/// Drives a [`VM`] on its own thread.
///
/// The VM never leaves that thread: keypad changes arrive as [`RunnerCommand`]s
/// and frames, beeps and faults leave as [`RunnerEvent`]s. Instructions run at
/// `instruction_frequency` while the timers tick at `timer_frequency` measured
/// against the wall clock, so a fast host never speeds up the timers.
pub struct Runner {
    thread_handle: JoinHandle<RunAnalytics>,
    command_sender: Sender<RunnerCommand>,
    event_receiver: Receiver<RunnerEvent>,
}

impl Runner {
    pub fn spawn(config: VMConfig, name: impl Into<String>, rom: &[u8]) -> Result<Self, RunnerError> {
        // load on the calling thread so a bad ROM never starts a thread
        let vm = VM::with_rom(&config, rom)?;
        let name = name.into();

        let (command_sender, command_receiver) = channel::<RunnerCommand>();
        let (event_sender, event_receiver) = channel::<RunnerEvent>();

        let thread_handle = thread::spawn(move || {
            run_loop(vm, config, name, command_receiver, event_sender)
        });

        Ok(Runner {
            thread_handle,
            command_sender,
            event_receiver,
        })
    }

    pub fn command_sender(&self) -> Sender<RunnerCommand> {
        self.command_sender.clone()
    }

    pub fn events(&self) -> impl Iterator<Item = RunnerEvent> + '_ {
        self.event_receiver.try_iter()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<RunnerEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    pub fn press_key(&self, key: u8) -> Result<(), RunnerError> {
        self.send(RunnerCommand::KeyDown(key))
    }

    pub fn release_key(&self, key: u8) -> Result<(), RunnerError> {
        self.send(RunnerCommand::KeyUp(key))
    }

    pub fn is_finished(&self) -> bool {
        self.thread_handle.is_finished()
    }

    pub fn exit(self) -> RunResult {
        let Runner {
            thread_handle,
            command_sender,
            ..
        } = self;

        // the thread also stops if it sees the sender was dropped
        command_sender.send(RunnerCommand::Quit).ok();
        drop(command_sender);

        thread_handle
            .join()
            .map_err(|panic| RunnerError::ThreadPanic(panic_message(panic)))
    }

    fn send(&self, command: RunnerCommand) -> Result<(), RunnerError> {
        self.command_sender
            .send(command)
            .map_err(|_| RunnerError::ThreadNotResponding)
    }
}

fn panic_message(panic: Box<dyn Any + Send + 'static>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}

fn run_loop(
    mut vm: VM,
    config: VMConfig,
    rom_name: String,
    commands: Receiver<RunnerCommand>,
    events: Sender<RunnerEvent>,
) -> RunAnalytics {
    let mut interval = Interval::from_frequency("interp", config.instruction_frequency, config.pacing);
    let mut timer_clock = TimerClock::new(config.timer_frequency);

    let mut analytics = RunAnalytics {
        rom_name,
        target_ips: config.instruction_frequency,
        runtime_duration: Duration::ZERO,
        instructions_executed: 0,
        timer_ticks: 0,
        faults: 0,
    };

    let runtime_start = Instant::now();
    let mut timer_instant = Instant::now();

    log::info!("runner started at {}Hz", config.instruction_frequency);
    interval.reset();

    while vm.is_running() {
        // apply host input
        loop {
            match commands.try_recv() {
                Ok(RunnerCommand::KeyDown(key)) => vm.press_key(key),
                Ok(RunnerCommand::KeyUp(key)) => vm.release_key(key),
                Ok(RunnerCommand::Quit) | Err(TryRecvError::Disconnected) => {
                    vm.halt();
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if !vm.is_running() {
            break;
        }

        if let Err(fault) = vm.execute() {
            analytics.faults += 1;
            events.send(RunnerEvent::Fault(fault)).ok();
        }
        analytics.instructions_executed += 1;

        // timers follow the wall clock, not the instruction count
        let now = Instant::now();
        let ticks = timer_clock.advance(now - timer_instant);
        timer_instant = now;

        for _ in 0..ticks {
            vm.tick_timers();
            if vm.take_beep() {
                events.send(RunnerEvent::Beep).ok();
            }
        }
        analytics.timer_ticks += ticks as u64;

        if let Some(frame) = vm.extract_new_frame() {
            events.send(RunnerEvent::Frame(frame)).ok();
        }

        interval.sleep();
    }

    analytics.runtime_duration = runtime_start.elapsed();
    log::info!("runner stopped after {} instructions", analytics.instructions_executed);
    analytics
}

#[derive(Debug, Clone)]
pub struct RunAnalytics {
    pub rom_name: String,
    pub target_ips: u32,
    pub runtime_duration: Duration,
    pub instructions_executed: u64,
    pub timer_ticks: u64,
    pub faults: u64,
}

impl fmt::Display for RunAnalytics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ips = self.instructions_executed as f64 / self.runtime_duration.as_secs_f64();
        let ips_diff = (ips - self.target_ips as f64) / self.target_ips as f64 * 100.0;
        let color_ips_diff = if ips_diff.abs() > OKAY_IPS_DIFF {
            Stylize::red
        } else if ips_diff.abs() > GOOD_IPS_DIFF {
            Stylize::yellow
        } else {
            Stylize::green
        };

        writeln!(
            f,
            "{} \"{}\" runtime",
            String::from("Analyzing").green().bold(),
            self.rom_name
        )?;
        writeln!(
            f,
            "    {} Runner: {:.3}s",
            String::from("|").blue().bold(),
            self.runtime_duration.as_secs_f64()
        )?;
        writeln!(
            f,
            "    {} Timers ticked {} times, {} faults",
            String::from("|").blue().bold(),
            self.timer_ticks,
            self.faults
        )?;
        write!(
            f,
            "    {} Runner continuously executed {:.2} inst/sec",
            String::from("=").blue().bold(),
            if ips.is_finite() { ips } else { 0.0 }
        )?;

        if ips.is_finite() {
            write!(
                f,
                " ( {} from {} inst/sec target )",
                color_ips_diff(format!(
                    "{}{:.2}%",
                    if ips_diff >= 0.0 { "+" } else { "" },
                    ips_diff
                ))
                .bold(),
                self.target_ips
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::IntervalAccuracy;

    fn rom(program: &[u16]) -> Vec<u8> {
        program.iter().flat_map(|op| op.to_be_bytes()).collect()
    }

    fn config() -> VMConfig {
        VMConfig {
            instruction_frequency: 2000,
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn oversized_rom_never_starts() {
        let result = Runner::spawn(config(), "big", &vec![0; 0x1000]);
        assert!(matches!(result, Err(RunnerError::Load(_))));
    }

    #[test]
    fn frames_flow_to_the_host() {
        // draw glyph 0 then spin
        let runner = Runner::spawn(config(), "draw", &rom(&[0xA000, 0xD005, 0x1204])).unwrap();

        let frame = loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(RunnerEvent::Frame(frame)) => break frame,
                Some(_) => continue,
                None => panic!("no frame received"),
            }
        };
        assert!(frame.pixel(0, 0));

        let analytics = runner.exit().unwrap();
        assert!(analytics.instructions_executed >= 2);
        assert_eq!(analytics.faults, 0);
    }

    #[test]
    fn scheduler_pacing_still_runs() {
        let runner = Runner::spawn(
            VMConfig {
                pacing: IntervalAccuracy::Default,
                ..config()
            },
            "draw",
            &rom(&[0xA000, 0xD005, 0x1204]),
        )
        .unwrap();

        let drew = loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(RunnerEvent::Frame(_)) => break true,
                Some(_) => continue,
                None => break false,
            }
        };
        assert!(drew);
        runner.exit().unwrap();
    }

    #[test]
    fn beep_follows_wall_clock_timers() {
        // sound timer = 2 ticks then spin
        let runner = Runner::spawn(config(), "beep", &rom(&[0x6002, 0xF018, 0x1204])).unwrap();

        let beeped = loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(RunnerEvent::Beep) => break true,
                Some(_) => continue,
                None => break false,
            }
        };
        assert!(beeped);

        let analytics = runner.exit().unwrap();
        assert!(analytics.timer_ticks >= 2);
    }

    #[test]
    fn keys_reach_the_vm() {
        // wait for a key, then execute an unknown opcode to signal it arrived
        let runner = Runner::spawn(config(), "keys", &rom(&[0xF00A, 0x0000, 0x1204])).unwrap();
        runner.press_key(0x7).unwrap();

        let fault = loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(RunnerEvent::Fault(fault)) => break Some(fault),
                Some(_) => continue,
                None => break None,
            }
        };
        assert_eq!(fault, Some(Fault::UnknownOpcode(0x0000)));

        let analytics = runner.exit().unwrap();
        assert_eq!(analytics.faults, 1);
    }
}
