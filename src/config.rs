use crate::util::IntervalAccuracy;

pub const INSTRUCTION_FREQUENCY: u32 = 700;
pub const TIMER_FREQUENCY: u32 = 60;

pub const GOOD_IPS_DIFF: f64 = 1.0;
pub const OKAY_IPS_DIFF: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VMConfig {
    // instructions executed per second by the runner
    pub instruction_frequency: u32,

    // timer decrements per second by the runner, independent of instruction_frequency
    pub timer_frequency: u32,

    // switch to a 64x64 display when a program boots with 0x1260 (see Interpreter::apply_vip_hires_quirk)
    pub vip_hires_quirk: bool,

    // fixed seed for the random number generator, entropy when None
    pub seed: Option<u64>,

    // how the runner sleeps between instructions, High spins for the last stretch
    pub pacing: IntervalAccuracy,
}

impl Default for VMConfig {
    fn default() -> Self {
        VMConfig {
            instruction_frequency: INSTRUCTION_FREQUENCY,
            timer_frequency: TIMER_FREQUENCY,
            vip_hires_quirk: true,
            seed: None,
            pacing: IntervalAccuracy::High,
        }
    }
}
