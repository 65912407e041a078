//! Typed instrument limits and SCPI value enums.
//!
//! Every numeric or enumerated parameter is checked against the owning
//! instrument's limit table before the command string is formatted, so a bad
//! value never reaches the bus.

use crate::{Error, Result};

/// A declared check applied to one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Range { min: f64, max: f64 },
    OneOf(&'static [&'static str]),
}

impl Constraint {
    pub fn check_value(&self, name: &'static str, value: f64) -> Result<()> {
        match *self {
            Constraint::Range { min, max } => {
                if value < min || value > max {
                    return Err(Error::OutOfRange { name, value, min, max });
                }
                Ok(())
            }
            // integer-valued parameters (channel numbers) may be table-driven
            // by an enumerated set of decimal strings
            Constraint::OneOf(_) => {
                let text = if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", value as i64)
                } else {
                    format!("{}", value)
                };
                self.check_choice(name, &text)
            }
        }
    }

    pub fn check_choice(&self, name: &'static str, value: &str) -> Result<()> {
        match *self {
            Constraint::OneOf(allowed) => {
                if allowed.iter().any(|&choice| choice.eq_ignore_ascii_case(value)) {
                    Ok(())
                } else {
                    Err(Error::NotInAllowedSet { name, value: value.to_owned() })
                }
            }
            Constraint::Range { .. } => {
                match value.parse::<f64>() {
                    Ok(parsed) => self.check_value(name, parsed),
                    Err(_) => Err(Error::NotInAllowedSet { name, value: value.to_owned() }),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coupling {
    #[default]
    DC,
    AC,
}

impl Coupling {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::DC => "DC",
            Self::AC => "AC",
        }
    }
}

/// Scope input termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Impedance {
    #[default]
    OneMeg,
    Fifty,
}

impl Impedance {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::OneMeg => "ONEMeg",
            Self::Fifty => "FIFTy",
        }
    }
}

/// Generator output source impedance (the 81150A offers two settings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceImpedance {
    Ohm5,
    #[default]
    Ohm50,
}

impl SourceImpedance {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Ohm5 => "5",
            Self::Ohm50 => "50",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimebaseMode {
    #[default]
    Main,
    Window,
    Xy,
    Roll,
}

impl TimebaseMode {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Window => "WINDow",
            Self::Xy => "XY",
            Self::Roll => "ROLL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimebaseReference {
    Left,
    #[default]
    Center,
    Right,
}

impl TimebaseReference {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Center => "CENTer",
            Self::Right => "RIGHt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerSource {
    Channel1,
    Channel2,
    Channel3,
    Channel4,
    #[default]
    External,
    Line,
}

impl TriggerSource {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Channel1 => "CHANnel1",
            Self::Channel2 => "CHANnel2",
            Self::Channel3 => "CHANnel3",
            Self::Channel4 => "CHANnel4",
            Self::External => "EXTernal",
            Self::Line => "LINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerSweep {
    Auto,
    #[default]
    Normal,
}

impl TriggerSweep {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Normal => "NORMal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slope {
    #[default]
    Positive,
    Negative,
    Either,
    Alternate,
}

impl Slope {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Positive => "POSitive",
            Self::Negative => "NEGative",
            Self::Either => "EITHer",
            Self::Alternate => "ALTernate",
        }
    }
}

/// Arming source for the generator's trigger subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwgTriggerSource {
    #[default]
    Immediate,
    External,
    Manual,
}

impl AwgTriggerSource {
    pub fn scpi(self) -> &'static str {
        match self {
            Self::Immediate => "IMM",
            Self::External => "EXT",
            Self::Manual => "MAN",
        }
    }
}

/// Horizontal axis setup. `range` and `scale` are alternatives; only the
/// values present are sent to the instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimebaseConfig {
    pub mode: TimebaseMode,
    pub reference: TimebaseReference,
    /// Full horizontal range in seconds (ten divisions).
    pub range: Option<f64>,
    /// Seconds per division.
    pub scale: Option<f64>,
    /// Horizontal delay in seconds.
    pub position: f64,
    pub vernier: bool,
}

impl Default for TimebaseConfig {
    fn default() -> Self {
        TimebaseConfig {
            mode: Default::default(),
            reference: Default::default(),
            range: None,
            scale: Some(1e-3),
            position: 0.0,
            vernier: false,
        }
    }
}

/// Vertical axis setup for one scope channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    /// Volts per division.
    pub scale: f64,
    /// Vertical offset in volts.
    pub offset: f64,
    pub coupling: Coupling,
    pub impedance: Impedance,
    /// Probe attenuation ratio. For a 1X probe, `1.0`; for a 10X probe, `10.0`.
    pub probe_attenuation: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            scale: 0.01,
            offset: 0.0,
            coupling: Default::default(),
            impedance: Default::default(),
            probe_attenuation: 1.0,
        }
    }
}

/// Limit table for one oscilloscope model. Owned by the instrument instance
/// and never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeLimits {
    pub channel: Constraint,
    /// Full vertical range, volts.
    pub voltage_range: Constraint,
    /// Volts per division.
    pub voltage_scale: Constraint,
    /// Full horizontal range, seconds.
    pub time_range: Constraint,
    /// Seconds per division.
    pub time_scale: Constraint,
    pub timebase_mode: Constraint,
}

impl ScopeLimits {
    pub fn dsox3024a() -> ScopeLimits {
        ScopeLimits {
            channel: Constraint::OneOf(&["1", "2", "3", "4"]),
            voltage_range: Constraint::Range { min: 8e-3, max: 40.0 },
            voltage_scale: Constraint::Range { min: 8e-4, max: 4.0 },
            time_range: Constraint::Range { min: 2e-8, max: 500.0 },
            time_scale: Constraint::Range { min: 2e-9, max: 50.0 },
            timebase_mode: Constraint::OneOf(&["MAIN", "WINDow", "WIND", "XY", "ROLL"]),
        }
    }
}

/// Limit table for one generator model.
#[derive(Debug, Clone, PartialEq)]
pub struct AwgLimits {
    pub channel: Constraint,
    /// Peak-to-peak output amplitude, volts.
    pub amplitude: Constraint,
    /// Repetition rate for arbitrary waveforms, Hz.
    pub frequency: Constraint,
    /// External load impedance, ohms.
    pub load_impedance: Constraint,
    /// Full-scale DAC code; uploaded tables span `[-full_scale_code, full_scale_code]`.
    pub full_scale_code: f64,
    /// Time per arbitrary-waveform sample, seconds. Pulse edges synthesized
    /// from breakpoints are one sample wide.
    pub arb_resolution: f64,
    /// Capacity of the arbitrary-waveform memory, samples.
    pub max_arb_samples: usize,
}

impl AwgLimits {
    pub fn keysight81150a() -> AwgLimits {
        AwgLimits {
            channel: Constraint::OneOf(&["1", "2"]),
            amplitude: Constraint::Range { min: 8e-3, max: 40.0 },
            frequency: Constraint::Range { min: 1e-6, max: 120e6 },
            load_impedance: Constraint::Range { min: 0.3, max: 1e6 },
            full_scale_code: 8191.0,
            arb_resolution: 1e-7,
            max_arb_samples: 524288,
        }
    }
}
