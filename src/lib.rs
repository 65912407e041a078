mod transport;
mod config;
mod decode;
mod synth;
mod scope;
mod awg;
mod session;
mod recipe;
mod export;

#[derive(Debug)]
pub enum Error {
    MalformedPreamble(String),
    UnsupportedSampleFormat(i64),
    InvalidBreakpoints(&'static str),
    DegenerateRange,
    OutOfRange { name: &'static str, value: f64, min: f64, max: f64 },
    NotInAllowedSet { name: &'static str, value: String },
    Transport(Box<dyn std::error::Error + Sync + Send + 'static>),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MalformedPreamble(detail) =>
                write!(f, "malformed waveform preamble: {}", detail),
            Self::UnsupportedSampleFormat(code) =>
                write!(f, "unsupported sample format code {}", code),
            Self::InvalidBreakpoints(detail) =>
                write!(f, "invalid breakpoint sequence: {}", detail),
            Self::DegenerateRange =>
                write!(f, "all samples are equal, cannot normalize to device codes"),
            Self::OutOfRange { name, value, min, max } =>
                write!(f, "{} = {} is outside the allowed range [{}, {}]", name, value, min, max),
            Self::NotInAllowedSet { name, value } =>
                write!(f, "{} = {:?} is not in the allowed set", name, value),
            Self::Transport(error) =>
                write!(f, "transport error: {}", error),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Transport(ref error) => Some(error.as_ref()),
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use transport::{
    Transport,
    EventStatus,
};

pub use config::{
    Constraint,
    Coupling,
    Impedance,
    SourceImpedance,
    TimebaseMode,
    TimebaseReference,
    TriggerSource,
    TriggerSweep,
    Slope,
    AwgTriggerSource,
    TimebaseConfig,
    ChannelConfig,
    ScopeLimits,
    AwgLimits,
};

pub use decode::{
    SampleFormat,
    AcquisitionType,
    ByteOrder,
    Signedness,
    Preamble,
    RawSamples,
    Trace,
    decode,
    decode_with,
};

pub use synth::{
    densify,
    scale_to_device_codes,
};

pub use scope::{
    ScopeControl,
    Dsox3024a,
};

pub use awg::{
    GeneratorControl,
    StoredArb,
    Keysight81150a,
};

pub use session::{
    Shape,
    Stimulus,
    Measurement,
    AcquisitionSession,
};

pub use recipe::{
    HysteresisLoop,
    PundPulse,
};

pub use export::write_table;
