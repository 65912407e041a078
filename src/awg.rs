//! Control surface for the Keysight 81150A arbitrary waveform generator.

use crate::config::{AwgLimits, AwgTriggerSource, SourceImpedance};
use crate::transport::{response_parse_error, EventStatus, Transport};
use crate::{Error, Result};

/// Where an uploaded arbitrary-waveform table ended up on the generator.
///
/// Non-volatile slots are a finite resource; when none is free the table
/// stays in volatile memory and playback still works, it just does not
/// survive a power cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredArb {
    Volatile,
    Named(String),
}

impl StoredArb {
    /// Waveform source name to select for playback.
    pub fn scpi_source(&self) -> &str {
        match self {
            Self::Volatile => "VOLATILE",
            Self::Named(name) => name,
        }
    }
}

/// Operations the acquisition pipeline needs from a waveform generator.
pub trait GeneratorControl {
    fn identify(&mut self) -> Result<String>;

    /// Reset to default state and clear the status registers.
    fn initialize(&mut self) -> Result<()>;

    /// Slave channel 2 to channel 1 so both outputs carry the stimulus.
    fn couple_channels(&mut self) -> Result<()>;

    fn configure_impedance(&mut self, channel: u8, source: SourceImpedance,
                           load_ohms: f64) -> Result<()>;

    fn configure_trigger(&mut self, channel: u8, source: AwgTriggerSource) -> Result<()>;

    /// Upload a table of DAC codes as the volatile arbitrary waveform, then
    /// try to copy it to the non-volatile slot `name`. Running out of slots
    /// is not an error; the returned value records where the table lives.
    fn upload_arb(&mut self, codes: &[f64], name: &str) -> Result<StoredArb>;

    /// Select an uploaded table for playback on `channel` and program its
    /// amplitude (peak-to-peak), offset and repetition rate.
    fn configure_arb(&mut self, channel: u8, arb: &StoredArb, gain: f64, offset: f64,
                     frequency: f64) -> Result<()>;

    fn enable_output(&mut self, channel: u8, enabled: bool) -> Result<()>;

    fn send_software_trigger(&mut self) -> Result<()>;

    /// Full-scale DAC code expected by [`upload_arb`].
    fn full_scale_code(&self) -> f64;
}

#[derive(Debug)]
pub struct Keysight81150a<T: Transport> {
    link: T,
    limits: AwgLimits,
}

impl<T: Transport> Keysight81150a<T> {
    pub fn new(link: T) -> Keysight81150a<T> {
        Keysight81150a { link, limits: AwgLimits::keysight81150a() }
    }

    pub fn limits(&self) -> &AwgLimits {
        &self.limits
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    pub fn event_status(&mut self) -> Result<EventStatus> {
        EventStatus::read(&mut self.link)
    }

    fn free_nonvolatile_slots(&mut self) -> Result<i64> {
        let response = self.link.query(":DATA:NVOLatile:FREE?")?;
        response.trim().parse::<i64>()
            .map_err(|_| response_parse_error(":DATA:NVOLatile:FREE?", &response))
    }
}

impl<T: Transport> GeneratorControl for Keysight81150a<T> {
    fn identify(&mut self) -> Result<String> {
        self.link.query("*IDN?")
    }

    fn initialize(&mut self) -> Result<()> {
        log::debug!("initialize()");
        self.link.write("*RST")?;
        self.link.write("*CLS")?;
        Ok(())
    }

    fn couple_channels(&mut self) -> Result<()> {
        log::debug!("couple_channels()");
        self.link.write(":TRACk:CHANnel1 ON")
    }

    fn configure_impedance(&mut self, channel: u8, source: SourceImpedance,
                           load_ohms: f64) -> Result<()> {
        log::debug!("configure_impedance({}, {:?}, {})", channel, source, load_ohms);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.limits.load_impedance.check_value("load impedance", load_ohms)?;
        self.link.write(&format!(":OUTPut{}:IMPedance {}", channel, source.scpi()))?;
        self.link.write(&format!(":OUTPut{}:IMPedance:EXTernal {}", channel, load_ohms))?;
        Ok(())
    }

    fn configure_trigger(&mut self, channel: u8, source: AwgTriggerSource) -> Result<()> {
        log::debug!("configure_trigger({}, {:?})", channel, source);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.link.write(&format!(":ARM:SOURce{} {}", channel, source.scpi()))
    }

    fn upload_arb(&mut self, codes: &[f64], name: &str) -> Result<StoredArb> {
        log::debug!("upload_arb({} codes, {:?})", codes.len(), name);
        if codes.is_empty() || codes.len() > self.limits.max_arb_samples {
            return Err(Error::OutOfRange {
                name: "arb table length",
                value: codes.len() as f64,
                min: 1.0,
                max: self.limits.max_arb_samples as f64,
            });
        }
        let full_scale = self.limits.full_scale_code;
        for &code in codes {
            if !(code >= -full_scale && code <= full_scale) {
                return Err(Error::OutOfRange {
                    name: "arb DAC code",
                    value: code,
                    min: -full_scale,
                    max: full_scale,
                });
            }
        }
        let table = codes.iter()
            .map(|code| format!("{}", code.round() as i64))
            .collect::<Vec<_>>()
            .join(", ");
        self.link.write(&format!(":DATA:DAC VOLATILE, {}", table))?;
        if self.free_nonvolatile_slots()? > 0 {
            self.link.write(&format!(":DATA:COPY {}, VOLATILE", name))?;
            Ok(StoredArb::Named(name.to_owned()))
        } else {
            log::warn!("no free non-volatile slot, {:?} stays in volatile memory", name);
            Ok(StoredArb::Volatile)
        }
    }

    fn configure_arb(&mut self, channel: u8, arb: &StoredArb, gain: f64, offset: f64,
                     frequency: f64) -> Result<()> {
        log::debug!("configure_arb({}, {:?}, {}, {}, {})",
                    channel, arb, gain, offset, frequency);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.limits.amplitude.check_value("amplitude", gain)?;
        self.limits.frequency.check_value("frequency", frequency)?;
        self.link.write(&format!(":FUNCtion{}:USER {}", channel, arb.scpi_source()))?;
        self.link.write(&format!(":FUNCtion{} USER", channel))?;
        self.link.write(&format!(":VOLTage{} {}", channel, gain))?;
        self.link.write(&format!(":VOLTage{}:OFFSet {}", channel, offset))?;
        self.link.write(&format!(":FREQuency{} {}", channel, frequency))?;
        Ok(())
    }

    fn enable_output(&mut self, channel: u8, enabled: bool) -> Result<()> {
        log::debug!("enable_output({}, {})", channel, enabled);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.link.write(&format!(":OUTPut{} {}", channel, if enabled { "ON" } else { "OFF" }))
    }

    fn send_software_trigger(&mut self) -> Result<()> {
        log::debug!("send_software_trigger()");
        self.link.write("*TRG")
    }

    fn full_scale_code(&self) -> f64 {
        self.limits.full_scale_code
    }
}
