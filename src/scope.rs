//! Control surface for the Keysight DSOX3024A oscilloscope.

use crate::config::{
    ChannelConfig, Coupling, ScopeLimits, Slope, TimebaseConfig, TriggerSource, TriggerSweep,
};
use crate::decode::{ByteOrder, RawSamples, SampleFormat, Signedness};
use crate::transport::{EventStatus, Transport};
use crate::Result;

/// Operations the acquisition pipeline needs from an oscilloscope.
pub trait ScopeControl {
    fn identify(&mut self) -> Result<String>;

    /// Reset to default state and clear the status registers.
    fn initialize(&mut self) -> Result<()>;

    fn configure_timebase(&mut self, timebase: &TimebaseConfig) -> Result<()>;

    fn configure_channel(&mut self, channel: u8, config: &ChannelConfig) -> Result<()>;

    fn configure_trigger_characteristics(&mut self, source: TriggerSource, low_level: f64,
                                         high_level: f64, sweep: TriggerSweep) -> Result<()>;

    fn configure_trigger_edge(&mut self, source: TriggerSource, coupling: Coupling,
                              slope: Slope) -> Result<()>;

    /// Arm a single acquisition; the scope captures on the next trigger.
    fn initiate(&mut self) -> Result<()>;

    /// Fetch the raw `:WAVeform:PREamble?` record for the armed source.
    fn read_preamble(&mut self) -> Result<String>;

    /// Fetch the raw sample buffer for `channel` in the given transfer format.
    fn read_waveform_data(&mut self, channel: u8, format: SampleFormat) -> Result<RawSamples>;

    /// How this scope was told to encode binary transfers.
    fn transfer_encoding(&self) -> (ByteOrder, Signedness);
}

#[derive(Debug)]
pub struct Dsox3024a<T: Transport> {
    link: T,
    limits: ScopeLimits,
    byte_order: ByteOrder,
    signedness: Signedness,
}

impl<T: Transport> Dsox3024a<T> {
    pub fn new(link: T) -> Dsox3024a<T> {
        Dsox3024a {
            link,
            limits: ScopeLimits::dsox3024a(),
            byte_order: ByteOrder::MsbFirst,
            signedness: Signedness::Signed,
        }
    }

    pub fn limits(&self) -> &ScopeLimits {
        &self.limits
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    /// Let the scope pick its own vertical and horizontal settings.
    pub fn autoscale(&mut self) -> Result<()> {
        log::debug!("autoscale()");
        self.link.write(":AUToscale")
    }

    pub fn event_status(&mut self) -> Result<EventStatus> {
        EventStatus::read(&mut self.link)
    }
}

impl<T: Transport> ScopeControl for Dsox3024a<T> {
    fn identify(&mut self) -> Result<String> {
        self.link.query("*IDN?")
    }

    fn initialize(&mut self) -> Result<()> {
        log::debug!("initialize()");
        self.link.write("*RST")?;
        self.link.write("*CLS")?;
        self.link.write(":ACQuire:TYPE NORMal")?;
        Ok(())
    }

    fn configure_timebase(&mut self, timebase: &TimebaseConfig) -> Result<()> {
        log::debug!("configure_timebase({:?})", timebase);
        self.limits.timebase_mode.check_choice("timebase mode", timebase.mode.scpi())?;
        if let Some(range) = timebase.range {
            self.limits.time_range.check_value("timebase range", range)?;
        }
        if let Some(scale) = timebase.scale {
            self.limits.time_scale.check_value("timebase scale", scale)?;
        }
        self.link.write(&format!(":TIMebase:MODE {}", timebase.mode.scpi()))?;
        self.link.write(&format!(":TIMebase:POSition {}", timebase.position))?;
        if let Some(range) = timebase.range {
            self.link.write(&format!(":TIMebase:RANGe {}", range))?;
        }
        self.link.write(&format!(":TIMebase:REFerence {}", timebase.reference.scpi()))?;
        if let Some(scale) = timebase.scale {
            self.link.write(&format!(":TIMebase:SCALe {}", scale))?;
        }
        self.link.write(if timebase.vernier { ":TIMebase:VERNier ON" }
                        else { ":TIMebase:VERNier OFF" })?;
        Ok(())
    }

    fn configure_channel(&mut self, channel: u8, config: &ChannelConfig) -> Result<()> {
        log::debug!("configure_channel({}, {:?})", channel, config);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.limits.voltage_scale.check_value("channel scale", config.scale)?;
        self.link.write(&format!(":CHANnel{}:SCALe {}", channel, config.scale))?;
        self.link.write(&format!(":CHANnel{}:OFFSet {}", channel, config.offset))?;
        self.link.write(&format!(":CHANnel{}:COUPling {}", channel, config.coupling.scpi()))?;
        self.link.write(&format!(":CHANnel{}:PROBe {}", channel, config.probe_attenuation))?;
        self.link.write(&format!(":CHANnel{}:IMPedance {}", channel, config.impedance.scpi()))?;
        Ok(())
    }

    fn configure_trigger_characteristics(&mut self, source: TriggerSource, low_level: f64,
                                         high_level: f64, sweep: TriggerSweep) -> Result<()> {
        log::debug!("configure_trigger_characteristics({:?}, {}, {}, {:?})",
                    source, low_level, high_level, sweep);
        self.link.write(&format!(":TRIGger:SWEep {}", sweep.scpi()))?;
        self.link.write(&format!(":TRIGger:LEVel:HIGH {},{}", high_level, source.scpi()))?;
        self.link.write(&format!(":TRIGger:LEVel:LOW {},{}", low_level, source.scpi()))?;
        Ok(())
    }

    fn configure_trigger_edge(&mut self, source: TriggerSource, coupling: Coupling,
                              slope: Slope) -> Result<()> {
        log::debug!("configure_trigger_edge({:?}, {:?}, {:?})", source, coupling, slope);
        self.link.write(":TRIGger:MODE EDGE")?;
        self.link.write(&format!(":TRIGger:EDGE:SOURce {}", source.scpi()))?;
        self.link.write(&format!(":TRIGger:EDGE:COUPling {}", coupling.scpi()))?;
        self.link.write(&format!(":TRIGger:EDGE:SLOPe {}", slope.scpi()))?;
        Ok(())
    }

    fn initiate(&mut self) -> Result<()> {
        log::debug!("initiate()");
        self.link.write(":SINGle")
    }

    fn read_preamble(&mut self) -> Result<String> {
        self.link.query(":WAVeform:PREamble?")
    }

    fn read_waveform_data(&mut self, channel: u8, format: SampleFormat) -> Result<RawSamples> {
        log::debug!("read_waveform_data({}, {:?})", channel, format);
        self.limits.channel.check_value("channel", channel as f64)?;
        self.link.write(&format!(":WAVeform:SOURce CHANnel{}", channel))?;
        self.link.write(&format!(":WAVeform:FORMat {}", format.scpi()))?;
        match format {
            SampleFormat::Byte | SampleFormat::Word => {
                self.link.write(&format!(":WAVeform:BYTeorder {}", match self.byte_order {
                    ByteOrder::MsbFirst => "MSBFirst",
                    ByteOrder::LsbFirst => "LSBFirst",
                }))?;
                self.link.write(&format!(":WAVeform:UNSigned {}", match self.signedness {
                    Signedness::Signed => "0",
                    Signedness::Unsigned => "1",
                }))?;
                let payload = self.link.query_binary(":WAVeform:DATA?")?;
                log::trace!("waveform data: {} bytes", payload.len());
                Ok(RawSamples::Binary(payload))
            }
            SampleFormat::Ascii => {
                let values = self.link.query_ascii(":WAVeform:DATA?")?;
                log::trace!("waveform data: {} values", values.len());
                Ok(RawSamples::Ascii(values))
            }
        }
    }

    fn transfer_encoding(&self) -> (ByteOrder, Signedness) {
        (self.byte_order, self.signedness)
    }
}
