//! Orchestration of one stimulus-and-capture cycle.

use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use crate::awg::GeneratorControl;
use crate::config::{
    AwgTriggerSource, ChannelConfig, Coupling, Impedance, Slope, SourceImpedance,
    TimebaseConfig, TimebaseMode, TimebaseReference, TriggerSource, TriggerSweep,
};
use crate::decode::{self, SampleFormat, Trace};
use crate::scope::ScopeControl;
use crate::synth;
use crate::Result;

/// Sample table of a stimulus, either given directly or synthesized from
/// breakpoints at acquisition time.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// One value per table entry, in arbitrary units.
    Samples(Vec<f64>),
    /// Sparse breakpoints to densify onto `total_points` entries.
    Breakpoints { points: Vec<(f64, f64)>, total_points: usize },
}

/// Everything the session needs to know about one stimulus waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    /// Waveform type tag carried through to the exported data.
    pub label: String,
    /// Arb slot name requested on the generator.
    pub name: String,
    pub shape: Shape,
    /// Nominal duration of one stimulus period, seconds.
    pub duration: f64,
    /// Peak-to-peak amplitude programmed on the generator, volts.
    pub gain: f64,
    /// Output offset, volts.
    pub offset: f64,
    /// Repetition rate, Hz.
    pub frequency: f64,
    /// Generator output channel.
    pub channel: u8,
}

/// A decoded capture plus the context needed to export it.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub label: String,
    /// Nominal stimulus duration, seconds.
    pub duration: f64,
    pub trace: Trace,
}

impl Measurement {
    /// Write the trace as delimited text. See [`crate::write_table`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::export::write_table(self, path)
    }
}

/// Drives a generator/oscilloscope pair through a complete stimulus-and-
/// capture cycle. The session owns both instrument handles for its whole
/// lifetime; a failure at any step aborts the cycle with the originating
/// error and no partial trace. Nothing is retried.
#[derive(Debug)]
pub struct AcquisitionSession<'a, G: GeneratorControl, S: ScopeControl> {
    generator: &'a mut G,
    scope: &'a mut S,
    /// Fixed wait between the software trigger and the fetch.
    pub settle: Duration,
    /// Scope channel the response is captured on.
    pub scope_channel: u8,
    /// Scope vertical scale, volts per division.
    pub voltage_scale: f64,
}

impl<'a, G: GeneratorControl, S: ScopeControl> AcquisitionSession<'a, G, S> {
    pub fn new(generator: &'a mut G, scope: &'a mut S) -> AcquisitionSession<'a, G, S> {
        AcquisitionSession {
            generator,
            scope,
            settle: Duration::from_millis(200),
            scope_channel: 1,
            voltage_scale: 0.01,
        }
    }

    /// Run one full cycle and return the decoded capture.
    pub fn run(&mut self, stimulus: &Stimulus) -> Result<Measurement> {
        log::info!("acquiring {} waveform, {} s nominal", stimulus.label, stimulus.duration);

        // reset both instruments before programming anything
        self.generator.initialize()?;
        self.scope.initialize()?;

        // synthesize the stimulus table and bring it to DAC range
        let table = match &stimulus.shape {
            Shape::Samples(samples) => samples.clone(),
            Shape::Breakpoints { points, total_points } =>
                synth::densify(points, *total_points)?,
        };
        let codes = synth::scale_to_device_codes(&table, self.generator.full_scale_code())?;

        // program the generator: coupling, impedance, manual arming, table,
        // playback parameters, output on
        self.generator.couple_channels()?;
        self.generator.configure_impedance(stimulus.channel, SourceImpedance::Ohm50, 50.0)?;
        self.generator.configure_trigger(stimulus.channel, AwgTriggerSource::Manual)?;
        let stored = self.generator.upload_arb(&codes, &stimulus.name)?;
        self.generator.configure_arb(stimulus.channel, &stored, stimulus.gain,
                                     stimulus.offset, stimulus.frequency)?;
        self.generator.enable_output(stimulus.channel, true)?;

        // window the scope around the stimulus; the position offset keeps
        // the whole pulse train inside the capture window
        self.scope.configure_timebase(&TimebaseConfig {
            mode: TimebaseMode::Main,
            reference: TimebaseReference::Center,
            range: None,
            scale: Some(stimulus.duration),
            position: 5.0 * stimulus.duration,
            vernier: false,
        })?;
        self.scope.configure_channel(self.scope_channel, &ChannelConfig {
            scale: self.voltage_scale,
            offset: 0.0,
            coupling: Coupling::DC,
            impedance: Impedance::Fifty,
            probe_attenuation: 1.0,
        })?;
        self.scope.configure_trigger_characteristics(
            TriggerSource::External, 0.75, 0.95, TriggerSweep::Normal)?;
        self.scope.configure_trigger_edge(
            TriggerSource::External, Coupling::DC, Slope::Positive)?;

        // arm, fire, and give the capture time to complete
        self.scope.initiate()?;
        self.generator.send_software_trigger()?;
        sleep(self.settle);

        let preamble = self.scope.read_preamble()?;
        let raw = self.scope.read_waveform_data(self.scope_channel, SampleFormat::Byte)?;
        let (order, signedness) = self.scope.transfer_encoding();
        let trace = decode::decode(&preamble, raw, order, signedness)?;
        log::info!("captured {} samples as {:?}", trace.len(), stored);

        Ok(Measurement {
            label: stimulus.label.clone(),
            duration: stimulus.duration,
            trace,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::awg::Keysight81150a;
    use crate::scope::Dsox3024a;
    use crate::transport::replay::ReplayTransport;
    use crate::Error;

    fn test_stimulus() -> Stimulus {
        Stimulus {
            label: "HYSTERESIS".to_owned(),
            name: "PV".to_owned(),
            shape: Shape::Samples(vec![0.0, 1.0, 0.0, -1.0, 0.0]),
            duration: 1e-3,
            gain: 2.0,
            offset: 0.0,
            frequency: 1000.0,
            channel: 1,
        }
    }

    #[test]
    fn test_full_cycle() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut generator_link = ReplayTransport::new();
        generator_link.replies.push_back("4"); // :DATA:NVOLatile:FREE?
        let mut generator = Keysight81150a::new(generator_link);
        let mut scope_link = ReplayTransport::new();
        scope_link.replies.push_back("0,0,4,1,1e-6,0,0,1.0,0.0,0");
        scope_link.binary_replies.push_back(vec![0, 1, 2, 3]);
        let mut scope = Dsox3024a::new(scope_link);

        let mut session = AcquisitionSession::new(&mut generator, &mut scope);
        session.settle = Duration::ZERO;
        let measurement = session.run(&test_stimulus()).unwrap();

        assert_eq!(measurement.label, "HYSTERESIS");
        assert_eq!(measurement.duration, 1e-3);
        assert_eq!(measurement.trace.time, [0.0, 1e-6, 2e-6, 3e-6]);
        assert_eq!(measurement.trace.voltage, [0.0, 1.0, 2.0, 3.0]);

        // generator programming happens in protocol order and ends with the
        // software trigger
        let sent = &generator.link().sent;
        assert_eq!(sent[0], "*RST");
        assert_eq!(sent[1], "*CLS");
        assert_eq!(sent[2], ":TRACk:CHANnel1 ON");
        assert_eq!(sent[5], ":ARM:SOURce1 MAN");
        assert_eq!(sent[6], ":DATA:DAC VOLATILE, 0, 8191, 0, -8191, 0");
        assert_eq!(sent[8], ":DATA:COPY PV, VOLATILE");
        assert_eq!(sent.last().unwrap(), "*TRG");

        // the scope is armed before the trigger fires and read afterwards
        let sent = &scope.link().sent;
        let armed = sent.iter().position(|cmd| cmd == ":SINGle").unwrap();
        let fetched = sent.iter().position(|cmd| cmd == ":WAVeform:PREamble?").unwrap();
        assert!(armed < fetched);
        assert_eq!(sent[2], ":ACQuire:TYPE NORMal");
        assert!(sent.contains(&":TIMebase:SCALe 0.001".to_owned()));
        assert!(sent.contains(&":CHANnel1:SCALe 0.01".to_owned()));
    }

    #[test]
    fn test_aborts_on_scope_failure() {
        let mut generator_link = ReplayTransport::new();
        generator_link.replies.push_back("4");
        let mut generator = Keysight81150a::new(generator_link);
        let mut scope_link = ReplayTransport::new();
        scope_link.fail_on = Some(":TIMebase");
        let mut scope = Dsox3024a::new(scope_link);

        let mut session = AcquisitionSession::new(&mut generator, &mut scope);
        session.settle = Duration::ZERO;
        let result = session.run(&test_stimulus());

        assert!(matches!(result, Err(Error::Transport(_))));
        // the cycle stops dead: the scope is never armed and nothing fires
        assert!(!scope.link().sent.iter().any(|cmd| cmd == ":SINGle"));
        assert!(!generator.link().sent.iter().any(|cmd| cmd == "*TRG"));
    }

    #[test]
    fn test_aborts_on_degenerate_stimulus() {
        let mut generator = Keysight81150a::new(ReplayTransport::new());
        let mut scope = Dsox3024a::new(ReplayTransport::new());

        let mut session = AcquisitionSession::new(&mut generator, &mut scope);
        session.settle = Duration::ZERO;
        let mut stimulus = test_stimulus();
        stimulus.shape = Shape::Samples(vec![1.0, 1.0, 1.0]);
        let result = session.run(&stimulus);

        assert!(matches!(result, Err(Error::DegenerateRange)));
        // scaling failed before any generator programming beyond the reset
        assert_eq!(generator.link().sent, ["*RST", "*CLS"]);
    }
}
