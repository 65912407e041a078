//! Measurement recipes: each one describes a stimulus waveform and hands the
//! session a ready-to-run [`Stimulus`].

use crate::config::AwgLimits;
use crate::session::{Shape, Stimulus};
use crate::{Error, Result};

/// Bipolar triangle sweep for polarization-voltage loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisLoop {
    /// Sweep frequency, Hz.
    pub frequency: f64,
    /// Peak amplitude, volts.
    pub amplitude: f64,
    /// Output offset, volts.
    pub offset: f64,
    pub n_cycles: usize,
    /// Generator output channel.
    pub channel: u8,
}

impl Default for HysteresisLoop {
    fn default() -> Self {
        HysteresisLoop {
            frequency: 1000.0,
            amplitude: 1.0,
            offset: 0.0,
            n_cycles: 2,
            channel: 1,
        }
    }
}

impl HysteresisLoop {
    /// One triangle period is zero, +peak, zero, -peak, zero; later cycles
    /// reuse the shared zero crossing. The generator interpolates between
    /// table entries, so five points per cycle suffice.
    pub fn stimulus(&self) -> Stimulus {
        let mut samples = vec![0.0, 1.0, 0.0, -1.0, 0.0];
        for _ in 1..self.n_cycles {
            samples.extend_from_slice(&[1.0, 0.0, -1.0, 0.0]);
        }
        Stimulus {
            label: "HYSTERESIS".to_owned(),
            name: "PV".to_owned(),
            shape: Shape::Samples(samples),
            duration: 1.0 / self.frequency,
            gain: 2.0 * self.amplitude,
            offset: self.offset,
            frequency: self.frequency,
            channel: self.channel,
        }
    }
}

/// Positive-Up-Negative-Down pulse train for switching-charge measurements:
/// one reset pulse of the opposite polarity, then two identical pulses
/// separated by delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PundPulse {
    /// Reset pulse amplitude, volts. Its polarity is opposite to P and U.
    pub reset_amp: f64,
    /// Reset pulse width, seconds.
    pub reset_width: f64,
    /// Delay between the reset pulse and the P pulse, seconds.
    pub reset_delay: f64,
    /// P and U pulse amplitude, volts.
    pub p_u_amp: f64,
    /// P and U pulse width, seconds.
    pub p_u_width: f64,
    /// Delay after each of the P and U pulses, seconds.
    pub p_u_delay: f64,
    /// Output offset, volts.
    pub offset: f64,
    /// Generator output channel.
    pub channel: u8,
}

impl Default for PundPulse {
    fn default() -> Self {
        PundPulse {
            reset_amp: 1.0,
            reset_width: 1e-3,
            reset_delay: 1e-3,
            p_u_amp: 1.0,
            p_u_width: 1e-3,
            p_u_delay: 1e-3,
            offset: 0.0,
            channel: 1,
        }
    }
}

impl PundPulse {
    fn segments(&self) -> Result<[(f64, f64); 6]> {
        if self.reset_amp == 0.0 || self.p_u_amp == 0.0 {
            return Err(Error::InvalidBreakpoints("pulse amplitudes must be non-zero"));
        }
        // pulse levels are expressed as full-amplitude fractions; the table
        // is renormalized against its own extremes during scaling
        let amplitude = self.reset_amp + self.p_u_amp;
        let frac_reset = amplitude / self.reset_amp;
        let frac_p_u = amplitude / self.p_u_amp;
        let polarity = if self.p_u_amp < 0.0 { -1.0 } else { 1.0 };
        Ok([
            (-frac_reset * polarity, self.reset_width),
            (0.0, self.reset_delay),
            (frac_p_u * polarity, self.p_u_width),
            (0.0, self.p_u_delay),
            (frac_p_u * polarity, self.p_u_width),
            (0.0, self.p_u_delay),
        ])
    }

    /// Breakpoint sequence for the pulse train. Level changes between
    /// segments become ramps of `edge_time` seconds, which densification
    /// turns into single-sample rise and fall edges.
    pub fn breakpoints(&self, edge_time: f64) -> Result<Vec<(f64, f64)>> {
        let segments = self.segments()?;
        let mut points = Vec::with_capacity(2 * segments.len());
        let mut elapsed = 0.0;
        points.push((0.0, segments[0].0));
        for (i, &(level, width)) in segments.iter().enumerate() {
            elapsed += width;
            points.push((elapsed, level));
            if let Some(&(next_level, _)) = segments.get(i + 1) {
                points.push((elapsed + edge_time, next_level));
            }
        }
        Ok(points)
    }

    /// Total pulse-train duration, seconds.
    pub fn duration(&self) -> f64 {
        self.reset_width + self.reset_delay
            + 2.0 * (self.p_u_width + self.p_u_delay)
    }

    /// Build the stimulus for a generator with the given limits. The table
    /// length is the train duration at the generator's arb resolution,
    /// capped by its waveform memory.
    pub fn stimulus(&self, limits: &AwgLimits) -> Result<Stimulus> {
        let duration = self.duration();
        let total_points = ((duration / limits.arb_resolution) as usize)
            .min(limits.max_arb_samples);
        Ok(Stimulus {
            label: "PUND".to_owned(),
            name: "PUND".to_owned(),
            shape: Shape::Breakpoints {
                points: self.breakpoints(limits.arb_resolution)?,
                total_points,
            },
            duration,
            gain: self.reset_amp + self.p_u_amp,
            offset: self.offset,
            frequency: 1.0 / duration,
            channel: self.channel,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::Shape;
    use crate::synth;

    #[test]
    fn test_hysteresis_two_cycles() {
        let stimulus = HysteresisLoop::default().stimulus();
        assert_eq!(stimulus.shape, Shape::Samples(
            vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0]));
        assert_eq!(stimulus.duration, 1e-3);
        assert_eq!(stimulus.gain, 2.0);
        assert_eq!(stimulus.frequency, 1000.0);
        assert_eq!(stimulus.label, "HYSTERESIS");
    }

    #[test]
    fn test_hysteresis_single_cycle() {
        let recipe = HysteresisLoop { n_cycles: 1, ..Default::default() };
        let stimulus = recipe.stimulus();
        assert_eq!(stimulus.shape, Shape::Samples(vec![0.0, 1.0, 0.0, -1.0, 0.0]));
    }

    #[test]
    fn test_pund_breakpoints_shape() {
        let points = PundPulse::default().breakpoints(1e-7).unwrap();
        assert_eq!(points.len(), 12);
        for pair in points.windows(2) {
            assert!(pair[1].0 > pair[0].0);
        }
        // reset pulse at twice full amplitude fraction, then the two
        // positive pulses
        assert_eq!(points[0], (0.0, -2.0));
        assert_eq!(points[1], (1e-3, -2.0));
        assert_eq!(points[2].1, 0.0);
        assert_eq!(points[4].1, 2.0);
        assert_eq!(points[8].1, 2.0);
        assert_eq!(points[11], (6e-3, 0.0));
    }

    #[test]
    fn test_pund_polarity_follows_p_u_sign() {
        let recipe = PundPulse { reset_amp: -1.0, p_u_amp: -1.0, ..Default::default() };
        let points = recipe.breakpoints(1e-7).unwrap();
        assert_eq!(points[0].1, 2.0);
        assert_eq!(points[4].1, -2.0);
    }

    #[test]
    fn test_pund_rejects_zero_amplitude() {
        let recipe = PundPulse { reset_amp: 0.0, ..Default::default() };
        assert!(matches!(
            recipe.breakpoints(1e-7),
            Err(Error::InvalidBreakpoints(_))));
    }

    #[test]
    fn test_pund_stimulus_sizes_to_resolution() {
        let limits = AwgLimits::keysight81150a();
        let stimulus = PundPulse::default().stimulus(&limits).unwrap();
        assert_eq!(stimulus.duration, 6e-3);
        assert_eq!(stimulus.frequency, 1.0 / 6e-3);
        match stimulus.shape {
            Shape::Breakpoints { total_points, .. } =>
                assert_eq!(total_points, 60000),
            other => panic!("expected breakpoints, got {:?}", other),
        }
    }

    #[test]
    fn test_pund_stimulus_densifies_cleanly() {
        let limits = AwgLimits::keysight81150a();
        let stimulus = PundPulse::default().stimulus(&limits).unwrap();
        let (points, total_points) = match &stimulus.shape {
            Shape::Breakpoints { points, total_points } => (points, *total_points),
            other => panic!("expected breakpoints, got {:?}", other),
        };
        let dense = synth::densify(points, total_points).unwrap();
        assert_eq!(dense.len(), total_points);
        let min = dense.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = dense.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, -2.0);
        assert_eq!(max, 2.0);
    }
}
