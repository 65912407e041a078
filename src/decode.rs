//! Decoding of oscilloscope waveform records.
//!
//! The scope answers `:WAVeform:PREamble?` with a ten-field description of
//! the capture and `:WAVeform:DATA?` with the raw sample buffer; [`decode`]
//! combines the two into a calibrated time/voltage trace. Everything here is
//! pure: the transport hands in the strings and bytes, nothing talks to
//! hardware.

use crate::{Error, Result};

/// Encoding of one raw sample in the waveform record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// One 8-bit integer per sample.
    Byte,
    /// One 16-bit integer per sample.
    Word,
    /// Samples transferred as ASCII floating point, decoded by the transport.
    Ascii,
}

impl SampleFormat {
    fn from_code(code: i64) -> Result<SampleFormat> {
        match code {
            0 => Ok(SampleFormat::Byte),
            1 => Ok(SampleFormat::Word),
            4 => Ok(SampleFormat::Ascii),
            _ => Err(Error::UnsupportedSampleFormat(code)),
        }
    }

    pub fn scpi(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Word => "WORD",
            Self::Ascii => "ASCii",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionType {
    Normal,
    PeakDetect,
    Average,
}

impl AcquisitionType {
    fn from_code(code: i64) -> Result<AcquisitionType> {
        match code {
            0 => Ok(AcquisitionType::Normal),
            1 => Ok(AcquisitionType::PeakDetect),
            2 => Ok(AcquisitionType::Average),
            _ => Err(Error::MalformedPreamble(
                format!("unknown acquisition type code {}", code))),
        }
    }
}

/// Byte order of multi-byte samples. Always stated explicitly by whoever
/// programmed the transfer; never inferred from the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Parsed `:WAVeform:PREamble?` record: format, type, points, count,
/// x increment, x origin, x reference, y increment, y origin, y reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Preamble {
    pub format: SampleFormat,
    pub acquisition: AcquisitionType,
    pub points: usize,
    pub count: u32,
    /// Seconds per sample.
    pub x_increment: f64,
    /// Time of the first sample, seconds.
    pub x_origin: f64,
    pub x_reference: i64,
    /// Volts per least-significant code.
    pub y_increment: f32,
    /// Voltage of code zero.
    pub y_origin: f32,
    pub y_reference: i64,
}

impl Preamble {
    pub fn parse(text: &str) -> Result<Preamble> {
        let fields: Vec<&str> = text.trim().split(',').collect();
        if fields.len() != 10 {
            return Err(Error::MalformedPreamble(
                format!("expected 10 fields, got {}", fields.len())));
        }
        let format = SampleFormat::from_code(int_field(fields[0], "format")?)?;
        let acquisition = AcquisitionType::from_code(int_field(fields[1], "type")?)?;
        let points = int_field(fields[2], "points")?;
        if points < 1 {
            return Err(Error::MalformedPreamble(
                format!("point count {} is not positive", points)));
        }
        let count = int_field(fields[3], "count")? as u32;
        let x_increment = float_field(fields[4], "x increment")?;
        if !(x_increment > 0.0) {
            return Err(Error::MalformedPreamble(
                format!("x increment {} is not positive", x_increment)));
        }
        let x_origin = float_field(fields[5], "x origin")?;
        let x_reference = int_field(fields[6], "x reference")?;
        let y_increment = float_field(fields[7], "y increment")? as f32;
        let y_origin = float_field(fields[8], "y origin")? as f32;
        let y_reference = int_field(fields[9], "y reference")?;
        Ok(Preamble {
            format,
            acquisition,
            points: points as usize,
            count,
            x_increment,
            x_origin,
            x_reference,
            y_increment,
            y_origin,
            y_reference,
        })
    }
}

fn int_field(field: &str, what: &str) -> Result<i64> {
    field.trim().parse::<i64>()
        .map_err(|_| Error::MalformedPreamble(format!("bad {} field {:?}", what, field)))
}

fn float_field(field: &str, what: &str) -> Result<f64> {
    field.trim().parse::<f64>()
        .map_err(|_| Error::MalformedPreamble(format!("bad {} field {:?}", what, field)))
}

/// Raw sample buffer as fetched from the instrument, not yet calibrated.
/// Owned by the acquisition that fetched it and consumed by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawSamples {
    /// Payload of a definite-length binary block, as transferred.
    Binary(Vec<u8>),
    /// Values the transport already parsed from an ASCII response.
    Ascii(Vec<f64>),
}

/// Calibrated capture: two equal-length arrays in seconds and volts.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Decode a raw waveform record into a calibrated trace.
///
/// `time[i] = i * x_increment + x_origin` and
/// `voltage[i] = sample[i] * y_increment + y_origin`, with the raw sample
/// width and signedness selected by the preamble's format field. The byte
/// order and signedness hints describe how the transfer was programmed; both
/// are ignored for ASCII records.
pub fn decode(preamble_text: &str, raw: RawSamples, order: ByteOrder,
              signedness: Signedness) -> Result<Trace> {
    let preamble = Preamble::parse(preamble_text)?;
    decode_with(&preamble, raw, order, signedness)
}

/// Like [`decode`], for callers that already parsed the preamble.
pub fn decode_with(preamble: &Preamble, raw: RawSamples, order: ByteOrder,
                   signedness: Signedness) -> Result<Trace> {
    let samples = raw_values(preamble, raw, order, signedness)?;
    let time = (0..preamble.points)
        .map(|i| i as f64 * preamble.x_increment + preamble.x_origin)
        .collect();
    let voltage = samples.iter()
        .map(|&sample| sample * preamble.y_increment as f64 + preamble.y_origin as f64)
        .collect();
    Ok(Trace { time, voltage })
}

fn raw_values(preamble: &Preamble, raw: RawSamples, order: ByteOrder,
              signedness: Signedness) -> Result<Vec<f64>> {
    match (preamble.format, raw) {
        (SampleFormat::Byte, RawSamples::Binary(bytes)) => {
            expect_points(bytes.len(), preamble.points, 1)?;
            Ok(match signedness {
                Signedness::Signed =>
                    bytemuck::cast_slice::<u8, i8>(&bytes).iter().map(|&v| v as f64).collect(),
                Signedness::Unsigned =>
                    bytes.iter().map(|&v| v as f64).collect(),
            })
        }
        (SampleFormat::Word, RawSamples::Binary(bytes)) => {
            expect_points(bytes.len(), preamble.points, 2)?;
            let mut values = Vec::with_capacity(preamble.points);
            for chunk in bytes.chunks_exact(2) {
                let pair = [chunk[0], chunk[1]];
                values.push(match (order, signedness) {
                    (ByteOrder::MsbFirst, Signedness::Signed) =>
                        i16::from_be_bytes(pair) as f64,
                    (ByteOrder::LsbFirst, Signedness::Signed) =>
                        i16::from_le_bytes(pair) as f64,
                    (ByteOrder::MsbFirst, Signedness::Unsigned) =>
                        u16::from_be_bytes(pair) as f64,
                    (ByteOrder::LsbFirst, Signedness::Unsigned) =>
                        u16::from_le_bytes(pair) as f64,
                });
            }
            Ok(values)
        }
        (SampleFormat::Ascii, RawSamples::Ascii(values)) => {
            expect_points(values.len(), preamble.points, 1)?;
            Ok(values)
        }
        (SampleFormat::Ascii, RawSamples::Binary(_)) =>
            Err(Error::MalformedPreamble(
                "ASCII record paired with a binary buffer".into())),
        (_, RawSamples::Ascii(_)) =>
            Err(Error::MalformedPreamble(
                "binary record paired with an ASCII buffer".into())),
    }
}

fn expect_points(actual: usize, points: usize, width: usize) -> Result<()> {
    if actual != points * width {
        return Err(Error::MalformedPreamble(
            format!("preamble names {} points but the buffer holds {}",
                    points, actual / width)));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const SIGNED_BYTE_PREAMBLE: &str = "0,0,4,1,1e-6,0,0,1.0,0.0,0";

    #[test]
    fn test_signed_byte_end_to_end() {
        let trace = decode(SIGNED_BYTE_PREAMBLE, RawSamples::Binary(vec![0, 1, 2, 3]),
                           ByteOrder::MsbFirst, Signedness::Signed).unwrap();
        assert_eq!(trace.time, [0.0, 1e-6, 2e-6, 3e-6]);
        assert_eq!(trace.voltage, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_scaling_law_is_exact() {
        let preamble = Preamble::parse("0,0,3,1,2.5e-7,-1e-3,0,0.5,-1.25,128").unwrap();
        let trace = decode_with(&preamble, RawSamples::Binary(vec![10, 20, 30]),
                                ByteOrder::LsbFirst, Signedness::Signed).unwrap();
        for i in 0..3 {
            assert_eq!(trace.time[i], i as f64 * 2.5e-7 + -1e-3);
            let raw = [10.0, 20.0, 30.0][i];
            assert_eq!(trace.voltage[i], raw * 0.5f32 as f64 + (-1.25f32) as f64);
        }
        assert_eq!(trace.len(), preamble.points);
    }

    #[test]
    fn test_signed_vs_unsigned_byte() {
        let signed = decode("0,0,1,1,1e-6,0,0,1.0,0.0,0",
                            RawSamples::Binary(vec![0x80]),
                            ByteOrder::MsbFirst, Signedness::Signed).unwrap();
        assert_eq!(signed.voltage, [-128.0]);
        let unsigned = decode("0,0,1,1,1e-6,0,0,1.0,0.0,0",
                              RawSamples::Binary(vec![0x80]),
                              ByteOrder::MsbFirst, Signedness::Unsigned).unwrap();
        assert_eq!(unsigned.voltage, [128.0]);
    }

    #[test]
    fn test_word_byte_order() {
        let msb = decode("1,0,1,1,1e-6,0,0,1.0,0.0,0",
                         RawSamples::Binary(vec![0x01, 0x00]),
                         ByteOrder::MsbFirst, Signedness::Signed).unwrap();
        assert_eq!(msb.voltage, [256.0]);
        let lsb = decode("1,0,1,1,1e-6,0,0,1.0,0.0,0",
                         RawSamples::Binary(vec![0x01, 0x00]),
                         ByteOrder::LsbFirst, Signedness::Signed).unwrap();
        assert_eq!(lsb.voltage, [1.0]);
    }

    #[test]
    fn test_word_signedness() {
        let signed = decode("1,0,1,1,1e-6,0,0,1.0,0.0,0",
                            RawSamples::Binary(vec![0xff, 0xff]),
                            ByteOrder::MsbFirst, Signedness::Signed).unwrap();
        assert_eq!(signed.voltage, [-1.0]);
        let unsigned = decode("1,0,1,1,1e-6,0,0,1.0,0.0,0",
                              RawSamples::Binary(vec![0xff, 0xff]),
                              ByteOrder::MsbFirst, Signedness::Unsigned).unwrap();
        assert_eq!(unsigned.voltage, [65535.0]);
    }

    #[test]
    fn test_ascii_ignores_hints() {
        for order in [ByteOrder::MsbFirst, ByteOrder::LsbFirst] {
            for signedness in [Signedness::Signed, Signedness::Unsigned] {
                let trace = decode("4,0,2,1,1e-6,0,0,1.0,0.0,0",
                                   RawSamples::Ascii(vec![-0.5, 0.5]),
                                   order, signedness).unwrap();
                assert_eq!(trace.voltage, [-0.5, 0.5]);
            }
        }
    }

    #[test]
    fn test_nine_fields_rejected() {
        let result = decode("0,0,4,1,1e-6,0,0,1.0,0.0",
                            RawSamples::Binary(vec![0; 4]),
                            ByteOrder::MsbFirst, Signedness::Signed);
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_eleven_fields_rejected() {
        let result = decode("0,0,4,1,1e-6,0,0,1.0,0.0,0,7",
                            RawSamples::Binary(vec![0; 4]),
                            ByteOrder::MsbFirst, Signedness::Signed);
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_format_two_unsupported() {
        let result = decode("2,0,4,1,1e-6,0,0,1.0,0.0,0",
                            RawSamples::Binary(vec![0; 4]),
                            ByteOrder::MsbFirst, Signedness::Signed);
        assert!(matches!(result, Err(Error::UnsupportedSampleFormat(2))));
    }

    #[test]
    fn test_unparseable_field_rejected() {
        let result = Preamble::parse("0,0,x,1,1e-6,0,0,1.0,0.0,0");
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_zero_x_increment_rejected() {
        let result = Preamble::parse("0,0,4,1,0.0,0,0,1.0,0.0,0");
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_point_count_mismatch_rejected() {
        let result = decode(SIGNED_BYTE_PREAMBLE, RawSamples::Binary(vec![0, 1, 2]),
                            ByteOrder::MsbFirst, Signedness::Signed);
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_buffer_kind_mismatch_rejected() {
        let result = decode(SIGNED_BYTE_PREAMBLE, RawSamples::Ascii(vec![0.0; 4]),
                            ByteOrder::MsbFirst, Signedness::Signed);
        assert!(matches!(result, Err(Error::MalformedPreamble(_))));
    }

    #[test]
    fn test_preamble_fields_retained() {
        let preamble = Preamble::parse("1,2,1000,1,1e-9,-5e-7,500,2e-3,0.0,128").unwrap();
        assert_eq!(preamble.format, SampleFormat::Word);
        assert_eq!(preamble.acquisition, AcquisitionType::Average);
        assert_eq!(preamble.points, 1000);
        assert_eq!(preamble.count, 1);
        assert_eq!(preamble.x_reference, 500);
        assert_eq!(preamble.y_reference, 128);
    }
}
