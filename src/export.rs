//! Flat tabular export of captured traces.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::session::Measurement;
use crate::Result;

/// Write the measurement as plain delimited text, one row per sample. An
/// existing file at `path` is overwritten; avoiding name collisions is the
/// caller's responsibility.
pub fn write_table<P: AsRef<Path>>(measurement: &Measurement, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "time (s),voltage (V)")?;
    for (time, voltage) in measurement.trace.time.iter().zip(&measurement.trace.voltage) {
        writeln!(out, "{},{}", time, voltage)?;
    }
    out.flush()?;
    log::info!("saved {} {} samples to {}",
               measurement.trace.len(), measurement.label, path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Trace;

    fn test_measurement(voltage: Vec<f64>) -> Measurement {
        let time = (0..voltage.len()).map(|i| i as f64).collect();
        Measurement {
            label: "HYSTERESIS".to_owned(),
            duration: 1e-3,
            trace: Trace { time, voltage },
        }
    }

    #[test]
    fn test_header_and_rows() {
        let path = std::env::temp_dir().join("ferrobench_export_rows.csv");
        write_table(&test_measurement(vec![0.5, -0.5]), &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "time (s),voltage (V)\n0,0.5\n1,-0.5\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overwrites_existing_file() {
        let path = std::env::temp_dir().join("ferrobench_export_overwrite.csv");
        write_table(&test_measurement(vec![1.0, 2.0, 3.0]), &path).unwrap();
        write_table(&test_measurement(vec![7.0]), &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "time (s),voltage (V)\n0,7\n");
        std::fs::remove_file(&path).unwrap();
    }
}
