use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::analysis::units::mm_to_ps;
use crate::error::ScanError;
use crate::scan::buffer::ScanBuffer;

const COLUMNS: [&str; 6] = ["t", "X", "Y", "R", "pos", "dpos"];

/// The persisted table of one completed scan: time of flight (ps), measured
/// channel(s), aux sensor, commanded-vs-actual position bookkeeping.
/// Immutable once assembled.
#[derive(Clone, Debug)]
pub struct ScanRecord {
    pub t_ps: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub aux: Vec<f64>,
    /// Intended position of each sample: commanded target in stepped mode,
    /// read-back position in fast mode.
    pub position_mm: Vec<f64>,
    /// Actual minus commanded position; NaN for fast scans, which have no
    /// per-sample commanded position.
    pub position_error_mm: Vec<f64>,
}

impl ScanRecord {
    pub fn len(&self) -> usize {
        self.t_ps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_ps.is_empty()
    }

    /// Tab-separated serialization with the `t X Y R pos dpos` header.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), ScanError> {
        let mut w = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        w.write_record(COLUMNS)?;
        for i in 0..self.len() {
            w.write_record([
                self.t_ps[i].to_string(),
                self.x[i].to_string(),
                self.y[i].to_string(),
                self.aux[i].to_string(),
                self.position_mm[i].to_string(),
                self.position_error_mm[i].to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read_tsv<R: Read>(reader: R) -> Result<Self, ScanError> {
        let mut r = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(reader);
        let headers = r.headers()?.clone();
        let index = |name: &str| headers.iter().position(|h| h == name);
        let (it, ix) = match (index("t"), index("X")) {
            (Some(it), Some(ix)) => (it, ix),
            _ => {
                return Err(ScanError::BadScanFile(
                    "missing required columns t and X".into(),
                ))
            }
        };
        let optional = [index("Y"), index("R"), index("pos"), index("dpos")];

        let mut record = ScanRecord {
            t_ps: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            aux: Vec::new(),
            position_mm: Vec::new(),
            position_error_mm: Vec::new(),
        };
        let parse_at = |row: &csv::StringRecord, i: usize| -> Result<f64, ScanError> {
            let raw = row
                .get(i)
                .ok_or_else(|| ScanError::BadScanFile(format!("short row: {row:?}")))?;
            raw.parse()
                .map_err(|_| ScanError::BadScanFile(format!("bad number {raw:?}")))
        };
        for row in r.records() {
            let row = row?;
            record.t_ps.push(parse_at(&row, it)?);
            record.x.push(parse_at(&row, ix)?);
            for (slot, column) in optional.iter().zip([
                &mut record.y,
                &mut record.aux,
                &mut record.position_mm,
                &mut record.position_error_mm,
            ]) {
                column.push(match slot {
                    Some(i) => parse_at(&row, *i)?,
                    None => f64::NAN,
                });
            }
        }
        Ok(record)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        Self::read_tsv(File::open(path)?)
    }
}

/// Build the persisted record from raw scan arrays. The `pos` column is the
/// intended position of each sample: the commanded target sequence when one
/// exists (stepped mode, giving a jitter-free column and a uniform time
/// axis), the read-back position otherwise (fast mode, which has no
/// per-sample command). The stage jitter survives only in `dpos`.
///
/// The time axis is referenced to the first sample's position, not the
/// configured start, so scans that over- or undershoot the nominal start
/// stay self-consistent.
pub fn assemble(buffer: &ScanBuffer, commanded: Option<&[f64]>) -> ScanRecord {
    let actual = buffer.positions();
    let (position_mm, position_error_mm): (Vec<f64>, Vec<f64>) = match commanded {
        Some(targets) => (
            targets[..actual.len()].to_vec(),
            actual
                .iter()
                .zip(targets)
                .map(|(&read, &target)| read - target)
                .collect(),
        ),
        None => (actual.to_vec(), vec![f64::NAN; actual.len()]),
    };
    let p0 = position_mm.first().copied().unwrap_or(f64::NAN);
    let t_ps = position_mm
        .iter()
        .map(|&p| mm_to_ps(2.0 * (p0 - p)))
        .collect();
    ScanRecord {
        t_ps,
        x: buffer.x().to_vec(),
        y: buffer.y().to_vec(),
        aux: buffer.aux().to_vec(),
        position_mm,
        position_error_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::units::{mm_to_ps, C_MM_PER_PS};
    use crate::scan::buffer::RawSample;

    fn buffer_from_positions(positions: &[f64]) -> ScanBuffer {
        let mut buf = ScanBuffer::with_capacity(positions.len());
        for (i, &p) in positions.iter().enumerate() {
            buf.write(
                i,
                RawSample {
                    position_mm: p,
                    primary: p * 0.1,
                    quadrature: -p * 0.1,
                    aux: 120.0,
                },
            );
        }
        buf
    }

    #[test]
    fn time_axis_is_referenced_to_first_sample() {
        let record = assemble(&buffer_from_positions(&[5.0, 4.0, 3.0]), None);
        assert_eq!(record.t_ps[0], 0.0);
        assert!((record.t_ps[1] - 2.0 / C_MM_PER_PS).abs() < 1e-9);
        assert!((record.t_ps[2] - mm_to_ps(4.0)).abs() < 1e-9);
    }

    #[test]
    fn fast_scan_position_error_is_undefined() {
        let record = assemble(&buffer_from_positions(&[5.0, 4.0]), None);
        assert!(record.position_error_mm.iter().all(|d| d.is_nan()));
    }

    #[test]
    fn stepped_scan_position_error_is_actual_minus_commanded() {
        let buf = buffer_from_positions(&[5.001, 3.999]);
        let record = assemble(&buf, Some(&[5.0, 4.0]));
        assert!((record.position_error_mm[0] - 0.001).abs() < 1e-9);
        assert!((record.position_error_mm[1] + 0.001).abs() < 1e-9);
    }

    #[test]
    fn stepped_record_stores_commanded_positions() {
        // read-back jitter must end up in dpos only, never in pos or t
        let buf = buffer_from_positions(&[10.002, 9.002, 8.002]);
        let record = assemble(&buf, Some(&[10.0, 9.0, 8.0]));
        assert_eq!(record.position_mm, vec![10.0, 9.0, 8.0]);
        assert_eq!(record.t_ps[0], 0.0);
        let dt = record.t_ps[1] - record.t_ps[0];
        assert!((record.t_ps[2] - record.t_ps[1] - dt).abs() < 1e-12);
        assert!((dt - mm_to_ps(2.0)).abs() < 1e-12);
        assert!(record
            .position_error_mm
            .iter()
            .all(|d| (d - 0.002).abs() < 1e-9));
    }

    #[test]
    fn tsv_round_trip() {
        let record = assemble(&buffer_from_positions(&[5.0, 4.5, 4.0]), Some(&[5.0, 4.5, 4.0]));
        let mut out = Vec::new();
        record.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("t\tX\tY\tR\tpos\tdpos\n"));

        let back = ScanRecord::read_tsv(out.as_slice()).unwrap();
        assert_eq!(back.len(), 3);
        for i in 0..3 {
            assert!((back.t_ps[i] - record.t_ps[i]).abs() < 1e-12);
            assert!((back.x[i] - record.x[i]).abs() < 1e-12);
            assert!((back.position_mm[i] - record.position_mm[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn nan_fields_survive_round_trip() {
        let record = assemble(&buffer_from_positions(&[2.0, 1.0]), None);
        let mut out = Vec::new();
        record.write_tsv(&mut out).unwrap();
        let back = ScanRecord::read_tsv(out.as_slice()).unwrap();
        assert!(back.position_error_mm.iter().all(|d| d.is_nan()));
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let bad = b"a\tb\n1\t2\n";
        assert!(matches!(
            ScanRecord::read_tsv(&bad[..]),
            Err(ScanError::BadScanFile(_))
        ));
    }
}
