//! Tempo-indexed duration tables and the error-diffusion tick encoder

use crate::note::Note;
use thiserror::Error;

/// One tempo's vocabulary of note lengths, as raw frame-count codes
///
/// `values[0]` is the row's base: the frame count of a sixteenth note at this tempo.
/// Converting ticks to a code is therefore a multiplication by `base / 24`, but the
/// result is rarely an exact integer, so the encoder carries the rounding residual
/// forward into the next call. Without that accumulator a long note stream drifts
/// against the beat; with it, individual codes occasionally come out one step away
/// from the naive rounding while the running total stays accurate.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<u8>,
    error: f32,
}

impl Row {
    /// Construct a row from its frame-count codes; `values[0]` is the base
    pub fn new(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "a duration row cannot be empty");
        Self { values, error: 0.0 }
    }

    /// The frame count of a sixteenth note at this tempo
    pub fn base(&self) -> u8 {
        self.values[0]
    }

    /// Frame counts per tick
    fn ratio(&self) -> f32 {
        self.base() as f32 / Note::SIXTEENTH as f32
    }

    /// The number of codes in this row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Does the row hold any codes?
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode a tick length as an index into this row's code list
    ///
    /// Carries the rounding residual into the next call; `reset` must be called once
    /// per independent note stream.
    pub fn encode(&mut self, ticks: u32) -> Result<u8, DurationNotRepresentable> {
        let target = ticks as f32 * self.ratio() - self.error;
        let rounded = target.round();
        self.error += target - rounded;

        let value = rounded as i32;
        match self.values.iter().position(|v| i32::from(*v) == value) {
            Some(index) => Ok(index as u8),
            None => Err(DurationNotRepresentable { ticks, value }),
        }
    }

    /// The tick length a code index decodes to, `None` if the index is out of range
    pub fn decode(&self, index: u8) -> Option<u32> {
        let value = *self.values.get(index as usize)?;
        Some((value as f32 / self.base() as f32 * Note::SIXTEENTH as f32).round() as u32)
    }

    /// Clear the rounding-error accumulator
    ///
    /// Call once per encoding pass (one channel's note stream); accumulators are
    /// never shared across channels or patterns.
    pub fn reset(&mut self) {
        self.error = 0.0;
    }

    /// The current rounding residual
    pub fn error(&self) -> f32 {
        self.error
    }
}

/// The full set of tempo rows for one encoding mode
///
/// A tempo byte selects a row by cumulative size: successive row sizes are consumed
/// from the tempo value until zero remains, mirroring the original format's "one
/// tempo value addresses one contiguous sub-table" layout.
#[derive(Debug, Clone, Default)]
pub struct DurationLut {
    rows: Vec<Row>,
}

impl DurationLut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read concatenated rows of the given sizes from their on-disk layout
    pub fn from_image(image: &crate::rom::image::Image, address: usize, sizes: &[usize]) -> Self {
        let mut lut = Self::new();
        let mut cursor = address;
        for size in sizes {
            lut.add_row(image.read(cursor, *size));
            cursor += size;
        }
        lut
    }

    pub fn add_row(&mut self, values: Vec<u8>) {
        self.rows.push(Row::new(values));
    }

    /// The row a tempo byte selects
    pub fn row(&self, tempo: u8) -> Result<&Row, DurationOffsetUnknown> {
        self.row_position(tempo).map(|i| &self.rows[i])
    }

    /// Mutable access to the row a tempo byte selects (encoding needs the accumulator)
    pub fn row_mut(&mut self, tempo: u8) -> Result<&mut Row, DurationOffsetUnknown> {
        self.row_position(tempo).map(|i| &mut self.rows[i])
    }

    fn row_position(&self, tempo: u8) -> Result<usize, DurationOffsetUnknown> {
        let mut remaining = tempo as usize;
        for (position, row) in self.rows.iter().enumerate() {
            if remaining == 0 {
                return Ok(position);
            }
            remaining = remaining
                .checked_sub(row.len())
                .ok_or(DurationOffsetUnknown { tempo })?;
        }
        Err(DurationOffsetUnknown { tempo })
    }

    /// Clear every row's rounding-error accumulator
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.reset();
        }
    }
}

/// Error for when a tick length has no exact code in the active tempo row
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no code for {ticks} ticks (frame count {value}) in the active tempo row")]
pub struct DurationNotRepresentable {
    pub ticks: u32,
    pub value: i32,
}

/// Error for when a tempo byte addresses past the end of all rows
#[derive(Debug, Error, PartialEq, Eq)]
#[error("tempo {tempo:#04x} does not address a duration row")]
pub struct DurationOffsetUnknown {
    pub tempo: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lut() -> DurationLut {
        let mut lut = DurationLut::new();
        lut.add_row(vec![0x05, 0x0f, 0x0a, 0x14, 0x1e, 0x28, 0x07, 0x06]);
        lut.add_row(vec![0x06, 0x12, 0x0c, 0x18, 0x24, 0x30, 0x08, 0x10]);
        lut
    }

    #[test]
    fn row_selection_consumes_tempo_against_row_sizes() {
        let lut = lut();
        assert_eq!(lut.row(0x00).unwrap().base(), 0x05);
        assert_eq!(lut.row(0x08).unwrap().base(), 0x06);

        // Offsets inside a row or past the last one address nothing
        assert_eq!(lut.row(0x04).unwrap_err(), DurationOffsetUnknown { tempo: 0x04 });
        assert_eq!(lut.row(0x10).unwrap_err(), DurationOffsetUnknown { tempo: 0x10 });
    }

    #[test]
    fn encode_exact_lengths() {
        let mut lut = lut();
        let row = lut.row_mut(0x08).unwrap();
        row.reset();

        assert_eq!(row.encode(Note::EIGHTH), Ok(2));
        assert_eq!(row.encode(Note::QUARTER), Ok(3));
        assert_eq!(row.encode(Note::HALF), Ok(5));
        assert_eq!(row.error(), 0.0);
    }

    #[test]
    fn encode_diffuses_rounding_error() {
        let mut lut = lut();
        let row = lut.row_mut(0x00).unwrap();
        row.reset();

        // The stored triplet figure at this tempo: frame counts 7 + 7 + 6 sum to an
        // exact quarter note (20 frames), even though no single count divides evenly
        assert_eq!(row.encode(34), Ok(6));
        assert_eq!(row.encode(34), Ok(6));
        assert_eq!(row.encode(29), Ok(7));
    }

    #[test]
    fn accumulated_error_stays_bounded() {
        let mut lut = lut();
        let row = lut.row_mut(0x00).unwrap();
        row.reset();

        for _ in 0..1000 {
            row.encode(34).unwrap();
            assert!(row.error().abs() < 1.0);
        }
    }

    #[test]
    fn encode_rejects_unrepresentable_lengths() {
        let mut lut = lut();
        let row = lut.row_mut(0x00).unwrap();
        row.reset();

        // A lone quarter triplet lands on frame count 13, which this row does not contain
        assert_eq!(
            row.encode(Note::QUARTER_TRIPLET),
            Err(DurationNotRepresentable {
                ticks: Note::QUARTER_TRIPLET,
                value: 13
            })
        );
    }

    #[test]
    fn decode_inverts_codes() {
        let lut = lut();
        let row = lut.row(0x00).unwrap();

        assert_eq!(row.decode(0), Some(Note::SIXTEENTH));
        assert_eq!(row.decode(3), Some(Note::QUARTER));
        assert_eq!(row.decode(6), Some(34));
        assert_eq!(row.decode(7), Some(29));
        assert_eq!(row.decode(8), None);
    }
}
