//! Console-side frame waveforms.

/// Console bit width in nanoseconds (four units of one microsecond).
const BIT_NS: u64 = 4_000;

/// Unit width in nanoseconds.
const UNIT_NS: u64 = 1_000;

/// A frame the console drives onto the line.
///
/// The console encodes bits the same way the controller does (1 unit low for
/// a 1, 3 units low for a 0, 4 units per bit) and terminates its frames with
/// a 1 unit low stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleFrame {
    bits: Vec<bool>,
    stop_bit: bool,
    hold_low_ns: Option<u64>,
}

impl ConsoleFrame {
    /// Frame carrying `bytes`, MSB first, with a stop bit.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bits = bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |i| byte & (1 << i) != 0))
            .collect();
        Self {
            bits,
            stop_bit: true,
            hold_low_ns: None,
        }
    }

    /// Frame carrying raw bits, e.g. a truncated byte.
    pub fn from_bits(bits: &[bool], stop_bit: bool) -> Self {
        Self {
            bits: bits.to_vec(),
            stop_bit,
            hold_low_ns: None,
        }
    }

    /// Ends the frame by pulling the line low for `ns` instead of releasing
    /// it, as a shorted or glitching line would.
    pub fn hold_low(mut self, ns: u64) -> Self {
        self.stop_bit = false;
        self.hold_low_ns = Some(ns);
        self
    }

    /// The data bits of the frame.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Low phases of the frame as `[start, end)` intervals, for a frame
    /// starting at `start_ns`.
    pub(crate) fn low_intervals(&self, start_ns: u64) -> Vec<(u64, u64)> {
        let mut t = start_ns;
        let mut lows = Vec::with_capacity(self.bits.len() + 1);

        for &bit in &self.bits {
            let low = if bit { UNIT_NS } else { 3 * UNIT_NS };
            lows.push((t, t + low));
            t += BIT_NS;
        }

        if self.stop_bit {
            lows.push((t, t + UNIT_NS));
        }

        if let Some(ns) = self.hold_low_ns {
            lows.push((t, t + ns));
        }

        lows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_msb_first() {
        let frame = ConsoleFrame::from_bytes(&[0x81]);

        assert_eq!(
            frame.bits(),
            &[true, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn test_low_intervals_include_stop_bit() {
        let frame = ConsoleFrame::from_bits(&[true, false], true);

        assert_eq!(
            frame.low_intervals(100),
            vec![(100, 1_100), (4_100, 7_100), (8_100, 9_100)]
        );
    }

    #[test]
    fn test_hold_low_replaces_stop_bit() {
        let frame = ConsoleFrame::from_bits(&[true], true).hold_low(50_000);

        assert_eq!(frame.low_intervals(0), vec![(0, 1_000), (4_000, 54_000)]);
    }

    #[test]
    fn test_low_intervals_without_stop_bit() {
        let frame = ConsoleFrame::from_bits(&[true], false);

        assert_eq!(frame.low_intervals(0), vec![(0, 1_000)]);
    }
}
