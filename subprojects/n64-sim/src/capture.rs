//! Decoding of device transmissions.

use n64_hal::Level;

/// Threshold between a 1 bit (short low) and a 0 bit (long low).
const BIT_THRESHOLD_NS: u64 = 2_000;

/// Low and high phase widths of one transmitted bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseWidth {
    pub low_ns: u64,
    pub high_ns: u64,
}

impl PulseWidth {
    /// Bit value by pulse width: a short low phase is a 1.
    pub fn bit(&self) -> bool {
        self.low_ns < BIT_THRESHOLD_NS
    }
}

/// One frame driven by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Data bit pulses, in order.
    pub pulses: Vec<PulseWidth>,
    /// Width of the final low phase (the stop bit), if the frame has one.
    pub stop_low_ns: Option<u64>,
    /// Whether the line was released high at the end of the frame.
    pub released: bool,
}

impl Transmission {
    /// Builds a transmission from `(time, level)` writes.
    ///
    /// Returns `None` if the device never drove the line low.
    pub(crate) fn from_edges(edges: &[(u64, Level)]) -> Option<Self> {
        // Keep actual transitions only, starting from an idle (high) line
        let mut transitions = Vec::new();
        let mut level = Level::High;
        for &(t, l) in edges {
            if l != level {
                transitions.push((t, l));
                level = l;
            }
        }

        let falls: Vec<usize> = transitions
            .iter()
            .enumerate()
            .filter(|(_, (_, l))| l.is_low())
            .map(|(i, _)| i)
            .collect();
        if falls.is_empty() {
            return None;
        }

        let mut pulses = Vec::with_capacity(falls.len());
        let mut stop_low_ns = None;

        for (n, &i) in falls.iter().enumerate() {
            let fall = transitions[i].0;
            let rise = transitions.get(i + 1).map(|&(t, _)| t);
            let next_fall = falls.get(n + 1).map(|&j| transitions[j].0);

            match (rise, next_fall) {
                (Some(rise), Some(next_fall)) => pulses.push(PulseWidth {
                    low_ns: rise - fall,
                    high_ns: next_fall - rise,
                }),
                (Some(rise), None) => stop_low_ns = Some(rise - fall),
                (None, _) => {}
            }
        }

        Some(Self {
            pulses,
            stop_low_ns,
            released: level.is_high(),
        })
    }

    /// Decodes the complete bytes of the frame, MSB first.
    ///
    /// Trailing bits that do not fill a byte are ignored.
    pub fn bytes(&self) -> Vec<u8> {
        self.pulses
            .chunks_exact(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .fold(0u8, |acc, pulse| (acc << 1) | u8::from(pulse.bit()))
            })
            .collect()
    }
}
