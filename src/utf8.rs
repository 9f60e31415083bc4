//! Incremental UTF-8 decoding
//!
//! Byte-at-a-time DFA decoder (Bjoern Hoehrmann's automaton) so the shaping
//! walk can consume raw bytes without ever allocating or looking ahead.
//! Invalid sequences resynchronize on the next lead byte.

/// Decoder accepted a complete codepoint
pub const UTF8_ACCEPT: u32 = 0;
/// Decoder rejected the sequence
pub const UTF8_REJECT: u32 = 12;

#[rustfmt::skip]
const UTF8_TABLE: [u8; 364] = [
    // Byte -> character class
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1, 9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, 7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2, 2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8,
    // (state, class) -> next state
     0,12,24,36,60,96,84,12,12,12,48,72,
    12,12,12,12,12,12,12,12,12,12,12,12,
    12, 0,12,12,12,12,12, 0,12, 0,12,12,
    12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12,
    12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// Restartable UTF-8 decoder state
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Decoder {
    state: u32,
    codepoint: u32,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(&mut self, byte: u8) -> u32 {
        let class = u32::from(UTF8_TABLE[byte as usize]);
        self.codepoint = if self.state != UTF8_ACCEPT {
            (u32::from(byte) & 0x3f) | (self.codepoint << 6)
        } else {
            (0xff >> class) & u32::from(byte)
        };
        self.state = u32::from(UTF8_TABLE[(256 + self.state + class) as usize]);
        self.state
    }

    /// Feed one byte. Returns `Some(codepoint)` when a scalar value completes.
    /// On a malformed sequence the partial codepoint is dropped and the
    /// offending byte is reprocessed as a potential sequence start.
    pub fn push(&mut self, byte: u8) -> Option<u32> {
        match self.step(byte) {
            UTF8_ACCEPT => Some(self.codepoint),
            UTF8_REJECT => {
                self.state = UTF8_ACCEPT;
                match self.step(byte) {
                    UTF8_ACCEPT => Some(self.codepoint),
                    UTF8_REJECT => {
                        self.state = UTF8_ACCEPT;
                        None
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
