// Qualitative line palette

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// ColorBrewer "Dark2", 8 classes
pub const PALETTE: [Rgb; 8] = [
    Rgb(0x1b, 0x9e, 0x77),
    Rgb(0xd9, 0x5f, 0x02),
    Rgb(0x75, 0x70, 0xb3),
    Rgb(0xe7, 0x29, 0x8a),
    Rgb(0x66, 0xa6, 0x1e),
    Rgb(0xe6, 0xab, 0x02),
    Rgb(0xa6, 0x76, 0x1d),
    Rgb(0x66, 0x66, 0x66),
];

pub fn color(series_index: usize) -> Rgb {
    PALETTE[series_index % PALETTE.len()]
}
