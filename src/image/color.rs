//! RGB565 pixel format.
//!
//! Colours are handled as full 8-bit [`Rgb8`] triplets and stored as 5-6-5
//! packed [`Rgb565`] codes. Whenever a code leaves the program (image buffers,
//! SPI transfers) it is written big-endian, whatever the host byte order.

/// An 8 bit per channel colour.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const fn pack(self) -> Rgb565 {
        pack_rgb565(self.red, self.green, self.blue)
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self { red, green, blue }
    }
}

/// A packed 5-6-5 colour code, held in host order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565(0);

    /// Decode the on-wire (big-endian) form.
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// Encode to the on-wire (big-endian) form.
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Expand back to 8 bits per channel, replicating the high bits into the
    /// dropped low bits so that full intensity stays at 255.
    pub const fn unpack(self) -> Rgb8 {
        let r5 = ((self.0 >> 11) & 0x1F) as u8;
        let g6 = ((self.0 >> 5) & 0x3F) as u8;
        let b5 = (self.0 & 0x1F) as u8;

        Rgb8 {
            red: (r5 << 3) | (r5 >> 2),
            green: (g6 << 2) | (g6 >> 4),
            blue: (b5 << 3) | (b5 >> 2),
        }
    }
}

pub const fn pack_rgb565(red: u8, green: u8, blue: u8) -> Rgb565 {
    let r5 = (red >> 3) as u16;
    let g6 = (green >> 2) as u16;
    let b5 = (blue >> 3) as u16;

    Rgb565((r5 << 11) | (g6 << 5) | b5)
}

/// Linear mix of `a` over `b`: `alpha == 255` gives `a`, `alpha == 0` gives `b`.
///
/// The division truncates, so results are never rounded up.
pub fn blend(alpha: u8, a: &Rgb8, b: &Rgb8) -> Rgb8 {
    let mix = |a: u8, b: u8| -> u8 {
        let value = (u32::from(a) * u32::from(alpha) + u32::from(b) * u32::from(255 - alpha)) / 255;
        value as u8
    };

    Rgb8 {
        red: mix(a.red, b.red),
        green: mix(a.green, b.green),
        blue: mix(a.blue, b.blue),
    }
}

/// [`blend`] for colours that are already packed.
pub fn blend_rgb565(alpha: u8, a: Rgb565, b: Rgb565) -> Rgb565 {
    blend(alpha, &a.unpack(), &b.unpack()).pack()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_truncates_to_565() {
        assert_eq!(pack_rgb565(255, 255, 255), Rgb565(0xFFFF));
        assert_eq!(pack_rgb565(255, 0, 0), Rgb565(0xF800));
        assert_eq!(pack_rgb565(0, 255, 0), Rgb565(0x07E0));
        assert_eq!(pack_rgb565(0, 0, 255), Rgb565(0x001F));
        assert_eq!(pack_rgb565(7, 3, 7), Rgb565(0));
    }

    #[test]
    fn wire_form_is_big_endian() {
        assert_eq!(Rgb565(0xF800).to_be_bytes(), [0xF8, 0x00]);
        assert_eq!(Rgb565::from_be_bytes([0x07, 0xE0]), Rgb565(0x07E0));
    }

    #[test]
    fn unpack_replicates_high_bits() {
        assert_eq!(Rgb565(0xFFFF).unpack(), Rgb8::WHITE);
        assert_eq!(Rgb565(0).unpack(), Rgb8::BLACK);
        // r5 = 0b10000 -> 0b10000100
        assert_eq!(Rgb565(0x8000).unpack(), Rgb8::new(0x84, 0, 0));
    }

    #[test]
    fn blend_truncates() {
        let a = Rgb8::new(255, 100, 1);
        let b = Rgb8::new(0, 0, 0);
        // 255 * 128 / 255 = 128, 100 * 128 / 255 = 50.19, 1 * 128 / 255 = 0.5
        assert_eq!(blend(128, &a, &b), Rgb8::new(128, 50, 0));
    }

    #[test]
    fn blend_grid_colour() {
        let grid = Rgb8::new(48, 48, 48);
        let user = Rgb8::new(4, 90, 141);
        // (48 * 63 + 4 * 192) / 255, (48 * 63 + 90 * 192) / 255, (48 * 63 + 141 * 192) / 255
        assert_eq!(blend(63, &grid, &user), Rgb8::new(14, 79, 118));
    }

    #[test]
    fn blend_packed_matches_unpacked() {
        let a = Rgb8::new(0, 109, 44).pack();
        let b = Rgb8::new(48, 48, 48).pack();
        assert_eq!(blend_rgb565(255, a, b), a);
        assert_eq!(blend_rgb565(0, a, b), b);
    }
}
