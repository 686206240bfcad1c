use crate::image::color::Rgb8;

/// Offsets added to red and blue before they are truncated to 5 bits.
const RED_BLUE: [[u8; 8]; 8] = [
    [1, 6, 2, 7, 1, 6, 2, 7],
    [4, 2, 5, 4, 4, 3, 6, 4],
    [1, 7, 1, 6, 2, 7, 1, 7],
    [5, 3, 5, 3, 5, 4, 5, 3],
    [1, 6, 2, 7, 1, 6, 2, 7],
    [4, 3, 6, 4, 4, 2, 6, 4],
    [2, 7, 1, 7, 2, 7, 1, 6],
    [5, 3, 5, 3, 5, 3, 5, 3],
];

/// Offsets added to green before it is truncated to 6 bits.
const GREEN: [[u8; 8]; 8] = [
    [1, 3, 1, 3, 1, 3, 1, 3],
    [2, 1, 3, 2, 2, 1, 3, 2],
    [1, 3, 1, 3, 1, 3, 1, 3],
    [2, 2, 2, 1, 3, 2, 2, 2],
    [1, 3, 1, 3, 1, 3, 1, 3],
    [2, 1, 3, 2, 2, 1, 3, 2],
    [1, 3, 1, 3, 1, 3, 1, 3],
    [3, 2, 2, 2, 2, 2, 2, 2],
];

/// Apply the ordered-dither offset for the pixel at `(x, y)`, clamping at 255.
pub(crate) fn dither(x: i16, y: i16, colour: &Rgb8) -> Rgb8 {
    let column = (x & 7) as usize;
    let row = (y & 7) as usize;

    let red_blue = RED_BLUE[row][column];
    let green = GREEN[row][column];

    Rgb8 {
        red: colour.red.saturating_add(red_blue),
        green: colour.green.saturating_add(green),
        blue: colour.blue.saturating_add(red_blue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_position() {
        let grey = Rgb8::new(100, 100, 100);
        assert_eq!(dither(0, 0, &grey), Rgb8::new(101, 101, 101));
        assert_eq!(dither(1, 0, &grey), Rgb8::new(106, 103, 106));
        assert_eq!(dither(0, 7, &grey), Rgb8::new(105, 103, 105));
        // the pattern repeats every 8 pixels
        assert_eq!(dither(9, 8, &grey), dither(1, 0, &grey));
    }

    #[test]
    fn clamps_at_full_intensity() {
        assert_eq!(dither(3, 0, &Rgb8::WHITE), Rgb8::WHITE);
    }
}
