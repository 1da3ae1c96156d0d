//! 8-bit fixed-point helpers (after FastLED's `lib8tion`)

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
///
/// Uses integer math for efficiency on embedded systems.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn scale8(value: u8, scale: u8) -> u8 {
    ((u16::from(value) * u16::from(scale)) >> 8) as u8
}

/// Saturating 8-bit add
#[inline]
pub fn qadd8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Linear interpolation that is exact at both ends
///
/// # Arguments
/// * `a` - First value
/// * `b` - Second value
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn lerp8(a: u8, b: u8, amount_of_b: u8) -> u8 {
    let amount = u16::from(amount_of_b);
    ((u16::from(a) * (255 - amount) + u16::from(b) * amount) / 255) as u8
}

const SIN8_SEGMENTS: [u8; 8] = [0, 49, 49, 41, 90, 27, 117, 10];

/// Fast 8-bit sine approximation
///
/// `theta` covers one full turn over 0-255; the result is centered on 128
/// and ranges over 1-255.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sin8(theta: u8) -> u8 {
    let mut offset = theta;
    if theta & 0x40 != 0 {
        offset = 255 - offset;
    }
    offset &= 0x3F;

    let mut secoffset = offset & 0x0F;
    if theta & 0x40 != 0 {
        secoffset += 1;
    }

    let section = usize::from(offset >> 4) * 2;
    let b = i16::from(SIN8_SEGMENTS[section]);
    let m16 = i16::from(SIN8_SEGMENTS[section + 1]);

    let mx = (m16 * i16::from(secoffset)) >> 4;
    let mut y = mx + b;
    if theta & 0x80 != 0 {
        y = -y;
    }
    (y + 128) as u8
}
