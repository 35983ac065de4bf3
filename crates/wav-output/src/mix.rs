//! Volume-scaled mixing of signed 16-bit little-endian samples.

/// Full-scale mixing volume.
pub const MAX_VOLUME: u8 = 128;

/// Mix `src` into `dst`, scaling `src` by `volume / MAX_VOLUME` and saturating the sum
/// to the `i16` range.
///
/// Only whole samples present in both slices are touched. Volumes above
/// [`MAX_VOLUME`] are clamped.
pub fn mix_s16_le(dst: &mut [u8], src: &[u8], volume: u8) {
    let volume = i32::from(volume.min(MAX_VOLUME));
    if volume == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(2).zip(src.chunks_exact(2)) {
        let src_sample =
            i32::from(i16::from_le_bytes([s[0], s[1]])) * volume / i32::from(MAX_VOLUME);
        let dst_sample = i32::from(i16::from_le_bytes([d[0], d[1]]));
        let mixed = (dst_sample + src_sample)
            .clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        d.copy_from_slice(&mixed.to_le_bytes());
    }
}
