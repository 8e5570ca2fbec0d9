use crate::foundation::error::{SpectroError, SpectroResult};
use crate::foundation::math::mul_div255_u16;

pub type PremulRgba8 = [u8; 4];

/// Screen blend of premultiplied pixels: every channel (alpha included) is `s + d - s*d`.
pub fn screen(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let mut out = [0u8; 4];
    for i in 0..4 {
        let s = u16::from(src[i]);
        let d = u16::from(dst[i]);
        out[i] = (s + d - mul_div255_u16(s, d)).min(255) as u8;
    }
    out
}

pub fn screen_in_place(dst: &mut [u8], src: &[u8]) -> SpectroResult<()> {
    blend_in_place(dst, src, screen, "screen_in_place")
}

fn blend_in_place(
    dst: &mut [u8],
    src: &[u8],
    op: fn(PremulRgba8, PremulRgba8) -> PremulRgba8,
    name: &str,
) -> SpectroResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(SpectroError::render(format!(
            "{name} expects equal-length rgba8 buffers"
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = op([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
