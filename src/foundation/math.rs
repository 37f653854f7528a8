pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Convert premultiplied RGBA8 into straight-alpha RGBA8, as expected by `-pix_fmt rgba`.
pub(crate) fn unpremultiply_rgba8(dst: &mut [u8], src_premul: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3];
        match a {
            0 => d.copy_from_slice(&[0, 0, 0, 0]),
            255 => d.copy_from_slice(s),
            _ => {
                let a16 = u16::from(a);
                let unpremul =
                    |c: u8| -> u8 { ((u16::from(c) * 255 + a16 / 2) / a16).min(255) as u8 };
                d[0] = unpremul(s[0]);
                d[1] = unpremul(s[1]);
                d[2] = unpremul(s[2]);
                d[3] = a;
            }
        }
    }
}

/// Source-over composite of premultiplied `src` onto premultiplied `dst`, in place.
pub(crate) fn src_over_premul(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3];
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - u16::from(sa);
        for c in 0..4 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(d[c]), inv);
            d[c] = v.min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
