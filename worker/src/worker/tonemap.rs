//! The tone-mapping operators. Pure over their inputs: the source buffer is
//! never mutated and identical inputs produce identical output.

use std::time::Instant;

use protocol::{OperatorKind, ToneParams};

/// Applies the selected operator to an interleaved RGB f32 buffer, walking
/// it in `block_size`-squared bands. Returns the mapped buffer and the
/// elapsed seconds of the mapping itself, excluding decode and encode.
pub fn apply(
    pixels: &[f32],
    operator: OperatorKind,
    params: &ToneParams,
    block_size: u32,
) -> (Vec<f32>, f32) {
    let start = Instant::now();
    let band = (block_size.max(1) as usize).pow(2);
    let mut out = vec![0.0f32; pixels.len()];

    match operator {
        OperatorKind::Log => log_map(pixels, &mut out, band, params.k, params.q),
        OperatorKind::Gamma => gamma_map(pixels, &mut out, band, params.f_stop, params.gamma),
        OperatorKind::AdaptiveLog => {
            adaptive_log_map(pixels, &mut out, band, params.b, params.ld_max)
        }
    }

    (out, start.elapsed().as_secs_f32())
}

fn for_bands(src: &[f32], out: &mut [f32], band: usize, mut f: impl FnMut(f32) -> f32) {
    for (s, d) in src.chunks(band).zip(out.chunks_mut(band)) {
        for (sv, dv) in s.iter().zip(d.iter_mut()) {
            *dv = f(*sv);
        }
    }
}

fn log_map(src: &[f32], out: &mut [f32], band: usize, k: f32, q: f32) {
    let peak = peak(src);
    let denom = (1.0 + k * peak).log10();
    for_bands(src, out, band, |v| (1.0 + q * v).log10() / denom);
}

fn gamma_map(src: &[f32], out: &mut [f32], band: usize, f_stop: f32, gamma: f32) {
    let exposure = 2.0f32.powf(f_stop);
    let inv = 1.0 / gamma;
    for_bands(src, out, band, |v| (exposure * v).powf(inv));
}

fn adaptive_log_map(src: &[f32], out: &mut [f32], band: usize, b: f32, ld_max: f32) {
    let peak = peak(src);
    let scale = (ld_max / 100.0) / (1.0 + peak).log10();
    let bias = b.ln() / 0.5f32.ln();
    for_bands(src, out, band, |v| {
        scale * (1.0 + v).ln() / (2.0 + 8.0 * (v / peak).powf(bias)).ln()
    });
}

fn peak(pixels: &[f32]) -> f32 {
    pixels
        .iter()
        .copied()
        .fold(0.0f32, f32::max)
        .max(f32::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels() -> Vec<f32> {
        (0..(16 * 16 * 3)).map(|i| i as f32 * 0.01).collect()
    }

    fn params() -> ToneParams {
        ToneParams {
            f_stop: 0.5,
            gamma: 2.2,
            q: 1.2,
            k: 0.8,
            b: 0.85,
            ld_max: 100.0,
        }
    }

    #[test]
    fn deterministic_and_input_untouched() {
        let src = pixels();
        let before = src.clone();
        for op in [
            OperatorKind::Log,
            OperatorKind::Gamma,
            OperatorKind::AdaptiveLog,
        ] {
            let (first, _) = apply(&src, op, &params(), 32);
            let (second, _) = apply(&src, op, &params(), 32);
            assert_eq!(first, second);
            assert_eq!(src, before);
        }
    }

    #[test]
    fn band_size_does_not_change_the_mapping() {
        let src = pixels();
        let (narrow, _) = apply(&src, OperatorKind::AdaptiveLog, &params(), 1);
        let (wide, _) = apply(&src, OperatorKind::AdaptiveLog, &params(), 64);
        assert_eq!(narrow, wide);
    }

    #[test]
    fn unit_gamma_with_zero_f_stop_is_identity() {
        let src = pixels();
        let p = ToneParams {
            f_stop: 0.0,
            gamma: 1.0,
            ..params()
        };
        let (out, _) = apply(&src, OperatorKind::Gamma, &p, 32);
        assert_eq!(out, src);
    }

    #[test]
    fn log_maps_peak_to_one_when_q_equals_k() {
        let src = pixels();
        let p = ToneParams {
            q: 0.8,
            k: 0.8,
            ..params()
        };
        let (out, _) = apply(&src, OperatorKind::Log, &p, 32);
        let peak_out = out.iter().copied().fold(f32::MIN, f32::max);
        assert!((peak_out - 1.0).abs() < 1e-6);
    }
}
