use anyhow::{Context, Result};
use image::RgbImage;
use protocol::JobSpec;
use tracing::debug;

use super::tonemap;

/// Runs one dispatched job start to finish: decode the source image,
/// tone-map it, write the 8-bit result. Returns the transform's
/// self-measured elapsed seconds.
pub fn run(spec: &JobSpec) -> Result<f32> {
    let src = spec.src();
    let hdr = image::open(&src)
        .with_context(|| format!("read {}", src.display()))?
        .to_rgb32f();

    let (width, height) = hdr.dimensions();
    let (mapped, elapsed) =
        tonemap::apply(hdr.as_raw(), spec.operator, &spec.params, spec.block_size);

    let dst = spec.dst_path.join(output_name(&spec.file_name));
    to_ldr(width, height, &mapped)
        .save(&dst)
        .with_context(|| format!("write {}", dst.display()))?;

    debug!(file = %spec.file_name, elapsed, "job complete");
    Ok(elapsed)
}

/// Quantizes mapped [0, 1] pixels to 8-bit RGB.
fn to_ldr(width: u32, height: u32, pixels: &[f32]) -> RgbImage {
    let bytes = pixels
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();
    RgbImage::from_raw(width, height, bytes).expect("pixel buffer matches dimensions")
}

/// Output keeps the source name with the extension swapped for the low
/// dynamic range encoding.
fn output_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.png"),
        _ => format!("{file_name}.png"),
    }
}
