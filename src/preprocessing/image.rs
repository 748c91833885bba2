use crate::error::{Result, TransformError};
use crate::tensor::{first_name, NamedTensors};
use image::imageops::interpolate_bilinear;
use image::{ImageBuffer, Luma, Rgb};
use ndarray::Array4;
use tracing::debug;

/// Side length of the square MNIST input.
pub const INPUT_SIZE: u32 = 28;

// Fixed-point BT.601 luma weights, scaled by 2^14. They sum to 2^14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Decodes an encoded image and turns it into the model's input feed.
///
/// The returned map holds a single `[1, 1, 28, 28]` tensor with values in
/// `[0, 1]`, keyed by `input_names[0]`. Pixels are scaled to `[0, 1]` before
/// the bilinear resize, which samples two neighbours per axis at half-pixel
/// centres and does no area averaging when shrinking.
pub fn preprocess<S: AsRef<str>>(bytes: &[u8], input_names: &[S]) -> Result<NamedTensors> {
    let input_name = first_name(input_names, "input")?;

    // 1. Decode as 3-channel colour
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();

    // 2. Grayscale, scaled to [0, 1]
    let plane: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([f32::from(luma(rgb.get_pixel(x, y))) / 255.0])
    });

    // 3. Resize to 28x28
    let resized = resize_bilinear(&plane, INPUT_SIZE, INPUT_SIZE)?;

    // 4. Add batch and channel dimensions [1, 1, 28, 28]
    let side = INPUT_SIZE as usize;
    let tensor = Array4::from_shape_vec((1, 1, side, side), resized)?;

    debug!(
        input = %input_name,
        source_width = width,
        source_height = height,
        "preprocessed image into {:?}",
        tensor.shape()
    );

    let mut feeds = NamedTensors::new();
    feeds.insert(input_name, tensor.into_dyn());
    Ok(feeds)
}

/// Bilinear resize with source coordinate `(dst + 0.5) * scale - 0.5`,
/// clamped to the image. Returns the row-major plane.
fn resize_bilinear(
    plane: &ImageBuffer<Luma<f32>, Vec<f32>>,
    width: u32,
    height: u32,
) -> Result<Vec<f32>> {
    let (src_width, src_height) = plane.dimensions();
    let scale_x = src_width as f32 / width as f32;
    let scale_y = src_height as f32 / height as f32;
    let max_x = src_width.saturating_sub(1) as f32;
    let max_y = src_height.saturating_sub(1) as f32;

    let mut resized = Vec::with_capacity((width * height) as usize);
    for dy in 0..height {
        let sy = ((dy as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
        for dx in 0..width {
            let sx = ((dx as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
            let pixel = interpolate_bilinear(plane, sx, sy).ok_or_else(|| {
                TransformError::PreprocessingError(format!("sample ({sx}, {sy}) out of bounds"))
            })?;
            resized.push(pixel.0[0]);
        }
    }
    Ok(resized)
}

fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let weighted = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}
