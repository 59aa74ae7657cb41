//! Image Preprocessing Pipeline
//!
//! This example turns a decoded HWC `u8` image into the NCHW `f32` tensor an
//! ImageNet-style classifier expects: channel reorder, shortest-edge resize,
//! center crop, rescale to `[0, 1]`, per-channel normalization, and a batch
//! dimension. It finishes by encoding the result for an inference runtime.
//!
//! Run with:
//! ```sh
//! cargo run --example preprocess_image
//! ```

use pixr::prelude::*;

/// Synthetic 480x640 RGB gradient standing in for a decoded image
fn decoded_image(height: usize, width: usize) -> Result<Tensor> {
    let mut pixels = Vec::with_capacity(height * width * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / (width - 1)) as u8);
            pixels.push((y * 255 / (height - 1)) as u8);
            pixels.push(((x + y) % 256) as u8);
        }
    }
    Tensor::from_vec(pixels, &[height, width, 3])
}

fn main() -> Result<()> {
    let resize = ShortestEdge::new(256)?.with_mode(InterpolationMode::Bicubic);
    let crop = CenterCrop::square(224)?;
    let rescale = Rescale::default();
    let normalize = Normalize::default();

    // -----------------------------------------------------------------------
    // 1. Validate the pipeline against the input shape, no pixels touched
    // -----------------------------------------------------------------------
    let steps: [&dyn Transform; 6] = [
        &ToChannelsFirst,
        &resize,
        &crop,
        &rescale,
        &normalize,
        &AddBatchDim,
    ];
    let mut shape = Shape::from(&[480, 640, 3][..]);
    println!("input            {shape}");
    for step in steps {
        shape = step.output_shape(&shape)?;
        println!("{:<16} {shape}", step.name());
    }

    // -----------------------------------------------------------------------
    // 2. Run it
    // -----------------------------------------------------------------------
    let hwc = decoded_image(480, 640)?;

    // Reordering is a view: same storage, permuted strides.
    let chw = ToChannelsFirst.apply(&hwc)?;
    println!(
        "\nchw: shape={:?} strides={:?} contiguous={} shares_storage={}",
        chw.shape(),
        chw.strides(),
        chw.is_contiguous(),
        chw.shares_storage(&hwc),
    );

    // Resampling reads dense planes, so materialize once.
    let resized = chw.contiguous().resize_shortest_edge(&resize)?;
    let cropped = resized.center_crop(&crop)?;
    println!(
        "resized={:?} cropped={:?} (crop is a view: {})",
        resized.shape(),
        cropped.shape(),
        cropped.shares_storage(&resized),
    );

    let scaled = rescale.apply(&cropped)?;
    let batch = normalize.apply(&scaled)?.unsqueeze(0)?;
    println!(
        "batch: shape={:?} dtype={} first pixel={:.4}",
        batch.shape(),
        batch.dtype(),
        batch.get(&[0, 0, 0, 0])?,
    );
    assert_eq!(batch.shape(), shape.as_slice());

    // -----------------------------------------------------------------------
    // 3. Hand off to a runtime: bytes + shape + type code
    // -----------------------------------------------------------------------
    let bytes = batch.to_le_bytes()?;
    let code = batch.dtype().type_code();
    println!("\nencoded {} bytes, type code {code}", bytes.len());

    let decoded = Tensor::from_le_bytes(&bytes, code, batch.shape())?;
    assert_eq!(decoded.to_vec::<f32>()?, batch.to_vec::<f32>()?);
    println!("decoded tensor matches");

    Ok(())
}
