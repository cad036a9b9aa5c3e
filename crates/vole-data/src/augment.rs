// Augmentations — randomised image steps for training pipelines
//
// All augmentations operate on channel-first `[C, H, W]` tensors. Each call
// draws from the calling thread's RNG, so concurrent workers never share a
// generator and no call depends on the ones before it.

use rand::thread_rng;
use rand::Rng;

use vole_core::{Error, Result, Tensor};

use crate::transform::{chw, TensorOp};

// RandomHorizontalFlip

/// Randomly flip an image horizontally with probability `p`.
#[derive(Debug, Clone, Copy)]
pub struct RandomHorizontalFlip {
    pub p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl TensorOp for RandomHorizontalFlip {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let (_, _, w) = chw(tensor)?;
        if thread_rng().gen::<f64>() >= self.p {
            return Ok(tensor.clone());
        }
        let mut flipped = Vec::with_capacity(tensor.elem_count());
        for row in tensor.as_slice().chunks_exact(w.max(1)) {
            flipped.extend(row.iter().rev());
        }
        Tensor::from_vec(flipped, tensor.shape(), tensor.dtype())
    }

    fn name(&self) -> &str {
        "random_horizontal_flip"
    }
}

// RandomCrop

/// Randomly crop a `crop_h x crop_w` window.
///
/// If `padding > 0`, the image is first padded with zeros on all sides by
/// `padding` pixels. A window larger than the padded image is a shape error.
#[derive(Debug, Clone, Copy)]
pub struct RandomCrop {
    pub crop_h: usize,
    pub crop_w: usize,
    pub padding: usize,
}

impl RandomCrop {
    pub fn new(crop_h: usize, crop_w: usize, padding: usize) -> Self {
        Self {
            crop_h,
            crop_w,
            padding,
        }
    }
}

impl TensorOp for RandomCrop {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let (c, h, w) = chw(tensor)?;
        let pad = self.padding;
        let padded_h = h + 2 * pad;
        let padded_w = w + 2 * pad;
        if self.crop_h > padded_h || self.crop_w > padded_w {
            let (dim, len, dim_size) = if self.crop_h > padded_h {
                (1, self.crop_h, padded_h)
            } else {
                (2, self.crop_w, padded_w)
            };
            return Err(Error::NarrowOutOfBounds {
                dim,
                start: 0,
                len,
                dim_size,
            });
        }

        // Zero border of `pad` pixels around every channel plane.
        let mut padded = vec![0.0; c * padded_h * padded_w];
        if w > 0 {
            for (i, row) in tensor.as_slice().chunks_exact(w).enumerate() {
                let (ch, y) = (i / h, i % h);
                let start = ch * padded_h * padded_w + (y + pad) * padded_w + pad;
                padded[start..start + w].copy_from_slice(row);
            }
        }

        let mut rng = thread_rng();
        let y0 = rng.gen_range(0..=padded_h - self.crop_h);
        let x0 = rng.gen_range(0..=padded_w - self.crop_w);

        let mut cropped = Vec::with_capacity(c * self.crop_h * self.crop_w);
        for ch in 0..c {
            for row in 0..self.crop_h {
                let start = ch * padded_h * padded_w + (y0 + row) * padded_w + x0;
                cropped.extend_from_slice(&padded[start..start + self.crop_w]);
            }
        }
        Tensor::from_vec(cropped, (c, self.crop_h, self.crop_w), tensor.dtype())
    }

    fn name(&self) -> &str {
        "random_crop"
    }
}
