// Transform — ordered tensor pre-processing pipeline
//
// A Pipeline is an ordered list of steps. Each step takes a TensorList and
// returns a TensorList; steps run strictly left to right, the output of
// one becoming the input of the next. An empty pipeline is the identity.
//
// Most built-in operations act on one tensor (an image, a label). They
// implement `TensorOp` and are registered against a position in the list:
//
//   let mut p = Pipeline::new();
//   p.add(ToTensor)                        // tensor 0: HWC u8 -> CHW f32
//    .add(Normalize::new(vec![0.5; 3], vec![0.25; 3])?)
//    .add_at(1, Cast::new(DType::F32));    // tensor 1
//
// When a step rejects the shape it was handed, the error comes back as
// `Error::MalformedPipeline` naming the step, on the first call that hits it.

use std::sync::Arc;

use vole_core::{DType, Error, Result, Shape, Tensor, TensorList};

/// One pipeline step: tensor collection in, tensor collection out.
///
/// Steps are shared across worker threads and must not depend on earlier
/// calls. Randomised steps draw from a per-call thread-local RNG.
pub trait Transform: Send + Sync {
    fn apply(&self, tensors: TensorList) -> Result<TensorList>;

    /// Short name used in error messages.
    fn name(&self) -> &str;
}

/// An operation on a single tensor.
pub trait TensorOp: Send + Sync {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor>;

    fn name(&self) -> &str;
}

/// Runs a [`TensorOp`] on the tensor at one position of the list.
struct At<O> {
    index: usize,
    op: O,
}

impl<O: TensorOp> Transform for At<O> {
    fn apply(&self, mut tensors: TensorList) -> Result<TensorList> {
        let input = tensors.get(self.index).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "step targets tensor {} but the list holds {}",
                self.index,
                tensors.len()
            ))
        })?;
        let output = self.op.apply(input)?;
        tensors.replace(self.index, output)?;
        Ok(tensors)
    }

    fn name(&self) -> &str {
        self.op.name()
    }
}

// Pipeline

/// An ordered chain of transform steps.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append an operation on the first tensor.
    pub fn add<O: TensorOp + 'static>(&mut self, op: O) -> &mut Self {
        self.add_at(0, op)
    }

    /// Append an operation on the tensor at `index`.
    pub fn add_at<O: TensorOp + 'static>(&mut self, index: usize, op: O) -> &mut Self {
        self.steps.push(Arc::new(At { index, op }));
        self
    }

    /// Append a step that sees the whole tensor list.
    pub fn add_step(&mut self, step: Arc<dyn Transform>) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in registration order.
    pub fn apply(&self, mut tensors: TensorList) -> Result<TensorList> {
        for (i, step) in self.steps.iter().enumerate() {
            tensors = step.apply(tensors).map_err(|e| {
                if e.is_shape_error() || matches!(e, Error::InvalidConfig(_)) {
                    Error::MalformedPipeline {
                        step: i,
                        name: step.name().to_string(),
                        source: Box::new(e),
                    }
                } else {
                    e
                }
            })?;
        }
        Ok(tensors)
    }
}

impl Transform for Pipeline {
    fn apply(&self, tensors: TensorList) -> Result<TensorList> {
        Pipeline::apply(self, tensors)
    }

    fn name(&self) -> &str {
        "pipeline"
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|s| s.name()))
            .finish()
    }
}

fn expect_rank(tensor: &Tensor, rank: usize) -> Result<()> {
    if tensor.rank() != rank {
        return Err(Error::RankMismatch {
            expected: rank,
            got: tensor.rank(),
        });
    }
    Ok(())
}

/// `(C, H, W)` of a channel-first image tensor.
pub(crate) fn chw(tensor: &Tensor) -> Result<(usize, usize, usize)> {
    expect_rank(tensor, 3)?;
    let d = tensor.dims();
    Ok((d[0], d[1], d[2]))
}

// Built-in operations

/// Convert an `[H, W, C]` pixel tensor into a `[C, H, W]` `F32` tensor
/// with values scaled to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl TensorOp for ToTensor {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        expect_rank(tensor, 3)?;
        let chw = tensor.permute(&[2, 0, 1])?;
        Ok(chw.to_dtype(DType::F32).map(|v| v / 255.0))
    }

    fn name(&self) -> &str {
        "to_tensor"
    }
}

/// Per-channel standardisation of a `[C, H, W]` tensor:
/// `x' = (x - mean[c]) / std[c]`.
#[derive(Debug, Clone)]
pub struct Normalize {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl Normalize {
    /// Fails if the two vectors differ in length, are empty, or any std is 0.
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(Error::InvalidConfig(format!(
                "normalize: {} means for {} stds",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| s == 0.0) {
            return Err(Error::InvalidConfig("normalize: std must be non-zero".into()));
        }
        Ok(Self { mean, std })
    }
}

impl TensorOp for Normalize {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let (c, h, w) = chw(tensor)?;
        if c != self.mean.len() {
            return Err(Error::ShapeMismatch {
                expected: Shape::from((self.mean.len(), h, w)),
                got: tensor.shape().clone(),
            });
        }
        let plane = h * w;
        let src = tensor.as_slice();
        let mut out = Vec::with_capacity(src.len());
        for ch in 0..c {
            let (m, s) = (self.mean[ch], self.std[ch]);
            out.extend(src[ch * plane..(ch + 1) * plane].iter().map(|v| (v - m) / s));
        }
        let dtype = if tensor.dtype().is_float() {
            tensor.dtype()
        } else {
            DType::F32
        };
        Tensor::from_vec(out, tensor.shape(), dtype)
    }

    fn name(&self) -> &str {
        "normalize"
    }
}

/// Nearest-neighbour resize of a `[C, H, W]` tensor.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub height: usize,
    pub width: usize,
}

impl Resize {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

impl TensorOp for Resize {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let (c, h, w) = chw(tensor)?;
        if h == 0 || w == 0 {
            return Err(Error::ShapeMismatch {
                expected: Shape::from((c, self.height, self.width)),
                got: tensor.shape().clone(),
            });
        }
        let src = tensor.as_slice();
        let mut out = Vec::with_capacity(c * self.height * self.width);
        for ch in 0..c {
            for y in 0..self.height {
                let sy = y * h / self.height;
                for x in 0..self.width {
                    let sx = x * w / self.width;
                    out.push(src[ch * h * w + sy * w + sx]);
                }
            }
        }
        Tensor::from_vec(out, (c, self.height, self.width), tensor.dtype())
    }

    fn name(&self) -> &str {
        "resize"
    }
}

/// Crop the central `height x width` window of a `[C, H, W]` tensor.
#[derive(Debug, Clone, Copy)]
pub struct CenterCrop {
    pub height: usize,
    pub width: usize,
}

impl CenterCrop {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

impl TensorOp for CenterCrop {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let (_, h, w) = chw(tensor)?;
        let y0 = h.saturating_sub(self.height) / 2;
        let x0 = w.saturating_sub(self.width) / 2;
        tensor
            .narrow(1, y0, self.height)?
            .narrow(2, x0, self.width)
    }

    fn name(&self) -> &str {
        "center_crop"
    }
}

/// Reshape to a fixed shape without changing data.
///
/// Useful for turning flat `[784]` records into `[1, 28, 28]` images.
#[derive(Debug, Clone)]
pub struct Reshape {
    pub shape: Vec<usize>,
}

impl Reshape {
    pub fn new(shape: Vec<usize>) -> Self {
        Self { shape }
    }
}

impl TensorOp for Reshape {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        tensor.reshape(self.shape.clone())
    }

    fn name(&self) -> &str {
        "reshape"
    }
}

/// Convert to another dtype.
#[derive(Debug, Clone, Copy)]
pub struct Cast {
    pub dtype: DType,
}

impl Cast {
    pub fn new(dtype: DType) -> Self {
        Self { dtype }
    }
}

impl TensorOp for Cast {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        Ok(tensor.to_dtype(self.dtype))
    }

    fn name(&self) -> &str {
        "cast"
    }
}

/// One-hot encode integer class labels into a trailing axis of size
/// `num_classes`. Out-of-range classes encode as an all-zero row.
#[derive(Debug, Clone, Copy)]
pub struct OneHot {
    pub num_classes: usize,
}

impl OneHot {
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }
}

impl TensorOp for OneHot {
    fn apply(&self, tensor: &Tensor) -> Result<Tensor> {
        let mut out = vec![0.0; tensor.elem_count() * self.num_classes];
        for (i, &v) in tensor.as_slice().iter().enumerate() {
            let class = v as usize;
            if v >= 0.0 && class < self.num_classes {
                out[i * self.num_classes + class] = 1.0;
            }
        }
        let mut dims = tensor.dims().to_vec();
        dims.push(self.num_classes);
        Tensor::from_vec(out, dims, DType::F32)
    }

    fn name(&self) -> &str {
        "one_hot"
    }
}
