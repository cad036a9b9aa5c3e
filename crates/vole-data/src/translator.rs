// ImageTranslator — inference-time pre-processing of a single image
//
// Converts one raw image into a one-element tensor list using the
// configured colour flag, then runs it through a pipeline. No batching,
// no state carried between calls.

use vole_core::{Result, TensorList};

use crate::image::{Flag, Image};
use crate::transform::Pipeline;

/// Configuration for [`ImageTranslator`].
#[derive(Debug, Clone, Default)]
pub struct ImageTranslatorConfig {
    /// Colour mode of the input tensor (default: [`Flag::Color`]).
    pub flag: Flag,
    /// Pre-processing applied to the `[H, W, C]` tensor (default: empty).
    pub pipeline: Pipeline,
}

impl ImageTranslatorConfig {
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flag = flag;
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// Turns raw images into network-ready tensor lists.
#[derive(Debug, Clone, Default)]
pub struct ImageTranslator {
    flag: Flag,
    pipeline: Pipeline,
}

impl ImageTranslator {
    pub fn new(config: ImageTranslatorConfig) -> Self {
        Self {
            flag: config.flag,
            pipeline: config.pipeline,
        }
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Convert `image` and run the pipeline over it.
    pub fn process_input(&self, image: &Image) -> Result<TensorList> {
        let tensor = image.to_tensor(self.flag)?;
        self.pipeline.apply(TensorList::single(tensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{CenterCrop, Normalize, ToTensor};
    use vole_core::{DType, Error};

    fn checker(size: usize) -> Image {
        let pixels = (0..size * size)
            .flat_map(|i| {
                let v = if i % 2 == 0 { 255 } else { 0 };
                [v, v, v]
            })
            .collect();
        Image::from_rgb(size, size, pixels).unwrap()
    }

    #[test]
    fn empty_pipeline_yields_raw_tensor() {
        let t = ImageTranslator::default();
        let out = t.process_input(&checker(2)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dims(), &[2, 2, 3]);
        assert_eq!(out[0].dtype(), DType::U8);
    }

    #[test]
    fn color_pipeline() {
        let mut p = Pipeline::new();
        p.add(ToTensor)
            .add(CenterCrop::new(2, 2))
            .add(Normalize::new(vec![0.5; 3], vec![0.5; 3]).unwrap());
        let t = ImageTranslator::new(ImageTranslatorConfig::default().pipeline(p));

        let out = t.process_input(&checker(4)).unwrap();
        let x = out.singleton().unwrap();
        assert_eq!(x.dims(), &[3, 2, 2]);
        assert_eq!(x.dtype(), DType::F32);
        for v in x.to_f64_vec() {
            assert!((v.abs() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn grayscale_flag_changes_channels() {
        let mut p = Pipeline::new();
        p.add(ToTensor);
        let t = ImageTranslator::new(
            ImageTranslatorConfig::default()
                .flag(Flag::Grayscale)
                .pipeline(p),
        );
        let out = t.process_input(&checker(2)).unwrap();
        assert_eq!(out[0].dims(), &[1, 2, 2]);
    }

    #[test]
    fn pipeline_mismatch_with_flag_is_configuration_error() {
        let mut p = Pipeline::new();
        p.add(ToTensor)
            .add(Normalize::new(vec![0.5; 3], vec![0.5; 3]).unwrap());
        let t = ImageTranslator::new(ImageTranslatorConfig {
            flag: Flag::Grayscale,
            pipeline: p,
        });
        let err = t.process_input(&checker(2)).unwrap_err();
        assert!(matches!(err, Error::MalformedPipeline { step: 1, .. }));
    }

    #[test]
    fn calls_are_independent() {
        let mut p = Pipeline::new();
        p.add(ToTensor);
        let t = ImageTranslator::new(ImageTranslatorConfig::default().pipeline(p));
        let a = t.process_input(&checker(2)).unwrap();
        let _ = t.process_input(&checker(4)).unwrap();
        let b = t.process_input(&checker(2)).unwrap();
        assert_eq!(a, b);
    }
}
