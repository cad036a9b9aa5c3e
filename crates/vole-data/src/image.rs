// Image — decoded raw images and their tensor form
//
// An `Image` holds interleaved 8-bit RGB pixels. `to_tensor` turns it into
// an `[H, W, C]` U8 tensor, with C chosen by a `Flag`:
//
//   Flag::Color     -> C = 3, pixels copied as-is
//   Flag::Grayscale -> C = 1, luma = 0.299 R + 0.587 G + 0.114 B
//
// With the `image` feature, `Image::open` and `Image::from_dynamic` bridge
// the `image` crate's decoders.

use vole_core::{DType, Error, Result, Tensor};

/// Colour mode used when converting an image into a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    /// Three channels, RGB order.
    #[default]
    Color,
    /// One luma channel.
    Grayscale,
}

impl Flag {
    /// Number of channels a tensor built with this flag has.
    pub fn channels(self) -> usize {
        match self {
            Flag::Color => 3,
            Flag::Grayscale => 1,
        }
    }
}

/// A decoded RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap interleaved RGB pixels (`width * height * 3` bytes, row-major).
    pub fn from_rgb(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width * height * 3;
        if pixels.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "{width}x{height} RGB image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Convert to an `[H, W, C]` U8 tensor.
    pub fn to_tensor(&self, flag: Flag) -> Result<Tensor> {
        let data: Vec<f64> = match flag {
            Flag::Color => self.pixels.iter().map(|&p| p as f64).collect(),
            Flag::Grayscale => self
                .pixels
                .chunks_exact(3)
                .map(|px| {
                    let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
                    (0.299 * r + 0.587 * g + 0.114 * b).round()
                })
                .collect(),
        };
        Tensor::from_vec(data, (self.height, self.width, flag.channels()), DType::U8)
    }
}

#[cfg(feature = "image")]
mod decode {
    use std::path::Path;

    use vole_core::{Error, Result};

    use super::Image;

    impl Image {
        /// Convert any decoded `image` crate image to RGB.
        pub fn from_dynamic(img: &::image::DynamicImage) -> Self {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            Self {
                width: width as usize,
                height: height as usize,
                pixels: rgb.into_raw(),
            }
        }

        /// Decode an image file.
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let img = ::image::open(path).map_err(|e| match e {
                ::image::ImageError::IoError(io) => Error::Io(io),
                other => Error::msg(format!("failed to decode {}: {other}", path.display())),
            })?;
            Ok(Self::from_dynamic(&img))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pixels() -> Image {
        Image::from_rgb(2, 1, vec![255, 0, 0, 10, 20, 30]).unwrap()
    }

    #[test]
    fn color_tensor_is_hwc() {
        let t = two_pixels().to_tensor(Flag::Color).unwrap();
        assert_eq!(t.dims(), &[1, 2, 3]);
        assert_eq!(t.dtype(), DType::U8);
        assert_eq!(t.to_f64_vec(), vec![255.0, 0.0, 0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn grayscale_uses_luma() {
        let t = two_pixels().to_tensor(Flag::Grayscale).unwrap();
        assert_eq!(t.dims(), &[1, 2, 1]);
        // 0.299 * 255 = 76.2; 0.299*10 + 0.587*20 + 0.114*30 = 18.15
        assert_eq!(t.to_f64_vec(), vec![76.0, 18.0]);
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(Image::from_rgb(2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn default_flag_is_color() {
        assert_eq!(Flag::default(), Flag::Color);
        assert_eq!(Flag::default().channels(), 3);
    }

    #[cfg(feature = "image")]
    #[test]
    fn from_dynamic_drops_alpha() {
        let rgba = ::image::RgbaImage::from_raw(1, 1, vec![1, 2, 3, 200]).unwrap();
        let img = Image::from_dynamic(&::image::DynamicImage::ImageRgba8(rgba));
        assert_eq!(img.to_tensor(Flag::Color).unwrap().to_f64_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn open_missing_file_is_io_error() {
        let err = Image::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
