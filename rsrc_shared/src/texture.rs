//! Texture payload.
//!
//! Textures are stored as ordinary compressed image files; decoding is
//! delegated to the `image` crate. The payload is the raw 8-bit pixel buffer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alloc::{Allocator, Grant};
use crate::codec::{Decode, ResourceKind};
use crate::error::{Result, RsrcError};

/// Texture decode settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureOptions {
    /// Store rows bottom-up, the order GPU uploads expect.
    pub flip_vertically: bool,
    /// Convert to this many channels (1-4). `None` keeps the file's count.
    pub channels: Option<u8>,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: true,
            channels: None,
        }
    }
}

/// Decoded 8-bit texture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Row-major, `width * height * channels` bytes.
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Channel values of the pixel at (`x`, `y`) in stored row order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = usize::from(self.channels);
        let start = (y as usize * self.width as usize + x as usize) * ch;
        self.pixels.get(start..start + ch)
    }
}

/// Converts in place when `channels` matches the decoded layout, so the
/// native case never holds two copies of the image.
fn pixels_with_channels(img: image::DynamicImage, channels: u8, flip: bool) -> Vec<u8> {
    use image::imageops::flip_vertical_in_place;

    macro_rules! convert {
        ($to:ident) => {{
            let mut buf = img.$to();
            if flip {
                flip_vertical_in_place(&mut buf);
            }
            buf.into_raw()
        }};
    }

    match channels {
        1 => convert!(into_luma8),
        2 => convert!(into_luma_alpha8),
        3 => convert!(into_rgb8),
        _ => convert!(into_rgba8),
    }
}

impl Decode for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;
    type Options = TextureOptions;

    fn decode(bytes: &[u8], options: &TextureOptions, alloc: &dyn Allocator) -> Result<Self> {
        if let Some(c) = options.channels {
            if !(1..=4).contains(&c) {
                return Err(RsrcError::InvalidPayload {
                    kind: ResourceKind::Texture,
                    reason: "channel count must be 1-4",
                });
            }
        }

        let img = image::load_from_memory(bytes).map_err(|e| {
            warn!(error = %e, "Texture decode failed");
            RsrcError::ImageDecode(e.to_string())
        })?;

        let (width, height) = (img.width(), img.height());
        let native = img.color().channel_count().clamp(1, 4);
        let size_with = |channels: u8| {
            (width as usize)
                .checked_mul(height as usize)
                .and_then(|texels| texels.checked_mul(usize::from(channels)))
                .ok_or(RsrcError::OutOfMemory { bytes: usize::MAX })
        };

        let mut grant = Grant::new(alloc, size_with(native)?)?;
        let channels = options.channels.unwrap_or(native);
        if channels != native {
            grant.resize(size_with(channels)?)?;
        }

        let pixels = pixels_with_channels(img, channels, options.flip_vertically);
        grant.commit();
        Ok(Texture {
            width,
            height,
            channels,
            pixels,
        })
    }

    fn heap_bytes(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{BudgetAllocator, SystemAllocator};
    use std::io::Cursor;

    /// 2x2 RGB PNG: top row red, green; bottom row blue, white.
    fn png_2x2() -> Vec<u8> {
        let img = image::RgbImage::from_raw(
            2,
            2,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        )
        .unwrap();
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_native_channels_flipped() {
        let tex = Texture::decode(&png_2x2(), &TextureOptions::default(), &SystemAllocator).unwrap();
        assert_eq!((tex.width, tex.height, tex.channels), (2, 2, 3));
        assert_eq!(tex.pixels.len(), 12);
        // Bottom row of the file comes first.
        assert_eq!(tex.pixel(0, 0), Some(&[0, 0, 255][..]));
        assert_eq!(tex.pixel(1, 1), Some(&[0, 255, 0][..]));
        assert_eq!(tex.pixel(2, 0), None);
    }

    #[test]
    fn unflipped_keeps_file_order() {
        let opts = TextureOptions {
            flip_vertically: false,
            channels: None,
        };
        let tex = Texture::decode(&png_2x2(), &opts, &SystemAllocator).unwrap();
        assert_eq!(tex.pixel(0, 0), Some(&[255, 0, 0][..]));
    }

    #[test]
    fn forced_channels_reallocate() {
        let budget = BudgetAllocator::new(1024);
        let opts = TextureOptions {
            flip_vertically: false,
            channels: Some(4),
        };
        let tex = Texture::decode(&png_2x2(), &opts, &budget).unwrap();
        assert_eq!(tex.channels, 4);
        assert_eq!(tex.pixel(1, 0), Some(&[0, 255, 0, 255][..]));
        assert_eq!(budget.in_use(), 16);
        tex.release(&budget);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn native_gray_alpha_is_kept() {
        let img = image::GrayAlphaImage::from_raw(2, 1, vec![10, 255, 200, 128]).unwrap();
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();

        let budget = BudgetAllocator::new(1024);
        let tex = Texture::decode(out.get_ref(), &TextureOptions::default(), &budget).unwrap();
        assert_eq!((tex.width, tex.height, tex.channels), (2, 1, 2));
        assert_eq!(tex.pixels, vec![10, 255, 200, 128]);
        assert_eq!(budget.in_use(), 4);
    }

    #[test]
    fn garbage_is_image_decode_error() {
        assert!(matches!(
            Texture::decode(b"not an image", &TextureOptions::default(), &SystemAllocator),
            Err(RsrcError::ImageDecode(_))
        ));
    }

    #[test]
    fn invalid_channel_option() {
        let opts = TextureOptions {
            flip_vertically: true,
            channels: Some(5),
        };
        assert!(matches!(
            Texture::decode(&png_2x2(), &opts, &SystemAllocator),
            Err(RsrcError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn budget_refusal_is_out_of_memory() {
        let budget = BudgetAllocator::new(8);
        assert!(matches!(
            Texture::decode(&png_2x2(), &TextureOptions::default(), &budget),
            Err(RsrcError::OutOfMemory { bytes: 12 })
        ));
        assert_eq!(budget.in_use(), 0);
    }
}
