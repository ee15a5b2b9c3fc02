//! Texture decoding into CPU-side RGBA8 data ready for GPU upload.

use anyhow::{Context, Result};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Decode an image from its raw file bytes (PNG).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();
        log::debug!("Decoded texture {}x{} ({} bytes)", width, height, data.len());
        Ok(Self::new_rgba8(width, height, data))
    }

    /// 1x1 solid color, used when a material has no diffuse map so one
    /// pipeline serves textured and untextured meshes alike.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new_rgba8(1, 1, rgba.to_vec())
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_is_one_pixel() {
        let tex = TextureData::solid([255, 255, 255, 255]);
        assert_eq!((tex.width, tex.height), (1, 1));
        assert!(tex.is_valid());
    }

    #[test]
    fn decode_round_trips_a_generated_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .expect("encode png");

        let tex = TextureData::decode(&png).expect("decode png");
        assert_eq!((tex.width, tex.height), (2, 2));
        assert_eq!(&tex.data[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(TextureData::decode(b"not an image").is_err());
    }
}
