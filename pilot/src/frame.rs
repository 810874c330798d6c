use derive_more::{Display, Error};

/// The width of the Gameboy's LCD, in pixels.
pub const SCREEN_WIDTH: u32 = 160;
/// The height of the Gameboy's LCD, in pixels.
pub const SCREEN_HEIGHT: u32 = 144;

/// A single capture of the emulator's screen. The pixel data is stored as RGBA with one byte per
/// channel, row by row from the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Display, Error)]
pub enum FrameError {
    #[display("a frame must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[display("a {width}x{height} frame needs {expected} bytes of RGBA data, got {actual}")]
    Size {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[display("could not encode frame as a PNG: {_0}")]
    Encode(png::EncodingError),
    #[display("could not decode PNG: {_0}")]
    Decode(png::DecodingError),
}

impl From<png::EncodingError> for FrameError {
    fn from(err: png::EncodingError) -> Self {
        Self::Encode(err)
    }
}

impl From<png::DecodingError> for FrameError {
    fn from(err: png::DecodingError) -> Self {
        Self::Decode(err)
    }
}

impl Frame {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = 4 * width as usize * height as usize;
        if rgba.len() != expected {
            return Err(FrameError::Size {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Decodes a PNG into a frame. Palette, greyscale, and 16-bit images are all normalized down
    /// to 8-bit RGBA.
    pub fn from_png(data: &[u8]) -> Result<Self, FrameError> {
        let mut decoder = png::Decoder::new(data);
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());
        let rgba = match info.color_type {
            png::ColorType::Rgba => buf,
            png::ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
                .collect(),
            png::ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            // Indexed images are expanded by the decoder, so only greyscale is left
            png::ColorType::Grayscale | png::ColorType::Indexed => {
                buf.iter().flat_map(|&g| [g, g, g, u8::MAX]).collect()
            }
        };
        Self::from_rgba(info.width, info.height, rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Returns a copy of the frame scaled up by an integer factor, preserving the original ratio.
    pub fn scaled(&self, scale: usize) -> Frame {
        let row_len = 4 * self.width as usize;
        if scale <= 1 || row_len == 0 {
            return self.clone();
        }
        let rgba = self
            .rgba
            .chunks_exact(row_len)
            .flat_map(|line| std::iter::repeat_n(line, scale))
            .flat_map(|line| line.chunks_exact(4))
            .flat_map(|pixel| std::iter::repeat_n(pixel, scale))
            .flatten()
            .copied()
            .collect();
        Frame {
            width: self.width * scale as u32,
            height: self.height * scale as u32,
            rgba,
        }
    }

    pub fn to_png(&self) -> Result<Vec<u8>, FrameError> {
        let mut digest = Vec::new();
        let mut encoder = png::Encoder::new(&mut digest, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.rgba)?;
        writer.finish()?;
        Ok(digest)
    }
}
