// THEORY:
// The `PixelGrid` is the immutable input of a selection run: a width x height scene
// of `Pixel`s stored in row-major order. It is the only place where the size
// invariant is checked; every analyzer downstream indexes it without re-checking,
// so a malformed scene must be rejected here, before any computation starts.

use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{SelectionError, SelectionResult};

#[derive(Debug, Clone)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Wraps an already row-major pixel sequence. Fails when the sequence length
    /// differs from `width * height`. The position stored in each pixel is
    /// overwritten with its place in the sequence.
    pub fn new(width: u32, height: u32, mut pixels: Vec<Pixel>) -> SelectionResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| SelectionError::config("grid dimensions overflowed"))?;
        if pixels.len() != expected {
            return Err(SelectionError::InvalidGrid {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        if width > 0 {
            for (index, pixel) in pixels.iter_mut().enumerate() {
                pixel.col = (index % width as usize) as u32;
                pixel.row = (index / width as usize) as u32;
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a grid by asking `make` for every (x, y) in row-major order. The
    /// position stored in each pixel is overwritten with its grid position.
    pub fn from_fn<F>(width: u32, height: u32, mut make: F) -> Self
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let mut pixel = make(x, y);
                pixel.row = y;
                pixel.col = x;
                pixels.push(pixel);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Linear index of (x, y) in the row-major sequence.
    pub fn linear(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.linear(x, y))
    }

    /// Unchecked-by-contract access for callers iterating inside the grid bounds.
    pub(crate) fn at(&self, x: u32, y: u32) -> &Pixel {
        &self.pixels[self.linear(x, y)]
    }
}
