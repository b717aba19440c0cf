// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The rendered image, kept as floating-point RGBA until someone
//! wants to write it out.

use colour::Rgba;
use planes::{Pixel, Resolution};

/// A height x width grid of colours.  Row 0 is the row sampled at
/// the lowest imaginary value.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    resolution: Resolution,
    pixels: Vec<Rgba>,
}

impl Canvas {
    /// Wraps a row-major pixel buffer of exactly `resolution.len()`
    /// colours.
    pub(crate) fn new(resolution: Resolution, pixels: Vec<Rgba>) -> Self {
        assert_eq!(resolution.len(), pixels.len());
        Canvas { resolution, pixels }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.resolution.0
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.resolution.1
    }

    /// (height, width, channels), the way an array library would
    /// describe this buffer.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height(), self.width(), 4)
    }

    /// The colour at one pixel.
    pub fn get(&self, pixel: &Pixel) -> Rgba {
        self.pixels[pixel.1 * self.width() + pixel.0]
    }

    /// One row of colours.
    pub fn row(&self, row: usize) -> &[Rgba] {
        let start = row * self.width();
        &self.pixels[start..start + self.width()]
    }

    /// Rows from the lowest imaginary value to the highest.
    pub fn rows(&self) -> ::std::slice::Chunks<Rgba> {
        self.pixels.chunks(self.width())
    }

    /// Every colour, row after row.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}
