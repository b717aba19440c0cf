// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns escape counts into colours.  The colormap itself is opaque:
//! anything that maps [0, 1] to an RGBA value will do, whether a
//! closure or one of the named gradients.

use std::fmt;
use std::str::FromStr;

use colorgrad;

use canvas::Canvas;
use errors::{RenderError, Result};
use escape::EscapeCounts;

/// A colour with red, green, blue and alpha channels, each in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgba(pub f64, pub f64, pub f64, pub f64);

impl Rgba {
    /// Opaque black, reserved for points that never escaped.
    pub const BLACK: Rgba = Rgba(0.0, 0.0, 0.0, 1.0);

    /// The same colour with every channel pulled into [0, 1].
    pub fn clamped(&self) -> Rgba {
        let c = |v: f64| v.max(0.0).min(1.0);
        Rgba(c(self.0), c(self.1), c(self.2), c(self.3))
    }

    /// Quantizes each channel to a byte, clamping stray values.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let Rgba(r, g, b, a) = self.clamped();
        let q = |v: f64| (v * 255.0).round() as u8;
        [q(r), q(g), q(b), q(a)]
    }
}

/// A continuous function from a normalized scalar to a colour.
pub trait Colormap {
    /// The colour for `t`, which is always within [0, 1].
    fn colour(&self, t: f64) -> Rgba;
}

impl<F> Colormap for F
where
    F: Fn(f64) -> Rgba,
{
    fn colour(&self, t: f64) -> Rgba {
        self(t)
    }
}

impl Colormap for colorgrad::Gradient {
    fn colour(&self, t: f64) -> Rgba {
        // Interpolation can land a hair outside [0, 1].
        let c = self.at(t);
        Rgba(c.r, c.g, c.b, c.a).clamped()
    }
}

/// The named gradients available from the command line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Palette {
    /// Black through purple and orange to pale yellow.
    Inferno,
    /// Black through purple to pale pink.
    Magma,
    /// Blue through purple to yellow.
    Plasma,
    /// Purple through teal to yellow.
    Viridis,
    /// Blue through grey to yellow, colour-vision friendly.
    Cividis,
    /// A rainbow with perceptual corrections.
    Turbo,
}

impl Palette {
    /// Every accepted name, in display order.
    pub const NAMES: &'static [&'static str] =
        &["inferno", "magma", "plasma", "viridis", "cividis", "turbo"];

    /// Builds the gradient for this palette.
    pub fn gradient(&self) -> colorgrad::Gradient {
        match *self {
            Palette::Inferno => colorgrad::inferno(),
            Palette::Magma => colorgrad::magma(),
            Palette::Plasma => colorgrad::plasma(),
            Palette::Viridis => colorgrad::viridis(),
            Palette::Cividis => colorgrad::cividis(),
            Palette::Turbo => colorgrad::turbo(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Inferno
    }
}

impl FromStr for Palette {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inferno" => Ok(Palette::Inferno),
            "magma" => Ok(Palette::Magma),
            "plasma" => Ok(Palette::Plasma),
            "viridis" => Ok(Palette::Viridis),
            "cividis" => Ok(Palette::Cividis),
            "turbo" => Ok(Palette::Turbo),
            _ => Err(RenderError::InvalidConfiguration(format!(
                "unknown colormap '{}', expected one of {}",
                s,
                Palette::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Palette::Inferno => "inferno",
            Palette::Magma => "magma",
            Palette::Plasma => "plasma",
            Palette::Viridis => "viridis",
            Palette::Cividis => "cividis",
            Palette::Turbo => "turbo",
        };
        f.write_str(name)
    }
}

/// Maps escape counts to colours.  Counts are normalized against
/// `max_iter - 1`, the largest escape index; the `max_iter` sentinel
/// is painted black whatever the colormap says.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorMapper {
    max_iter: usize,
}

impl ColorMapper {
    /// Refuses budgets below 2, where normalization would divide by
    /// zero.
    pub fn new(max_iter: usize) -> Result<Self> {
        if max_iter < 2 {
            return Err(RenderError::InvalidConfiguration(format!(
                "colour mapping needs max_iter of at least 2, got {}",
                max_iter
            )));
        }
        Ok(ColorMapper { max_iter })
    }

    /// Position of a count along the colormap.
    pub fn normalize(&self, count: usize) -> f64 {
        let t = (count as f64) / ((self.max_iter - 1) as f64);
        t.max(0.0).min(1.0)
    }

    /// The colour of a single count.
    pub fn colour_of<M: Colormap + ?Sized>(&self, count: usize, colormap: &M) -> Rgba {
        if count == self.max_iter {
            Rgba::BLACK
        } else {
            colormap.colour(self.normalize(count))
        }
    }

    /// Paints every count.  The counts must have been computed with
    /// the same budget as this mapper.
    pub fn colorize<M: Colormap + ?Sized>(&self, counts: &EscapeCounts, colormap: &M) -> Canvas {
        debug_assert_eq!(counts.max_iter(), self.max_iter);
        let pixels = counts
            .as_slice()
            .iter()
            .map(|&count| self.colour_of(count, colormap))
            .collect();
        Canvas::new(counts.resolution(), pixels)
    }
}
