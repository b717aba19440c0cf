#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of complex numbers c for which the
//! orbit z -> z^2 + c, started at zero, stays within a circle of
//! radius two forever.  We can't iterate forever, so each point gets
//! a fixed budget of iterations; points still inside when the budget
//! runs out are treated as members of the set and painted black.
//!
//! Everything else escaped at some step, and the step at which it
//! escaped is its "velocity."  Points far from the set escape almost
//! immediately; points near the boundary linger.  Mapping that
//! velocity through a continuous colormap produces the familiar
//! glowing halo around the black heart.
//!
//! A render runs in three stages, strictly in order: build a grid of
//! complex samples (`planes`), find every sample's escape step
//! (`escape`), and paint the counts (`colour`).

extern crate colorgrad;
extern crate crossbeam;
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod canvas;
pub mod colour;
pub mod config;
pub mod errors;
pub mod escape;
pub mod planes;

pub use canvas::Canvas;
pub use colour::{ColorMapper, Colormap, Palette, Rgba};
pub use config::RenderConfig;
pub use errors::{RenderError, Result};
pub use escape::{EscapeCounts, EscapeState, Evaluator};
pub use planes::{Domain, Pixel, Resolution, SampleGrid};

/// Validates the configuration, then runs the whole pipeline and
/// returns the painted image.  Nothing survives between calls.
pub fn render<M: Colormap + ?Sized>(config: &RenderConfig, colormap: &M) -> Result<Canvas> {
    config.validate()?;
    let grid = SampleGrid::build(config.domain, config.resolution)?;
    debug!("built {} samples over {:?}", grid.len(), grid.domain);

    let counts = Evaluator::from_config(config)?.evaluate(&grid);
    let canvas = ColorMapper::new(config.max_iter)?.colorize(&counts, colormap);
    debug!(
        "painted {}x{} canvas, {} bounded points",
        canvas.width(),
        canvas.height(),
        counts.bounded_count()
    );
    Ok(canvas)
}
