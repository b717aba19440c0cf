// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything a render needs to know, gathered into one value that
//! is passed down the pipeline.

use errors::{RenderError, Result};
use planes::{Domain, Resolution};

/// Default number of sample columns.
pub const DEFAULT_WIDTH: usize = 1200;
/// Default number of sample rows.
pub const DEFAULT_HEIGHT: usize = 800;
/// Default iteration budget.
pub const DEFAULT_MAX_ITER: usize = 50;
/// Default left edge of the complex plane.
pub const DEFAULT_REAL_MIN: f64 = -2.0;
/// Default right edge of the complex plane.
pub const DEFAULT_REAL_MAX: f64 = 1.0;
/// Default bottom edge of the complex plane.
pub const DEFAULT_IMAG_MIN: f64 = -1.2;
/// Default top edge of the complex plane.
pub const DEFAULT_IMAG_MAX: f64 = 1.2;

/// The parameters of a single render.  Once validated, this object
/// should not be mutated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Sample columns and rows.  Defaults to 1200x800.
    pub resolution: Resolution,
    /// The sampled rectangle.  Defaults to [-2, 1] x [-1.2, 1.2].
    pub domain: Domain,
    /// Iterations before a point is declared bounded.  Defaults to
    /// 50, and must be at least 2 so escape indices can be
    /// normalized.
    pub max_iter: usize,
    /// Worker threads used by the evaluator.  Defaults to 1.
    pub threads: usize,
    /// Stop iterating once every point has escaped.  Defaults to
    /// true; turning it off never changes the result.
    pub early_exit: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            resolution: Resolution(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            domain: Domain {
                real_min: DEFAULT_REAL_MIN,
                real_max: DEFAULT_REAL_MAX,
                imag_min: DEFAULT_IMAG_MIN,
                imag_max: DEFAULT_IMAG_MAX,
            },
            max_iter: DEFAULT_MAX_ITER,
            threads: 1,
            early_exit: true,
        }
    }
}

impl RenderConfig {
    /// Checks every field, reporting the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.resolution.is_empty() {
            return Err(RenderError::InvalidConfiguration(format!(
                "resolution must be positive, got {}x{}",
                self.resolution.0, self.resolution.1
            )));
        }
        if self.max_iter < 2 {
            return Err(RenderError::InvalidConfiguration(format!(
                "max_iter must be at least 2, got {}",
                self.max_iter
            )));
        }
        if self.threads == 0 {
            return Err(RenderError::InvalidConfiguration(
                "thread count must be positive".to_string(),
            ));
        }
        self.domain.validate()
    }
}
