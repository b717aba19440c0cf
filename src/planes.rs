// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the SampleGrid, which describes a relationship between a
//! rectangle on the integral plane with an origin at 0,0, and a
//! rectangle on the complex plane bounded by a Domain.  Every pixel
//! of the integral plane gets exactly one complex sample.

use itertools::iproduct;
use num::Complex;

use errors::{RenderError, Result};

/// Describes the width and height of an integral plane that is
/// assumed to start at 0,0.  Width is the number of sample columns,
/// height the number of sample rows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution(pub usize, pub usize);

impl Resolution {
    /// The total number of samples.
    pub fn len(&self) -> usize {
        self.0 * self.1
    }

    /// A resolution with no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.0 == 0 || self.1 == 0
    }
}

/// Describes the x, y of a sample in the integral plane: column
/// first, then row.  Row 0 holds the lowest imaginary value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane being sampled, treating the
/// real part as the x-component and the imaginary part as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Domain {
    /// Left edge.
    pub real_min: f64,
    /// Right edge.
    pub real_max: f64,
    /// Bottom edge.
    pub imag_min: f64,
    /// Top edge.
    pub imag_max: f64,
}

impl Domain {
    /// Constructor.  Refuses rectangles that are inverted, have no
    /// area, or are not finite.
    pub fn new(real_min: f64, real_max: f64, imag_min: f64, imag_max: f64) -> Result<Domain> {
        let domain = Domain {
            real_min,
            real_max,
            imag_min,
            imag_max,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// The domain spanned by a left-lower and a right-upper corner.
    pub fn from_corners(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<Domain> {
        Domain::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im)
    }

    /// Checks the bounds.  Public fields mean a Domain can be built
    /// without `new`, so the grid builder checks again.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.real_min, self.real_max, self.imag_min, self.imag_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(RenderError::InvalidDomain(format!(
                "bounds must be finite, got {:?}",
                bounds
            )));
        }

        if self.real_min >= self.real_max {
            return Err(RenderError::InvalidDomain(format!(
                "real_min ({}) must be less than real_max ({})",
                self.real_min, self.real_max
            )));
        }

        if self.imag_min >= self.imag_max {
            return Err(RenderError::InvalidDomain(format!(
                "imag_min ({}) must be less than imag_max ({})",
                self.imag_min, self.imag_max
            )));
        }

        let spans = [self.real_max - self.real_min, self.imag_max - self.imag_min];
        if spans.iter().any(|s| !s.is_finite()) {
            return Err(RenderError::InvalidDomain(format!(
                "width and height of the domain must be finite, got {:?}",
                spans
            )));
        }
        Ok(())
    }

    /// Whether a point lies inside the rectangle, edges included.
    pub fn contains(&self, point: &Complex<f64>) -> bool {
        point.re >= self.real_min
            && point.re <= self.real_max
            && point.im >= self.imag_min
            && point.im <= self.imag_max
    }
}

// `count` evenly spaced values from `min` to `max` inclusive.  A
// single sample sits on `min`; the last sample is pinned to `max` so
// accumulated rounding never moves the far edge.
fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![min];
    }
    let step = (max - min) / ((count - 1) as f64);
    (0..count)
        .map(|i| {
            if i == count - 1 {
                max
            } else {
                min + (i as f64) * step
            }
        })
        .collect()
}

/// One complex sample per pixel, stored row-major.  Immutable once
/// built.
#[derive(Clone, Debug)]
pub struct SampleGrid {
    /// The integral plane.
    pub resolution: Resolution,
    /// The complex plane.
    pub domain: Domain,
    real_axis: Vec<f64>,
    imag_axis: Vec<f64>,
    points: Vec<Complex<f64>>,
}

impl SampleGrid {
    /// Constructor.  Samples `width` real values and `height`
    /// imaginary values, then combines them so that
    /// `grid[row, col] = real[col] + i * imag[row]`.
    pub fn build(domain: Domain, resolution: Resolution) -> Result<SampleGrid> {
        if resolution.0 == 0 {
            return Err(RenderError::InvalidConfiguration(
                "width must be positive".to_string(),
            ));
        }
        if resolution.1 == 0 {
            return Err(RenderError::InvalidConfiguration(
                "height must be positive".to_string(),
            ));
        }
        domain.validate()?;

        let real_axis = linspace(domain.real_min, domain.real_max, resolution.0);
        let imag_axis = linspace(domain.imag_min, domain.imag_max, resolution.1);
        let points = iproduct!(imag_axis.iter(), real_axis.iter())
            .map(|(&im, &re)| Complex::new(re, im))
            .collect();

        Ok(SampleGrid {
            resolution,
            domain,
            real_axis,
            imag_axis,
            points,
        })
    }

    /// Number of sample columns.
    pub fn width(&self) -> usize {
        self.resolution.0
    }

    /// Number of sample rows.
    pub fn height(&self) -> usize {
        self.resolution.1
    }

    /// The total number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a grid that was successfully built.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The real value of every column.
    pub fn real_axis(&self) -> &[f64] {
        &self.real_axis
    }

    /// The imaginary value of every row.
    pub fn imag_axis(&self) -> &[f64] {
        &self.imag_axis
    }

    /// Every sample, row after row.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// Linear offset of a pixel from the root of the buffer.
    pub fn offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.width() + pixel.0
    }

    /// Given a pixel, return the complex sample taken there.
    pub fn point(&self, pixel: &Pixel) -> Complex<f64> {
        self.points[self.offset(pixel)]
    }

    /// Given a complex number, find the pixel whose sample is closest
    /// to it.  Points outside the domain have no pixel.
    pub fn nearest_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        if !self.domain.contains(point) {
            return None;
        }
        let column = nearest_index(self.domain.real_min, self.domain.real_max, self.width(), point.re);
        let row = nearest_index(self.domain.imag_min, self.domain.imag_max, self.height(), point.im);
        Some(Pixel(column, row))
    }
}

fn nearest_index(min: f64, max: f64, count: usize, value: f64) -> usize {
    if count == 1 {
        return 0;
    }
    let step = (max - min) / ((count - 1) as f64);
    let index = ((value - min) / step).round() as usize;
    index.min(count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize, radius: f64) -> SampleGrid {
        SampleGrid::build(
            Domain::new(-radius, radius, -radius, radius).unwrap(),
            Resolution(size, size),
        )
        .unwrap()
    }

    #[test]
    fn domain_fails_on_bad_shape() {
        assert!(Domain::new(1.0, -1.0, -1.0, 1.0).is_err());
        assert!(Domain::new(-1.0, 1.0, 1.0, -1.0).is_err());
        assert!(Domain::new(-1.0, -1.0, -1.0, 1.0).is_err());
        assert!(Domain::new(-1.0, 1.0, 0.5, 0.5).is_err());
    }

    #[test]
    fn domain_fails_on_non_finite_bounds() {
        assert!(Domain::new(::std::f64::NAN, 1.0, -1.0, 1.0).is_err());
        assert!(Domain::new(-1.0, ::std::f64::INFINITY, -1.0, 1.0).is_err());
        assert!(Domain::new(-1.0e308, 1.0e308, -1.0, 1.0).is_err());
        assert!(Domain::new(-1.0, 1.0, -1.0e308, 1.0e308).is_err());
    }

    #[test]
    fn grid_over_a_huge_domain_has_no_nan_samples() {
        let grid = SampleGrid::build(
            Domain::new(-1.0e307, 1.0e307, -1.0e307, 1.0e307).unwrap(),
            Resolution(7, 5),
        )
        .unwrap();
        assert!(grid
            .points()
            .iter()
            .all(|p| p.re.is_finite() && p.im.is_finite()));
    }

    #[test]
    fn domain_passes_on_good_shape() {
        let d = Domain::from_corners(Complex::new(-2.0, -1.2), Complex::new(1.0, 1.2));
        assert_eq!(
            d,
            Ok(Domain {
                real_min: -2.0,
                real_max: 1.0,
                imag_min: -1.2,
                imag_max: 1.2
            })
        );
    }

    #[test]
    fn grid_fails_on_empty_resolution() {
        let d = Domain::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        match SampleGrid::build(d, Resolution(0, 4)) {
            Err(RenderError::InvalidConfiguration(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        match SampleGrid::build(d, Resolution(4, 0)) {
            Err(RenderError::InvalidConfiguration(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn grid_revalidates_hand_built_domains() {
        let d = Domain {
            real_min: 1.0,
            real_max: -1.0,
            imag_min: -1.0,
            imag_max: 1.0,
        };
        match SampleGrid::build(d, Resolution(4, 4)) {
            Err(RenderError::InvalidDomain(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn axes_include_both_ends() {
        let grid = SampleGrid::build(
            Domain::new(-2.0, 1.0, -1.2, 1.2).unwrap(),
            Resolution(10, 7),
        )
        .unwrap();
        assert_eq!(grid.real_axis().len(), 10);
        assert_eq!(grid.imag_axis().len(), 7);
        assert_eq!(grid.real_axis()[0], -2.0);
        assert_eq!(grid.real_axis()[9], 1.0);
        assert_eq!(grid.imag_axis()[0], -1.2);
        assert_eq!(grid.imag_axis()[6], 1.2);
        assert_eq!(grid.len(), 70);
    }

    #[test]
    fn single_sample_sits_on_minimum() {
        let grid = SampleGrid::build(
            Domain::new(-2.0, 1.0, -1.0, 1.0).unwrap(),
            Resolution(1, 1),
        )
        .unwrap();
        assert_eq!(grid.points(), &[Complex::new(-2.0, -1.0)]);
    }

    #[test]
    fn rows_are_imaginary_and_columns_are_real() {
        let grid = square(5, 2.0);
        assert_eq!(grid.point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(grid.point(&Pixel(4, 0)), Complex::new(2.0, -2.0));
        assert_eq!(grid.point(&Pixel(0, 4)), Complex::new(-2.0, 2.0));
        assert_eq!(grid.point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(grid.point(&Pixel(1, 3)), Complex::new(-1.0, 1.0));
        assert_eq!(grid.points()[3 * 5 + 1], Complex::new(-1.0, 1.0));
    }

    #[test]
    fn nearest_pixel_on_mixed_planes() {
        let grid = square(5, 2.0);
        assert_eq!(grid.nearest_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(2, 2)));
        assert_eq!(grid.nearest_pixel(&Complex::new(-2.0, -2.0)), Some(Pixel(0, 0)));
        assert_eq!(grid.nearest_pixel(&Complex::new(2.0, 2.0)), Some(Pixel(4, 4)));
        assert_eq!(grid.nearest_pixel(&Complex::new(0.9, -1.2)), Some(Pixel(3, 1)));
    }

    #[test]
    fn nearest_pixel_outside_the_domain() {
        let grid = square(5, 2.0);
        assert_eq!(grid.nearest_pixel(&Complex::new(2.5, 0.0)), None);
        assert_eq!(grid.nearest_pixel(&Complex::new(0.0, -2.01)), None);
    }

    #[test]
    fn nearest_pixel_maps_on_large_planes() {
        let grid = square(641, 2.0);
        assert_eq!(grid.nearest_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(320, 320)));
        assert_eq!(grid.nearest_pixel(&Complex::new(1.0, 2.0)), Some(Pixel(480, 640)));
    }
}
