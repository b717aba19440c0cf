// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator.
//!
//! Every sample c starts an orbit at z = 0 and is iterated with
//! z = z^2 + c.  The whole grid advances one step at a time: a step
//! sweeps every point that is still active, and a point that leaves
//! the circle of radius 2 is frozen with the index of the step that
//! saw it leave.  Frozen points are never squared again, so runaway
//! values can't overflow into infinities or NaNs.
//!
//! Points that survive the whole budget keep the count `max_iter`,
//! which no real escape index can reach (those run 0..max_iter-1).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;

use crossbeam;
use itertools::izip;
use num::Complex;

use config::RenderConfig;
use errors::{RenderError, Result};
use planes::{Pixel, Resolution, SampleGrid};

/// |z|^2 above which a point has escaped; the square of radius 2.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

// One masked sweep over a run of points.  Returns how many are still
// active afterwards.
fn sweep(
    c: &[Complex<f64>],
    z: &mut [Complex<f64>],
    counts: &mut [usize],
    active: &mut [bool],
    step: usize,
) -> usize {
    let mut remaining = 0;
    for (c, z, count, active) in izip!(c, z.iter_mut(), counts.iter_mut(), active.iter_mut()) {
        if !*active {
            continue;
        }
        *z = *z * *z + c;
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            *count = step;
            *active = false;
        } else {
            remaining += 1;
        }
    }
    remaining
}

/// The per-point working arrays of an evaluation: the orbit value,
/// the escape count, and the active mask.  All three are allocated
/// once and reused for every step.
#[derive(Clone, Debug)]
pub struct EscapeState {
    z: Vec<Complex<f64>>,
    counts: Vec<usize>,
    active: Vec<bool>,
    max_iter: usize,
    step: usize,
    remaining: usize,
}

impl EscapeState {
    /// Every orbit at zero, every point active, every count at the
    /// `max_iter` sentinel.
    pub fn new(grid: &SampleGrid, max_iter: usize) -> Self {
        let len = grid.len();
        EscapeState {
            z: vec![Complex::new(0.0, 0.0); len],
            counts: vec![max_iter; len],
            active: vec![true; len],
            max_iter,
            step: 0,
            remaining: len,
        }
    }

    /// Runs the next step over every active point and returns how
    /// many remain active.  Once the budget is spent this does
    /// nothing.
    pub fn step(&mut self, grid: &SampleGrid) -> usize {
        debug_assert_eq!(grid.len(), self.z.len());
        if self.step >= self.max_iter {
            return self.remaining;
        }
        self.remaining = sweep(
            grid.points(),
            &mut self.z,
            &mut self.counts,
            &mut self.active,
            self.step,
        );
        self.step += 1;
        self.remaining
    }

    /// How many steps have been run.
    pub fn steps(&self) -> usize {
        self.step
    }

    /// Points still active after the last step.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether the budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.step >= self.max_iter
    }

    /// Current orbit values.
    pub fn z(&self) -> &[Complex<f64>] {
        &self.z
    }

    /// Current escape counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Current active mask.
    pub fn active(&self) -> &[bool] {
        &self.active
    }

    /// Freezes the state into its counts.
    pub fn into_counts(self, resolution: Resolution) -> EscapeCounts {
        EscapeCounts {
            resolution,
            max_iter: self.max_iter,
            steps: self.step,
            counts: self.counts,
        }
    }
}

/// The result of an evaluation: for every pixel, the step at which
/// its orbit escaped, or `max_iter` if it never did.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeCounts {
    resolution: Resolution,
    max_iter: usize,
    steps: usize,
    counts: Vec<usize>,
}

impl EscapeCounts {
    /// Width and height, matching the grid.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The budget the counts were computed with.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Steps actually run.  Smaller than `max_iter` when every point
    /// escaped early.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Count for one pixel.
    pub fn get(&self, pixel: &Pixel) -> usize {
        self.counts[pixel.1 * self.resolution.0 + pixel.0]
    }

    /// Whether a pixel's orbit stayed bounded for the whole budget.
    pub fn is_bounded(&self, pixel: &Pixel) -> bool {
        self.get(pixel) == self.max_iter
    }

    /// Number of pixels that never escaped.
    pub fn bounded_count(&self) -> usize {
        self.counts.iter().filter(|&&c| c == self.max_iter).count()
    }

    /// Every count, row after row.
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }
}

/// Drives an EscapeState to completion, on one thread or several.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluator {
    max_iter: usize,
    early_exit: bool,
    threads: usize,
}

impl Evaluator {
    /// A single-threaded evaluator with early exit enabled.  The
    /// budget must be at least one step.
    pub fn new(max_iter: usize) -> Result<Self> {
        if max_iter == 0 {
            return Err(RenderError::InvalidConfiguration(
                "max_iter must be positive".to_string(),
            ));
        }
        Ok(Evaluator {
            max_iter,
            early_exit: true,
            threads: 1,
        })
    }

    /// An evaluator matching a render configuration.
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        Ok(Evaluator::new(config.max_iter)?
            .early_exit(config.early_exit)
            .threads(config.threads))
    }

    /// Whether to stop once no point is active.
    pub fn early_exit(mut self, early_exit: bool) -> Self {
        self.early_exit = early_exit;
        self
    }

    /// How many workers to split the grid between.  Zero is treated
    /// as one.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// The iteration budget.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Computes the escape count of every sample in the grid.
    pub fn evaluate(&self, grid: &SampleGrid) -> EscapeCounts {
        debug!(
            "evaluating {}x{} samples, max_iter {}, {} thread(s)",
            grid.width(),
            grid.height(),
            self.max_iter,
            self.threads
        );
        let counts = if self.threads > 1 && grid.height() > 1 {
            self.evaluate_banded(grid)
        } else {
            self.evaluate_single(grid)
        };
        info!(
            "escape evaluation ran {} of {} steps; {} of {} points bounded",
            counts.steps(),
            self.max_iter,
            counts.bounded_count(),
            grid.len()
        );
        counts
    }

    fn evaluate_single(&self, grid: &SampleGrid) -> EscapeCounts {
        let mut state = EscapeState::new(grid, self.max_iter);
        while !state.is_exhausted() {
            let remaining = state.step(grid);
            if self.early_exit && remaining == 0 {
                break;
            }
        }
        state.into_counts(grid.resolution)
    }

    /// Splits the grid into bands of whole rows, one worker per band.
    /// Each worker publishes its band's active count and waits at a
    /// barrier, so every worker sees the same total and no band
    /// starts step i+1 before all bands have finished step i.
    fn evaluate_banded(&self, grid: &SampleGrid) -> EscapeCounts {
        let workers = self.threads.min(grid.height());
        let rows_per_band = (grid.height() + workers - 1) / workers;
        let band = rows_per_band * grid.width();
        let bands = (grid.len() + band - 1) / band;

        let mut state = EscapeState::new(grid, self.max_iter);
        let barrier = Barrier::new(bands);
        let remaining: Vec<AtomicUsize> = (0..bands).map(|_| AtomicUsize::new(0)).collect();
        let steps = AtomicUsize::new(0);
        let (max_iter, early_exit) = (self.max_iter, self.early_exit);

        {
            let EscapeState {
                ref mut z,
                ref mut counts,
                ref mut active,
                ..
            } = state;
            let (barrier, remaining, steps) = (&barrier, &remaining, &steps);
            let result = crossbeam::scope(|spawner| {
                let regions = izip!(
                    grid.points().chunks(band),
                    z.chunks_mut(band),
                    counts.chunks_mut(band),
                    active.chunks_mut(band)
                );
                for (slot, (c, z, counts, active)) in regions.enumerate() {
                    spawner.spawn(move |_| {
                        for i in 0..max_iter {
                            let left = sweep(c, z, counts, active, i);
                            remaining[slot].store(left, Ordering::SeqCst);
                            barrier.wait();
                            let total: usize =
                                remaining.iter().map(|r| r.load(Ordering::SeqCst)).sum();
                            barrier.wait();
                            if slot == 0 {
                                steps.store(i + 1, Ordering::SeqCst);
                            }
                            if early_exit && total == 0 {
                                break;
                            }
                        }
                    });
                }
            });
            if let Err(panic) = result {
                ::std::panic::resume_unwind(panic);
            }
        }

        state.step = steps.load(Ordering::SeqCst);
        state.remaining = remaining.iter().map(|r| r.load(Ordering::SeqCst)).sum();
        state.into_counts(grid.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planes::Domain;

    // Samples land exactly on -2, -1, 0, 1, 2 on both axes.
    fn unit_grid() -> SampleGrid {
        SampleGrid::build(Domain::new(-2.0, 2.0, -2.0, 2.0).unwrap(), Resolution(5, 5)).unwrap()
    }

    fn classic_grid(width: usize, height: usize) -> SampleGrid {
        SampleGrid::build(Domain::new(-2.0, 1.0, -1.2, 1.2).unwrap(), Resolution(width, height))
            .unwrap()
    }

    #[test]
    fn origin_never_escapes() {
        let grid = unit_grid();
        let counts = Evaluator::new(50).unwrap().evaluate(&grid);
        assert_eq!(counts.get(&Pixel(2, 2)), 50);
        assert!(counts.is_bounded(&Pixel(2, 2)));
    }

    #[test]
    fn far_corner_escapes_on_the_first_step() {
        let grid = unit_grid();
        let counts = Evaluator::new(50).unwrap().evaluate(&grid);
        assert_eq!(grid.point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
        assert_eq!(counts.get(&Pixel(4, 4)), 0);
    }

    #[test]
    fn minus_one_cycles_forever() {
        let grid = unit_grid();
        for &max_iter in &[1, 2, 7, 50, 1000] {
            let counts = Evaluator::new(max_iter).unwrap().evaluate(&grid);
            assert_eq!(counts.get(&Pixel(1, 2)), max_iter);
        }
    }

    #[test]
    fn modulus_of_exactly_two_has_not_escaped() {
        // c = 2: z goes 2, 6, ... and |2| is not greater than 2.
        // c = -2: z goes -2, 2, 2, ... and never leaves.
        let grid = unit_grid();
        let counts = Evaluator::new(50).unwrap().evaluate(&grid);
        assert_eq!(counts.get(&Pixel(4, 2)), 1);
        assert_eq!(counts.get(&Pixel(0, 2)), 50);
    }

    #[test]
    fn counts_stay_within_budget() {
        let grid = classic_grid(60, 40);
        let counts = Evaluator::new(30).unwrap().evaluate(&grid);
        assert_eq!(counts.resolution(), Resolution(60, 40));
        assert_eq!(counts.as_slice().len(), 60 * 40);
        assert!(counts.as_slice().iter().all(|&c| c <= 30));
        assert!(counts.bounded_count() > 0);
        assert!(counts.bounded_count() < 60 * 40);
    }

    #[test]
    fn escaped_points_are_frozen() {
        let grid = classic_grid(32, 24);
        let mut state = EscapeState::new(&grid, 40);
        let mut previous = state.clone();
        while !state.is_exhausted() {
            state.step(&grid);
            for i in 0..grid.len() {
                if !previous.active()[i] {
                    assert!(!state.active()[i]);
                    assert_eq!(state.z()[i], previous.z()[i]);
                    assert_eq!(state.counts()[i], previous.counts()[i]);
                } else if !state.active()[i] {
                    assert_eq!(state.counts()[i], state.steps() - 1);
                }
            }
            previous = state.clone();
        }
    }

    #[test]
    fn frozen_orbits_stay_finite() {
        let grid = SampleGrid::build(
            Domain::new(-1.0e150, 1.0e150, -1.0e150, 1.0e150).unwrap(),
            Resolution(9, 9),
        )
        .unwrap();
        let mut state = EscapeState::new(&grid, 200);
        while !state.is_exhausted() {
            state.step(&grid);
        }
        assert!(state.z().iter().all(|z| z.re.is_finite() && z.im.is_finite()));
    }

    #[test]
    fn step_after_budget_is_a_no_op() {
        let grid = unit_grid();
        let mut state = EscapeState::new(&grid, 2);
        state.step(&grid);
        state.step(&grid);
        let before = state.clone();
        state.step(&grid);
        assert_eq!(state.steps(), 2);
        assert_eq!(state.z(), before.z());
    }

    #[test]
    fn early_exit_stops_once_everything_escapes() {
        let grid = SampleGrid::build(Domain::new(3.0, 4.0, 3.0, 4.0).unwrap(), Resolution(4, 4))
            .unwrap();
        let eager = Evaluator::new(100).unwrap().evaluate(&grid);
        let patient = Evaluator::new(100).unwrap().early_exit(false).evaluate(&grid);
        assert_eq!(eager.steps(), 1);
        assert_eq!(patient.steps(), 100);
        assert_eq!(eager.as_slice(), patient.as_slice());
        assert_eq!(eager.bounded_count(), 0);
    }

    #[test]
    fn banded_evaluation_matches_single_thread() {
        let grid = classic_grid(37, 23);
        let single = Evaluator::new(64).unwrap().evaluate(&grid);
        for &threads in &[2, 3, 4, 23, 64] {
            let banded = Evaluator::new(64).unwrap().threads(threads).evaluate(&grid);
            assert_eq!(banded.as_slice(), single.as_slice());
            assert_eq!(banded.steps(), single.steps());
        }
    }

    #[test]
    fn banded_early_exit_matches_single_thread() {
        let grid = SampleGrid::build(Domain::new(2.5, 4.0, -1.0, 1.0).unwrap(), Resolution(8, 8))
            .unwrap();
        let single = Evaluator::new(100).unwrap().evaluate(&grid);
        let banded = Evaluator::new(100).unwrap().threads(4).evaluate(&grid);
        assert_eq!(banded, single);
        assert!(banded.steps() < 100);
    }

    #[test]
    fn zero_budget_is_refused() {
        assert!(Evaluator::new(0).is_err());
    }
}
