//! Resampling of the section columns on a regular depth axis

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::{
    depth::PixelDepthField,
    raster::{Raster, RasterError, CHANNELS},
};

#[derive(thiserror::Error, Debug)]
pub enum ResampleError {
    #[error("the depth field is {depth:?} (rows, columns) but the raster is {raster:?}")]
    ShapeMismatch {
        depth: (usize, usize),
        raster: (usize, usize),
    },
    #[error("no output rows for a maximum depth of {0}")]
    EmptyOutput(f64),
    #[error("invalid maximum depth {0}")]
    Depth(f64),
    #[error("a {rows}x{cols} depth raster is too large")]
    TooLarge { rows: usize, cols: usize },
    #[error("Failed to assemble the depth raster")]
    Raster(#[from] RasterError),
}
type Result<T> = std::result::Result<T, ResampleError>;

/// Number of rows of the depth section that keeps the pixel aspect ratio
///
/// `round(cols / xmax * zlim)`
pub fn output_rows(cols: usize, xmax: f64, zlim: f64) -> usize {
    (cols as f64 / xmax * zlim).round() as usize
}

/// Linear interpolation of `(xp, fp)` at `x`, clamped to the end values
///
/// `xp` is sorted in ascending order and is not empty.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    let k = xp.partition_point(|&xk| xk <= x);
    let (x0, x1) = (xp[k - 1], xp[k]);
    fp[k - 1] + (fp[k] - fp[k - 1]) * (x - x0) / (x1 - x0)
}

/// Rounds to the nearest 8-bit value, saturating at 0 and 255
#[inline]
fn to_u8(value: f64) -> u8 {
    value.clamp(0f64, 255f64).round() as u8
}

/// Resampler from per-pixel depths to `rows` regular depths in `[0, zlim)`
#[derive(Debug, Clone, Copy)]
pub struct ColumnResampler {
    zlim: f64,
    rows: usize,
    progress: bool,
}
impl ColumnResampler {
    pub fn new(zlim: f64, rows: usize) -> Result<Self> {
        if !(zlim.is_finite() && zlim > 0f64) {
            return Err(ResampleError::Depth(zlim));
        }
        if rows == 0 {
            return Err(ResampleError::EmptyOutput(zlim));
        }
        // raster sides are u32 for the image codecs
        if rows > u32::MAX as usize {
            return Err(ResampleError::TooLarge { rows, cols: 0 });
        }
        Ok(Self {
            zlim,
            rows,
            progress: false,
        })
    }
    /// Displays a progress bar over the columns
    pub fn progress(self, progress: bool) -> Self {
        Self { progress, ..self }
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    /// Depths of the output rows
    pub fn depths(&self) -> impl Iterator<Item = f64> {
        let dz = self.zlim / self.rows as f64;
        (0..self.rows).map(move |row| row as f64 * dz)
    }
    /// Resamples one column
    ///
    /// `depths` and `pixels` run down the source column. Samples without a
    /// finite depth are discarded; a column without any valid sample is
    /// transparent.
    pub fn resample_column(
        &self,
        depths: impl Iterator<Item = f64>,
        pixels: impl Iterator<Item = [u8; CHANNELS]>,
    ) -> Vec<[u8; CHANNELS]> {
        let mut samples: Vec<(f64, [u8; CHANNELS])> = depths
            .zip(pixels)
            .filter(|(depth, _)| depth.is_finite())
            .collect();
        if samples.is_empty() {
            return vec![[0u8; CHANNELS]; self.rows];
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        let xp: Vec<f64> = samples.iter().map(|(depth, _)| *depth).collect();
        let fp: Vec<Vec<f64>> = (0..CHANNELS)
            .map(|ch| samples.iter().map(|(_, px)| px[ch] as f64).collect())
            .collect();
        self.depths()
            .map(|z| {
                let mut px = [0u8; CHANNELS];
                px.iter_mut()
                    .zip(&fp)
                    .for_each(|(value, fp)| *value = to_u8(interp(z, &xp, fp)));
                px
            })
            .collect()
    }
    /// Resamples every column of `raster` from the depths in `field`
    pub fn resample(&self, field: &PixelDepthField, raster: &Raster) -> Result<Raster> {
        let (rows, cols) = field.shape();
        if (rows, cols) != (raster.height(), raster.width()) {
            return Err(ResampleError::ShapeMismatch {
                depth: (rows, cols),
                raster: (raster.height(), raster.width()),
            });
        }
        let too_large = || ResampleError::TooLarge {
            rows: self.rows,
            cols,
        };
        let len = self
            .rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(too_large)?;
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(len).map_err(|_| too_large())?;
        data.resize(len, 0u8);
        let column =
            |col: usize| self.resample_column(field.column(col), raster.column(col));
        let columns: Vec<Vec<[u8; CHANNELS]>> = if self.progress {
            let pb = ProgressBar::new(cols as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} columns")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            (0..cols)
                .into_par_iter()
                .progress_with(pb)
                .map(&column)
                .collect()
        } else {
            (0..cols).into_par_iter().map(&column).collect()
        };
        let n_empty = (0..cols)
            .filter(|&col| field.column(col).all(|depth| !depth.is_finite()))
            .count();
        if n_empty > 0 {
            log::warn!("{} columns are outside the velocity model", n_empty);
        }
        for (col, pixels) in columns.into_iter().enumerate() {
            for (row, px) in pixels.into_iter().enumerate() {
                let k = (row * cols + col) * CHANNELS;
                data[k..k + CHANNELS].copy_from_slice(&px);
            }
        }
        Ok(Raster::from_rgba(cols, self.rows, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolant::OUT_OF_HULL;
    use rand::Rng;

    #[test]
    fn row_count() {
        assert_eq!(output_rows(10, 1000., 2000.), 20);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let cols = rng.gen_range(1..2000usize);
            let xmax = rng.gen_range(1e-3..1e4);
            let zlim = rng.gen_range(1e-3..1e4);
            assert_eq!(
                output_rows(cols, xmax, zlim),
                (cols as f64 / xmax * zlim).round() as usize
            );
        }
    }

    #[test]
    fn interp_clamps_at_both_ends() {
        let xp = [1., 2., 4.];
        let fp = [10., 20., 0.];
        assert_eq!(interp(0., &xp, &fp), 10.);
        assert_eq!(interp(1.5, &xp, &fp), 15.);
        assert_eq!(interp(2., &xp, &fp), 20.);
        assert_eq!(interp(3., &xp, &fp), 10.);
        assert_eq!(interp(9., &xp, &fp), 0.);
        assert_eq!(interp(5., &[3.], &[7.]), 7.);
    }

    #[test]
    fn zero_rows_is_an_error() {
        assert!(matches!(
            ColumnResampler::new(1., 0),
            Err(ResampleError::EmptyOutput(_))
        ));
        assert!(matches!(
            ColumnResampler::new(-1., 3),
            Err(ResampleError::Depth(_))
        ));
    }

    #[test]
    fn oversized_output_is_an_error() {
        let rows = output_rows(10, 1000., 1e25);
        assert_eq!(rows, usize::MAX);
        assert!(matches!(
            ColumnResampler::new(1e25, rows),
            Err(ResampleError::TooLarge { .. })
        ));
        assert!(ColumnResampler::new(1e25, u32::MAX as usize).is_ok());
    }

    #[test]
    fn unsorted_depths_are_sorted() {
        let resampler = ColumnResampler::new(4., 4).unwrap();
        let depths = [3., 0., 2., 1.];
        let pixels = [[30, 0, 0, 255], [0, 0, 0, 255], [20, 0, 0, 255], [10, 0, 0, 255]];
        let column = resampler.resample_column(depths.into_iter(), pixels.into_iter());
        let red: Vec<u8> = column.iter().map(|px| px[0]).collect();
        assert_eq!(red, vec![0, 10, 20, 30]);
    }

    #[test]
    fn sentinel_depths_are_excluded() {
        let resampler = ColumnResampler::new(4., 8).unwrap();
        // a sentinel inside the column must not drag its neighbours
        let depths = [0., OUT_OF_HULL, 4., f64::NAN];
        let pixels = [[0, 0, 0, 0], [255, 255, 255, 255], [200, 100, 40, 255], [255; 4]];
        let column = resampler.resample_column(depths.into_iter(), pixels.into_iter());
        assert_eq!(column.len(), 8);
        // z = 0, 0.5, ..., 3.5 along the segment from 0 to 4
        for (row, px) in column.iter().enumerate() {
            let z = row as f64 * 0.5;
            assert_eq!(px[0], (50. * z).round() as u8);
            assert_eq!(px[1], (25. * z).round() as u8);
            assert_eq!(px[2], (10. * z).round() as u8);
            assert_eq!(px[3], (63.75 * z).round() as u8);
        }
    }

    #[test]
    fn out_of_hull_column_is_transparent() {
        let resampler = ColumnResampler::new(10., 5).unwrap();
        let depths = [OUT_OF_HULL; 3];
        let pixels = [[255; 4]; 3];
        let column = resampler.resample_column(depths.into_iter(), pixels.into_iter());
        assert_eq!(column, vec![[0u8; 4]; 5]);
    }

    #[test]
    fn channel_range() {
        let mut rng = rand::thread_rng();
        let resampler = ColumnResampler::new(100., 64).unwrap();
        for _ in 0..50 {
            let depths: Vec<f64> = (0..32).map(|_| rng.gen_range(-10. ..120.)).collect();
            let pixels: Vec<[u8; 4]> = (0..32).map(|_| rng.gen()).collect();
            let column = resampler.resample_column(depths.into_iter(), pixels.iter().cloned());
            let (lo, hi) = pixels.iter().flatten().fold((255u8, 0u8), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
            assert!(column.iter().flatten().all(|&v| v >= lo && v <= hi));
        }
    }
}
