//! Depth of every pixel of a time section

use rayon::prelude::*;

use crate::interpolant::{is_out_of_hull, ScatteredInterpolant};

#[derive(thiserror::Error, Debug)]
pub enum DimensionsError {
    #[error("maximum x must be finite and positive, found {0}")]
    Xmax(f64),
    #[error("maximum time must be finite and positive, found {0}")]
    Tmax(f64),
}
type Result<T> = std::result::Result<T, DimensionsError>;

/// Travel time convention of the section vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeAxis {
    /// two-way time, halved to match the one-way time of the velocity model
    #[default]
    TwoWay,
    OneWay,
}
impl TimeAxis {
    /// Converts a time of this axis into a one-way time
    pub fn to_one_way(&self, time: f64) -> f64 {
        match self {
            TimeAxis::TwoWay => 0.5 * time,
            TimeAxis::OneWay => time,
        }
    }
}

/// Physical extent of a time section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    xmax: f64,
    tmax: f64,
    time_axis: TimeAxis,
}
impl Dimensions {
    /// Section `xmax` wide and `tmax` (two-way time) deep
    pub fn new(xmax: f64, tmax: f64) -> Result<Self> {
        if !(xmax.is_finite() && xmax > 0f64) {
            return Err(DimensionsError::Xmax(xmax));
        }
        if !(tmax.is_finite() && tmax > 0f64) {
            return Err(DimensionsError::Tmax(tmax));
        }
        Ok(Self {
            xmax,
            tmax,
            time_axis: TimeAxis::default(),
        })
    }
    pub fn time_axis(self, time_axis: TimeAxis) -> Self {
        Self { time_axis, ..self }
    }
    pub fn xmax(&self) -> f64 {
        self.xmax
    }
    pub fn tmax(&self) -> f64 {
        self.tmax
    }
    /// Maximum one-way time of the section
    pub fn owt_max(&self) -> f64 {
        self.time_axis.to_one_way(self.tmax)
    }
}

/// Depth of the pixels of a `rows x cols` section, row-major
///
/// Rows are still sampled in time, pixels outside the velocity model are
/// set to [OUT_OF_HULL](crate::interpolant::OUT_OF_HULL).
#[derive(Debug, Clone, PartialEq)]
pub struct PixelDepthField {
    rows: usize,
    cols: usize,
    depth: Vec<f64>,
}
impl PixelDepthField {
    /// Interpolates the depth at the `(x, t)` location of every pixel
    ///
    /// `x = col * xmax / cols` and `t = row * owt_max / rows`
    pub fn evaluate<I>(interpolant: &I, rows: usize, cols: usize, dimensions: &Dimensions) -> Self
    where
        I: ScatteredInterpolant + Sync,
    {
        let dx = dimensions.xmax() / cols as f64;
        let dt = dimensions.owt_max() / rows as f64;
        let mut depth = vec![0f64; rows * cols];
        depth
            .par_chunks_mut(cols.max(1))
            .enumerate()
            .for_each(|(row, depth_row)| {
                let t = row as f64 * dt;
                depth_row.iter_mut().enumerate().for_each(|(col, depth)| {
                    *depth = interpolant.evaluate_or_sentinel([col as f64 * dx, t]);
                });
            });
        let this = Self { rows, cols, depth };
        let n = this.n_out_of_hull();
        if n > 0 {
            log::warn!(
                "{} pixels out of {} are outside the velocity model",
                n,
                this.depth.len()
            );
        }
        this
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    /// Iterates down the depths of column `col`
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.depth.iter().skip(col).step_by(self.cols).cloned()
    }
    /// Number of pixels outside the velocity model
    pub fn n_out_of_hull(&self) -> usize {
        self.depth.iter().filter(|&&d| is_out_of_hull(d)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolant::DepthInterpolant;
    use crate::velocity::tests::constant_velocity;

    #[test]
    fn dimensions_are_validated() {
        assert!(matches!(
            Dimensions::new(0., 1.),
            Err(DimensionsError::Xmax(_))
        ));
        assert!(matches!(
            Dimensions::new(1., f64::NAN),
            Err(DimensionsError::Tmax(_))
        ));
    }

    #[test]
    fn two_way_time_is_halved() {
        let dims = Dimensions::new(1000., 2.).unwrap();
        assert_eq!(dims.owt_max(), 1.);
        assert_eq!(dims.time_axis(TimeAxis::OneWay).owt_max(), 2.);
    }

    #[test]
    fn pixel_depths() {
        let model = constant_velocity(2000.);
        let time = model.to_time_field();
        let interpolant = DepthInterpolant::from_model(&model, &time).unwrap();
        let dims = Dimensions::new(1000., 2.).unwrap();
        let field = PixelDepthField::evaluate(&interpolant, 10, 10, &dims);
        assert_eq!(field.shape(), (10, 10));
        assert_eq!(field.n_out_of_hull(), 0);
        for col in 0..10 {
            let depths: Vec<f64> = field.column(col).collect();
            for (row, depth) in depths.iter().enumerate() {
                // t = row * 0.1s, z = 2000 t
                assert!((depth - 200. * row as f64).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn one_way_section_below_the_model() {
        let model = constant_velocity(2000.);
        let time = model.to_time_field();
        let interpolant = DepthInterpolant::from_model(&model, &time).unwrap();
        let dims = Dimensions::new(1000., 2.)
            .unwrap()
            .time_axis(TimeAxis::OneWay);
        let field = PixelDepthField::evaluate(&interpolant, 10, 4, &dims);
        // rows 6..10 are deeper than 1s one-way time
        assert_eq!(field.n_out_of_hull(), 4 * 4);
        assert!(field.column(0).skip(6).all(is_out_of_hull));
        let depth = field.column(3).nth(5).unwrap();
        assert!((depth - 2000.).abs() < 1e-6);
    }
}
