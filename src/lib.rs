//! # Seismic time to depth migration
//!
//! Converts a 2D seismic section recorded in time into a depth section,
//! given a depth-velocity model of the subsurface.
//!
//! The migration runs in four stages:
//!  1. the velocity model depths are converted into one-way travel times ([TimeField]),
//!  2. a piecewise-linear interpolant `(x, t) -> z` is fitted on the model nodes ([DepthInterpolant]),
//!  3. the depth of every pixel of the section is interpolated ([PixelDepthField]),
//!  4. every column of the section is resampled on a regular depth axis ([ColumnResampler]).
//!
//! Loading and saving images and velocity models is done at the boundary
//! of the pipeline with [Raster], [ModelLoader] and [RasterSink].

pub mod depth;
pub mod error;
pub mod interpolant;
pub mod migration;
pub mod raster;
pub mod resample;
pub mod velocity;

pub use depth::{Dimensions, PixelDepthField, TimeAxis};
pub use error::{Error, Result};
pub use interpolant::{is_out_of_hull, DepthInterpolant, ScatteredInterpolant, OUT_OF_HULL};
pub use migration::Migration;
pub use raster::{PngSink, Raster, RasterSink};
pub use resample::{output_rows, ColumnResampler};
pub use velocity::{Indexing, ModelLoader, TimeField, VelocityModel};

/// Migrates `section` with `model`
///
/// `dimensions` gives the width and the maximum time of the section and
/// `cutoff` the maximum depth of the result (the model maximum depth if `None`).
pub fn migrate(
    model: &VelocityModel,
    section: &Raster,
    dimensions: Dimensions,
    cutoff: Option<f64>,
) -> Result<Raster> {
    let migration = Migration::new(model, dimensions);
    match cutoff {
        Some(depth) => migration.cutoff(depth).run(section),
        None => migration.run(section),
    }
}
