use crate::{
    depth::DimensionsError, interpolant::InterpolantError, raster::RasterError,
    resample::ResampleError, velocity::VelocityError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `velocity` module")]
    Velocity(#[from] VelocityError),
    #[error("Error in the `interpolant` module")]
    Interpolant(#[from] InterpolantError),
    #[error("Error in the `depth` module")]
    Dimensions(#[from] DimensionsError),
    #[error("Error in the `raster` module")]
    Raster(#[from] RasterError),
    #[error("Error in the `resample` module")]
    Resample(#[from] ResampleError),
}
pub type Result<T> = std::result::Result<T, Error>;
