//! Time to depth migration pipeline
//!
//! velocity model -> one-way time field -> `(x, t) -> z` interpolant ->
//! pixel depths -> depth resampled raster

use std::time::Instant;

use crate::{
    depth::{Dimensions, PixelDepthField},
    error::Result,
    interpolant::DepthInterpolant,
    raster::{Raster, RasterSink},
    resample::{output_rows, ColumnResampler},
    velocity::VelocityModel,
};

/// Migration of time sections with a given velocity model
///
/// ```no_run
/// use seismic_migration::{Dimensions, Migration, ModelLoader, PngSink, Raster};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = ModelLoader::new("velocity.npy").load()?;
/// let section = Raster::open("section.png")?;
/// let mut sink = PngSink::next_to("section.png");
/// Migration::new(&model, Dimensions::new(12_000., 4.)?)
///     .cutoff(5_000.)
///     .run_into(&section, &mut sink)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Migration<'a> {
    model: &'a VelocityModel,
    dimensions: Dimensions,
    cutoff: Option<f64>,
    progress: bool,
}
impl<'a> Migration<'a> {
    pub fn new(model: &'a VelocityModel, dimensions: Dimensions) -> Self {
        Self {
            model,
            dimensions,
            cutoff: None,
            progress: false,
        }
    }
    /// Maximum depth of the migrated section, the model depth by default
    pub fn cutoff(self, depth: f64) -> Self {
        Self {
            cutoff: Some(depth),
            ..self
        }
    }
    /// Displays a progress bar while resampling the columns
    pub fn progress(self, progress: bool) -> Self {
        Self { progress, ..self }
    }
    /// Maximum depth of the migrated section
    pub fn zlim(&self) -> f64 {
        self.cutoff.unwrap_or_else(|| self.model.max_depth())
    }
    /// Migrates a time section
    pub fn run(&self, section: &Raster) -> Result<Raster> {
        let now = Instant::now();
        let time = self.model.to_time_field();
        log::debug!("maximum one-way time: {}", time.max_time());
        let interpolant = DepthInterpolant::from_model(self.model, &time)?;
        let depths = PixelDepthField::evaluate(
            &interpolant,
            section.height(),
            section.width(),
            &self.dimensions,
        );
        let zlim = self.zlim();
        let rows = output_rows(section.width(), self.dimensions.xmax(), zlim);
        let migrated = ColumnResampler::new(zlim, rows)?
            .progress(self.progress)
            .resample(&depths, section)?;
        log::info!(
            "Depth migrated {}x{} section into {}x{} (down to {}) in {}ms",
            section.height(),
            section.width(),
            migrated.height(),
            migrated.width(),
            zlim,
            now.elapsed().as_millis()
        );
        Ok(migrated)
    }
    /// Migrates a time section and hands the result over to `sink`
    pub fn run_into<S>(&self, section: &Raster, sink: &mut S) -> Result<Raster>
    where
        S: RasterSink + ?Sized,
    {
        let migrated = self.run(section)?;
        sink.accept(&migrated)?;
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        interpolant::ScatteredInterpolant,
        raster::RasterError,
        resample::ResampleError,
        velocity::{tests::constant_velocity, Indexing, VelocityModel},
    };

    /// 10x10 section, red increases down the section, blue across
    fn section() -> Raster {
        let data = (0..10u8)
            .flat_map(|row| (0..10u8).flat_map(move |col| [20 * row, 255 - 20 * row, 10 * col, 255]))
            .collect();
        Raster::from_rgba(10, 10, data).unwrap()
    }

    #[test]
    fn constant_velocity_section() {
        let model = constant_velocity(2000.);
        let time = model.to_time_field();
        for profile in time.profiles() {
            assert_eq!(profile, &[0., 0.5, 1.0]);
        }
        let interpolant = DepthInterpolant::from_model(&model, &time).unwrap();
        assert!(interpolant.depth_at(0., 0.).abs() < 1e-9);
        assert!((interpolant.depth_at(500., 1.0) - 2000.).abs() < 1e-6);

        let dimensions = Dimensions::new(1000., 2.).unwrap();
        let migrated = Migration::new(&model, dimensions).run(&section()).unwrap();
        assert_eq!(migrated.height(), 20);
        assert_eq!(migrated.width(), 10);
        // source row r sits at depth 200r, output row k at depth 100k
        for col in 0..10 {
            assert_eq!(migrated.pixel(0, col), [0, 255, 10 * col as u8, 255]);
            assert_eq!(migrated.pixel(1, col), [10, 245, 10 * col as u8, 255]);
            assert_eq!(migrated.pixel(2, col), [20, 235, 10 * col as u8, 255]);
            assert_eq!(migrated.pixel(19, col), [180, 75, 10 * col as u8, 255]);
        }
    }

    #[test]
    fn idempotent() {
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(1000., 2.).unwrap();
        let migration = Migration::new(&model, dimensions).cutoff(1500.);
        let first = migration.run(&section()).unwrap();
        let second = migration.run(&section()).unwrap();
        assert_eq!(first.height(), 15);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn section_deeper_than_the_model() {
        // 4s two-way time: the lower half of the section is below the model
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(1000., 4.).unwrap();
        let migrated = Migration::new(&model, dimensions)
            .cutoff(3000.)
            .run(&section())
            .unwrap();
        assert_eq!(migrated.height(), 30);
        // samples below 2000 are clamped to the deepest valid one (row 5)
        assert_eq!(migrated.pixel(29, 0), [100, 155, 0, 255]);
    }

    #[test]
    fn section_outside_the_model() {
        // the model only covers x in [0, 1000] and the section spans 0..4000
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(4000., 2.).unwrap();
        let migrated = Migration::new(&model, dimensions).run(&section()).unwrap();
        assert_eq!(migrated.height(), 5);
        for row in 0..5 {
            assert_eq!(migrated.pixel(row, 9), [0; 4]);
            assert_eq!(migrated.pixel(row, 0)[3], 255);
        }
    }

    #[test]
    fn velocity_gradient() {
        // v doubles below 1000: t = [0, 0.5, 0.75]
        let model = VelocityModel::new(
            vec![0., 1000., 0., 1000., 0., 1000.],
            vec![0., 0., 1000., 1000., 2000., 2000.],
            vec![2000., 2000., 2000., 2000., 4000., 4000.],
            (3, 2),
            Indexing::Xy,
        )
        .unwrap();
        let time = model.to_time_field();
        assert_eq!(time.profiles().next().unwrap(), &[0., 0.5, 0.75]);
        let interpolant = DepthInterpolant::from_model(&model, &time).unwrap();
        assert!((interpolant.evaluate([200., 0.625]).unwrap() - 1500.).abs() < 1e-6);
        let dimensions = Dimensions::new(1000., 1.5).unwrap();
        let migrated = Migration::new(&model, dimensions).run(&section()).unwrap();
        assert_eq!(migrated.height(), 20);
        // source rows 7 and 8 sit at 1100 and 1400 below the velocity change
        assert_eq!(migrated.pixel(14, 0), [160, 95, 0, 255]);
        assert_eq!(migrated.pixel(12, 3), [147, 108, 30, 255]);
    }

    #[test]
    fn empty_output() {
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(1000., 2.).unwrap();
        let err = Migration::new(&model, dimensions)
            .cutoff(1.)
            .run(&section())
            .unwrap_err();
        assert!(matches!(err, Error::Resample(ResampleError::EmptyOutput(_))));
    }

    #[test]
    fn huge_cutoff_is_an_error() {
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(1000., 2.).unwrap();
        let err = Migration::new(&model, dimensions)
            .cutoff(1e25)
            .run(&section())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resample(ResampleError::TooLarge { .. })
        ));
    }

    #[test]
    fn sink_receives_the_migrated_section() {
        let model = constant_velocity(2000.);
        let dimensions = Dimensions::new(1000., 2.).unwrap();
        let mut received = None;
        let mut sink = |raster: &Raster| -> std::result::Result<(), RasterError> {
            received = Some(raster.clone());
            Ok(())
        };
        let migrated = Migration::new(&model, dimensions)
            .run_into(&section(), &mut sink)
            .unwrap();
        assert_eq!(received, Some(migrated));
    }
}
