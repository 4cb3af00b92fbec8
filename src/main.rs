use std::path::PathBuf;

use seismic_migration::{
    raster::RasterError, Dimensions, Indexing, Migration, ModelLoader, PngSink, Raster,
    RasterSink, TimeAxis,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "seismic-migration",
    about = "Time to depth migration of seismic sections"
)]
struct Opt {
    /// Velocity model file (.npy, .npz or .csv)
    #[structopt(short, long, parse(from_os_str))]
    model: PathBuf,
    /// Time section (8-bit RGBA image)
    #[structopt(short, long, parse(from_os_str))]
    image: PathBuf,
    /// Horizontal extent of the section
    #[structopt(long)]
    xmax: f64,
    /// Maximum travel time of the section (two-way time unless --one-way)
    #[structopt(long)]
    tmax: f64,
    /// Maximum depth of the migrated section [default: the model maximum depth]
    #[structopt(short, long)]
    cutoff: Option<f64>,
    /// The section time axis is one-way time
    #[structopt(long)]
    one_way: bool,
    /// The velocity grids are in matrix indexing (rows = x positions)
    #[structopt(long)]
    ij: bool,
    /// Migrated section file [default: <image>_depth.png]
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Display a progress bar
    #[structopt(short, long)]
    progress: bool,
    /// Print the migrated section size instead of saving it
    #[structopt(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let model = ModelLoader::new(&opt.model)
        .indexing(if opt.ij { Indexing::Ij } else { Indexing::Xy })
        .load()?;
    let section = Raster::open(&opt.image)?;
    let dimensions = Dimensions::new(opt.xmax, opt.tmax)?.time_axis(if opt.one_way {
        TimeAxis::OneWay
    } else {
        TimeAxis::TwoWay
    });

    let mut migration = Migration::new(&model, dimensions).progress(opt.progress);
    if let Some(depth) = opt.cutoff {
        migration = migration.cutoff(depth);
    }

    let mut sink: Box<dyn RasterSink> = if opt.dry_run {
        Box::new(|raster: &Raster| -> Result<(), RasterError> {
            println!(
                "Migrated section: {} rows x {} columns",
                raster.height(),
                raster.width()
            );
            Ok(())
        })
    } else {
        let png = match opt.output {
            Some(path) => PngSink::new(path),
            None => PngSink::next_to(&opt.image),
        };
        println!("Saving {:?}", png.path());
        Box::new(png)
    };
    migration.run_into(&section, sink.as_mut())?;
    println!("Depth migrated {:?}", opt.image);

    Ok(())
}
