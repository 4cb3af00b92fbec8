//! One-way time field
//!
//! Writes the one-way travel time of every node of a velocity model to a CSV file

use std::path::PathBuf;

use seismic_migration::{Indexing, ModelLoader};
use serde::Serialize;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "time_field", about = "Velocity model one-way time field")]
struct Opt {
    /// Velocity model file (.npy, .npz or .csv)
    #[structopt(short, long, parse(from_os_str))]
    model: PathBuf,
    /// The velocity grids are in matrix indexing (rows = x positions)
    #[structopt(long)]
    ij: bool,
    /// CSV file [default: <model>_owt.csv]
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Record {
    x: f64,
    z: f64,
    v: f64,
    owt: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let model = ModelLoader::new(&opt.model)
        .indexing(if opt.ij { Indexing::Ij } else { Indexing::Xy })
        .load()?;
    let time = model.to_time_field();

    let path = opt.output.unwrap_or_else(|| {
        let stem = opt
            .model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        opt.model.with_file_name(format!("{stem}_owt.csv"))
    });
    let mut wtr = csv::Writer::from_path(&path)?;
    for (((&x, &z), &v), &owt) in model
        .x()
        .iter()
        .zip(model.z())
        .zip(model.v())
        .zip(time.as_slice())
    {
        wtr.serialize(Record { x, z, v, owt })?;
    }
    wtr.flush()?;
    let (n_x, n_z) = time.shape();
    println!(
        "{} x positions, {} depth samples, max. one-way time: {}",
        n_x,
        n_z,
        time.max_time()
    );
    println!("Saved {:?}", path);

    Ok(())
}
