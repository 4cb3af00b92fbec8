use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    time::Instant,
};

use npyz::{npz::NpzArchive, NpyFile, Order};
use serde::Deserialize;

use super::{Indexing, Result, VelocityError, VelocityModel};

#[derive(Deserialize, Debug)]
struct Node {
    x: f64,
    z: f64,
    v: f64,
}

/// Reorders a Fortran-ordered array into row-major order
fn c_order(data: Vec<f64>, shape: &[usize]) -> Vec<f64> {
    let mut strides = vec![1usize; shape.len()];
    for k in 1..shape.len() {
        strides[k] = strides[k - 1] * shape[k - 1];
    }
    (0..data.len())
        .map(|mut c| {
            let mut offset = 0;
            for k in (0..shape.len()).rev() {
                offset += (c % shape[k]) * strides[k];
                c /= shape[k];
            }
            data[offset]
        })
        .collect()
}

fn read_array<R: Read>(npy: NpyFile<R>) -> Result<(Vec<usize>, Vec<f64>)> {
    let shape: Vec<usize> = npy.shape().iter().map(|&n| n as usize).collect();
    let fortran = matches!(npy.order(), Order::Fortran);
    let data = npy.into_vec::<f64>()?;
    Ok(if fortran {
        (shape.clone(), c_order(data, &shape))
    } else {
        (shape, data)
    })
}

/// Velocity model file loader
///
/// Supported files:
///  - `.npy`: a single `(3,n,m)` array stacking the x, z and v grids
///  - `.npz`: three `(n,m)` arrays named `x`, `z` and `v`
///  - `.csv`: one `x,z,v` record per node
pub struct ModelLoader {
    path: PathBuf,
    indexing: Indexing,
}
impl ModelLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            indexing: Indexing::default(),
        }
    }
    /// Sets the layout of the grids in `.npy` and `.npz` files
    pub fn indexing(self, indexing: Indexing) -> Self {
        Self { indexing, ..self }
    }
    pub fn load(self) -> Result<VelocityModel> {
        log::info!("Loading {:?}...", self.path);
        let now = Instant::now();
        let model = match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("npy") => self.load_npy(),
            Some("npz") => self.load_npz(),
            Some("csv") => self.load_csv(),
            _ => Err(VelocityError::Extension(self.path.clone())),
        }?;
        log::info!("... loaded in {:}ms", now.elapsed().as_millis());
        Ok(model)
    }
    fn load_npy(&self) -> Result<VelocityModel> {
        let npy = NpyFile::new(BufReader::new(File::open(&self.path)?))?;
        let (shape, mut data) = read_array(npy)?;
        if shape.len() != 3 || shape[0] != 3 {
            return Err(VelocityError::ArrayShape(
                shape.into_iter().map(|n| n as u64).collect(),
            ));
        }
        let n = shape[1] * shape[2];
        let v = data.split_off(2 * n);
        let z = data.split_off(n);
        VelocityModel::new(data, z, v, (shape[1], shape[2]), self.indexing)
    }
    fn load_npz(&self) -> Result<VelocityModel> {
        let mut npz = NpzArchive::open(&self.path)?;
        let mut grids = Vec::with_capacity(3);
        for name in ["x", "z", "v"] {
            let npy = npz
                .by_name(name)?
                .ok_or(VelocityError::MissingArray(name))?;
            let (shape, data) = read_array(npy)?;
            if shape.len() != 2 {
                return Err(VelocityError::ArrayShape(
                    shape.into_iter().map(|n| n as u64).collect(),
                ));
            }
            grids.push((shape, data));
        }
        let (shape, x) = grids.remove(0);
        let (_, z) = grids.remove(0);
        let (_, v) = grids.remove(0);
        VelocityModel::new(x, z, v, (shape[0], shape[1]), self.indexing)
    }
    fn load_csv(&self) -> Result<VelocityModel> {
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut nodes = Vec::<Node>::new();
        for result in rdr.deserialize() {
            nodes.push(result?);
        }
        nodes.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.z.total_cmp(&b.z)));
        let mut profiles: Vec<Vec<Node>> = vec![];
        for node in nodes {
            match profiles.last_mut() {
                Some(profile) if profile[0].x == node.x => profile.push(node),
                _ => profiles.push(vec![node]),
            }
        }
        let n_z = profiles.first().map_or(0, |p| p.len());
        if let Some(profile) = profiles.iter().find(|p| p.len() != n_z) {
            return Err(VelocityError::UnevenCsv {
                x: profile[0].x,
                found: profile.len(),
                expected: n_z,
            });
        }
        let n_x = profiles.len();
        let (mut x, mut z, mut v) = (
            Vec::with_capacity(n_x * n_z),
            Vec::with_capacity(n_x * n_z),
            Vec::with_capacity(n_x * n_z),
        );
        for node in profiles.into_iter().flatten() {
            x.push(node.x);
            z.push(node.z);
            v.push(node.v);
        }
        VelocityModel::new(x, z, v, (n_x, n_z), Indexing::Ij)
    }
}
