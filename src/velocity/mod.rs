//! Depth-velocity model
//!
//! The model is made of three co-indexed grids: the horizontal position `x`,
//! the depth `z` and the interval velocity `v` of every node.
//! Whatever the layout of the source arrays, the model is stored as
//! `rows = x positions` and `columns = depth samples`, depth increasing
//! along a row.

use std::{fmt, path::PathBuf};

mod loader;
pub use loader::ModelLoader;
mod time;
pub use time::TimeField;

#[derive(thiserror::Error, Debug)]
pub enum VelocityError {
    #[error("{name} grid has {len} samples, expected {expected} ({rows}x{cols})")]
    ShapeMismatch {
        name: &'static str,
        len: usize,
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error("velocity model needs at least 2 x positions and 2 depth samples, found {0}x{1}")]
    TooSmall(usize, usize),
    #[error("non-finite {name} value at node [{row},{col}]")]
    NonFinite {
        name: &'static str,
        row: usize,
        col: usize,
    },
    #[error("non-positive velocity {value} at node [{row},{col}]")]
    NonPositiveVelocity { row: usize, col: usize, value: f64 },
    #[error("depth decreases at node [{row},{col}]")]
    NonMonotonicDepth { row: usize, col: usize },
    #[error("Failed to open the velocity model file")]
    Io(#[from] std::io::Error),
    #[error("Failed to deserialize the CSV file")]
    Csv(#[from] csv::Error),
    #[error("array `{0}` is missing from the velocity model archive")]
    MissingArray(&'static str),
    #[error("expected a (3,n,m) array, found shape {0:?}")]
    ArrayShape(Vec<u64>),
    #[error("x={x} has {found} nodes, expected {expected}")]
    UnevenCsv {
        x: f64,
        found: usize,
        expected: usize,
    },
    #[error("unsupported velocity model file {0:?} (expected .npy, .npz or .csv)")]
    Extension(PathBuf),
}
type Result<T> = std::result::Result<T, VelocityError>;

/// Memory layout of the source grids
///
/// `Xy` is the layout of a meshgrid built with cartesian indexing:
/// rows are depth samples and columns are x positions.
/// `Ij` is the matrix indexing used internally: rows are x positions and
/// columns are depth samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indexing {
    #[default]
    Xy,
    Ij,
}
impl fmt::Display for Indexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indexing::Xy => write!(f, "xy"),
            Indexing::Ij => write!(f, "ij"),
        }
    }
}

fn transpose(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    (0..cols)
        .flat_map(|j| (0..rows).map(move |i| data[i * cols + j]))
        .collect()
}

/// Depth-velocity model in `ij` layout
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityModel {
    n_x: usize,
    n_z: usize,
    x: Vec<f64>,
    z: Vec<f64>,
    v: Vec<f64>,
}
impl VelocityModel {
    /// Creates a model from three row-major grids of the given `shape`
    ///
    /// `shape` is the `(rows, columns)` shape of the grids as laid out by
    /// `indexing`; `Xy` grids are transposed once here.
    pub fn new(
        x: Vec<f64>,
        z: Vec<f64>,
        v: Vec<f64>,
        shape: (usize, usize),
        indexing: Indexing,
    ) -> Result<Self> {
        let (rows, cols) = shape;
        let expected = rows * cols;
        for (name, grid) in [("x", &x), ("z", &z), ("v", &v)] {
            if grid.len() != expected {
                return Err(VelocityError::ShapeMismatch {
                    name,
                    len: grid.len(),
                    expected,
                    rows,
                    cols,
                });
            }
        }
        let this = match indexing {
            Indexing::Ij => Self {
                n_x: rows,
                n_z: cols,
                x,
                z,
                v,
            },
            Indexing::Xy => Self {
                n_x: cols,
                n_z: rows,
                x: transpose(&x, rows, cols),
                z: transpose(&z, rows, cols),
                v: transpose(&v, rows, cols),
            },
        };
        this.validate()?;
        log::debug!(
            "velocity model: {} x positions, {} depth samples ({} indexing)",
            this.n_x,
            this.n_z,
            indexing
        );
        Ok(this)
    }
    fn validate(&self) -> Result<()> {
        if self.n_x < 2 || self.n_z < 2 {
            return Err(VelocityError::TooSmall(self.n_x, self.n_z));
        }
        for row in 0..self.n_x {
            for col in 0..self.n_z {
                let k = self.index(row, col);
                for (name, value) in [("x", self.x[k]), ("z", self.z[k]), ("v", self.v[k])] {
                    if !value.is_finite() {
                        return Err(VelocityError::NonFinite { name, row, col });
                    }
                }
                if self.v[k] <= 0f64 {
                    return Err(VelocityError::NonPositiveVelocity {
                        row,
                        col,
                        value: self.v[k],
                    });
                }
                if col > 0 && self.z[k] < self.z[k - 1] {
                    return Err(VelocityError::NonMonotonicDepth { row, col });
                }
            }
        }
        Ok(())
    }
    /// Returns the `(x positions, depth samples)` shape of the model
    pub fn shape(&self) -> (usize, usize) {
        (self.n_x, self.n_z)
    }
    /// Number of nodes
    pub fn len(&self) -> usize {
        self.x.len()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.n_z + col
    }
    /// Horizontal positions, flattened row-major
    pub fn x(&self) -> &[f64] {
        &self.x
    }
    /// Depths, flattened row-major
    pub fn z(&self) -> &[f64] {
        &self.z
    }
    /// Velocities, flattened row-major
    pub fn v(&self) -> &[f64] {
        &self.v
    }
    /// Iterates over the `(z, v)` depth profiles, one per x position
    pub fn profiles(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.z.chunks(self.n_z).zip(self.v.chunks(self.n_z))
    }
    /// Returns the largest depth of the model
    pub fn max_depth(&self) -> f64 {
        self.z.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}
