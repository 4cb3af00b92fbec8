use super::VelocityModel;

/// One-way travel time at every node of a [VelocityModel]
///
/// Same layout as the model; the first node of every depth profile is the
/// surface, at time zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeField {
    n_x: usize,
    n_z: usize,
    owt: Vec<f64>,
}
impl TimeField {
    /// Integrates the slowness down every depth profile of the model
    ///
    /// `t[j] = t[j-1] + (z[j] - z[j-1]) / v[j]`
    pub fn new(model: &VelocityModel) -> Self {
        let (n_x, n_z) = model.shape();
        let owt = model
            .profiles()
            .flat_map(|(z, v)| {
                std::iter::once(0f64).chain(z.windows(2).zip(&v[1..]).scan(
                    0f64,
                    |t, (dz, v)| {
                        *t += (dz[1] - dz[0]) / v;
                        Some(*t)
                    },
                ))
            })
            .collect();
        Self { n_x, n_z, owt }
    }
    /// Returns the `(x positions, depth samples)` shape of the field
    pub fn shape(&self) -> (usize, usize) {
        (self.n_x, self.n_z)
    }
    /// One-way times, flattened row-major
    pub fn as_slice(&self) -> &[f64] {
        &self.owt
    }
    /// Iterates over the time profiles, one per x position
    pub fn profiles(&self) -> std::slice::Chunks<'_, f64> {
        self.owt.chunks(self.n_z)
    }
    /// Largest one-way time of the field
    pub fn max_time(&self) -> f64 {
        self.owt.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl VelocityModel {
    /// Converts the model depths into one-way travel times
    pub fn to_time_field(&self) -> TimeField {
        TimeField::new(self)
    }
}
