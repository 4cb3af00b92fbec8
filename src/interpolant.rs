//! Piecewise-linear interpolation over scattered 2D nodes
//!
//! The nodes are triangulated (Delaunay) and a query point is interpolated
//! with the barycentric coordinates of the triangle it falls into.
//! Points outside the convex hull of the nodes have no value.

use nalgebra::{Matrix2, Vector2};
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::velocity::{TimeField, VelocityModel};

/// Depth assigned to points outside the convex hull of the interpolation nodes
pub const OUT_OF_HULL: f64 = f64::INFINITY;

/// Checks for the [OUT_OF_HULL] sentinel
#[inline]
pub fn is_out_of_hull(depth: f64) -> bool {
    depth == OUT_OF_HULL
}

// tolerance on barycentric coordinates for points on edges
const EDGE_TOLERANCE: f64 = 1e-9;

#[derive(thiserror::Error, Debug)]
pub enum InterpolantError {
    #[error("found {nodes} nodes and {values} values")]
    Length { nodes: usize, values: usize },
    #[error("interpolation requires at least 3 nodes, found {0}")]
    TooFew(usize),
    #[error("non-finite interpolation node #{0}")]
    NonFinite(usize),
    #[error("interpolation nodes are collinear")]
    Degenerate,
    #[error("the triangulation has no triangles")]
    NoTriangles,
}
type Result<T> = std::result::Result<T, InterpolantError>;

/// Interface to scattered data interpolation
pub trait ScatteredInterpolant: Sized {
    /// Fits the interpolant to `values` given at `nodes`
    fn fit(nodes: &[[f64; 2]], values: &[f64]) -> Result<Self>;
    /// Interpolates at `point`, `None` outside the convex hull of the nodes
    fn evaluate(&self, point: [f64; 2]) -> Option<f64>;
    /// Interpolates at `point`, [OUT_OF_HULL] outside the convex hull of the nodes
    fn evaluate_or_sentinel(&self, point: [f64; 2]) -> f64 {
        self.evaluate(point).unwrap_or(OUT_OF_HULL)
    }
}

/// Triangle of the triangulation
#[derive(Debug)]
struct Facet {
    vertices: [usize; 3],
    origin: Vector2<f64>,
    inverse: Matrix2<f64>,
    envelope: AABB<[f64; 2]>,
}
impl Facet {
    fn new(vertices: [usize; 3], nodes: &[[f64; 2]]) -> Option<Self> {
        let [a, b, c] = vertices.map(|i| Vector2::from(nodes[i]));
        let inverse = Matrix2::from_columns(&[b - a, c - a]).try_inverse()?;
        let bounds = AABB::from_points(vertices.iter().map(|&i| &nodes[i]));
        let (lower, upper) = (bounds.lower(), bounds.upper());
        let margin = [
            EDGE_TOLERANCE * (upper[0] - lower[0]),
            EDGE_TOLERANCE * (upper[1] - lower[1]),
        ];
        let envelope = AABB::from_corners(
            [lower[0] - margin[0], lower[1] - margin[1]],
            [upper[0] + margin[0], upper[1] + margin[1]],
        );
        Some(Self {
            vertices,
            origin: a,
            inverse,
            envelope,
        })
    }
    fn barycentric(&self, point: &[f64; 2]) -> Option<[f64; 3]> {
        let l = self.inverse * (Vector2::from(*point) - self.origin);
        let w = [1f64 - l.x - l.y, l.x, l.y];
        w.iter().all(|&w| w >= -EDGE_TOLERANCE).then_some(w)
    }
}
impl RTreeObject for Facet {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}
impl PointDistance for Facet {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.barycentric(point).is_some()
    }
}

fn is_collinear(nodes: &[[f64; 2]]) -> bool {
    let (lo, hi) = nodes.iter().fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(lo, hi), p| {
            (
                [lo[0].min(p[0]), lo[1].min(p[1])],
                [hi[0].max(p[0]), hi[1].max(p[1])],
            )
        },
    );
    let span = [hi[0] - lo[0], hi[1] - lo[1]];
    if span[0] <= 0f64 || span[1] <= 0f64 {
        return true;
    }
    // collinearity test in the unit square
    let unit = |p: &[f64; 2]| Vector2::new((p[0] - lo[0]) / span[0], (p[1] - lo[1]) / span[1]);
    let p0 = unit(&nodes[0]);
    let far = nodes
        .iter()
        .map(|p| unit(p) - p0)
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
        .unwrap_or_else(Vector2::zeros);
    nodes
        .iter()
        .map(|p| {
            let d = unit(p) - p0;
            (far.x * d.y - far.y * d.x).abs()
        })
        .fold(0f64, f64::max)
        < 1e-9
}

/// Delaunay based piecewise-linear interpolant
///
/// Fitted once, then queried for any number of points.
pub struct DepthInterpolant {
    values: Vec<f64>,
    facets: RTree<Facet>,
}
impl DepthInterpolant {
    /// Fits the `(x, one-way time) -> depth` interpolant on the nodes of a velocity model
    pub fn from_model(model: &VelocityModel, time: &TimeField) -> Result<Self> {
        let nodes: Vec<[f64; 2]> = model
            .x()
            .iter()
            .zip(time.as_slice())
            .map(|(&x, &t)| [x, t])
            .collect();
        Self::fit(&nodes, model.z())
    }
    /// Number of triangles
    pub fn n_triangles(&self) -> usize {
        self.facets.size()
    }
    /// Depth at `(x, t)`, [OUT_OF_HULL] outside the convex hull of the model nodes
    pub fn depth_at(&self, x: f64, t: f64) -> f64 {
        self.evaluate_or_sentinel([x, t])
    }
}
impl ScatteredInterpolant for DepthInterpolant {
    fn fit(nodes: &[[f64; 2]], values: &[f64]) -> Result<Self> {
        if nodes.len() != values.len() {
            return Err(InterpolantError::Length {
                nodes: nodes.len(),
                values: values.len(),
            });
        }
        if nodes.len() < 3 {
            return Err(InterpolantError::TooFew(nodes.len()));
        }
        if let Some(k) = nodes
            .iter()
            .zip(values)
            .position(|(p, v)| !(p[0].is_finite() && p[1].is_finite() && v.is_finite()))
        {
            return Err(InterpolantError::NonFinite(k));
        }
        if is_collinear(nodes) {
            return Err(InterpolantError::Degenerate);
        }
        let delaunay = triangle_rs::Delaunay::builder()
            .add_nodes(&nodes.iter().flat_map(|p| p.to_vec()).collect::<Vec<f64>>())
            .set_switches("Q")
            .build();
        let facets: Vec<Facet> = delaunay
            .triangle_iter()
            .filter_map(|t| {
                let vertices: Vec<usize> = t.iter().cloned().collect();
                Facet::new([vertices[0], vertices[1], vertices[2]], nodes)
            })
            .collect();
        if facets.is_empty() {
            return Err(InterpolantError::NoTriangles);
        }
        log::debug!(
            "triangulated {} nodes into {} triangles",
            nodes.len(),
            facets.len()
        );
        Ok(Self {
            values: values.to_vec(),
            facets: RTree::bulk_load(facets),
        })
    }
    fn evaluate(&self, point: [f64; 2]) -> Option<f64> {
        let facet = self.facets.locate_at_point(&point)?;
        let w = facet.barycentric(&point)?;
        Some(
            facet
                .vertices
                .iter()
                .zip(w)
                .map(|(&i, w)| w * self.values[i])
                .sum(),
        )
    }
}
