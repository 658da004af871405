//! Labelled dense performance tensor.
//!
//! A [`PerformanceTensor`] is an `ArrayD<f64>` plus one [`Axis`] per
//! dimension. Each axis carries its coordinates and a coordinate → index map,
//! so cells can be addressed by label instead of position.
//!
//! `NaN` marks cells that could not be computed (for example a tree-count
//! checkpoint beyond a model's size). It is a sentinel, not an error.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use ndarray::{ArrayD, ArrayViewD};
use serde::Serialize;

use crate::error::EvalError;

pub const AXIS_DATASET: &str = "dataset";
pub const AXIS_MODEL: &str = "model";
pub const AXIS_METRIC: &str = "metric";
/// Tree-count checkpoints.
pub const AXIS_K: &str = "k";
/// Right edges of score bins.
pub const AXIS_BIN: &str = "bin";

// =============================================================================
// Coord
// =============================================================================

/// A coordinate along one axis.
///
/// Edges compare by bit pattern, so `Edge(0.5)` looks up exactly the value
/// the driver produced.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Coord {
    /// Dataset, model or metric name.
    Name(String),
    /// Number of leading trees used.
    Trees(usize),
    /// Right edge of a score bin.
    Edge(f64),
}

impl Coord {
    fn key(&self) -> (u8, u64, Option<&str>) {
        match self {
            Coord::Name(name) => (0, 0, Some(name.as_str())),
            Coord::Trees(n) => (1, *n as u64, None),
            Coord::Edge(edge) => (2, edge.to_bits(), None),
        }
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coord {}

impl Hash for Coord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Name(name) => f.write_str(name),
            Coord::Trees(n) => write!(f, "{n}"),
            Coord::Edge(edge) => write!(f, "{edge}"),
        }
    }
}

impl From<&str> for Coord {
    fn from(name: &str) -> Self {
        Coord::Name(name.to_string())
    }
}

impl From<String> for Coord {
    fn from(name: String) -> Self {
        Coord::Name(name)
    }
}

// =============================================================================
// Axis
// =============================================================================

/// A named tensor dimension with unique coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    name: &'static str,
    coords: Vec<Coord>,
    #[serde(skip)]
    lookup: HashMap<Coord, usize>,
}

impl Axis {
    /// # Errors
    ///
    /// [`EvalError::DuplicateLabel`] if a coordinate appears twice.
    pub fn new(name: &'static str, coords: Vec<Coord>) -> Result<Self, EvalError> {
        let mut lookup = HashMap::with_capacity(coords.len());
        for (idx, coord) in coords.iter().enumerate() {
            if lookup.insert(coord.clone(), idx).is_some() {
                return Err(EvalError::DuplicateLabel {
                    axis: name,
                    label: coord.to_string(),
                });
            }
        }
        Ok(Self {
            name,
            coords,
            lookup,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn index_of(&self, coord: &Coord) -> Option<usize> {
        self.lookup.get(coord).copied()
    }
}

// =============================================================================
// PerformanceTensor
// =============================================================================

/// Output of the analysis drivers.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use rankeval::analysis::model_performance;
/// use rankeval::metrics::{Metric, Ndcg};
/// use rankeval::{AnalysisConfig, Dataset, Ensemble};
///
/// let tree = rankeval::tree! {
///     0 => split(0, 0.5) -> 1, 2,
///     1 => leaf(0.0),
///     2 => leaf(1.0),
/// };
/// let model = Ensemble::from_trees("stump", vec![tree], vec![1.0]).unwrap();
/// let test = Dataset::new("test", array![[0.2f32], [0.8]], array![0.0, 1.0], vec![1, 1]).unwrap();
///
/// let ndcg = Ndcg::at(10);
/// let metrics: [&dyn Metric; 1] = [&ndcg];
/// let tensor = model_performance(&[test], &[model], &metrics, &AnalysisConfig::default()).unwrap();
///
/// assert_eq!(tensor.shape(), &[1, 1, 1]);
/// let cell = tensor.get(&["test".into(), "stump".into(), "NDCG@10".into()]);
/// assert_eq!(cell, Some(1.0));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceTensor {
    name: String,
    axes: Vec<Axis>,
    data: ArrayD<f64>,
}

impl PerformanceTensor {
    /// Allocate a tensor shaped by `axes` with every cell set to `fill`.
    pub(crate) fn new(name: impl Into<String>, axes: Vec<Axis>, fill: f64) -> Self {
        let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
        Self {
            name: name.into(),
            axes,
            data: ArrayD::from_elem(shape, fill),
        }
    }

    pub(crate) fn set(&mut self, index: &[usize], value: f64) {
        self.data[index] = value;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// The raw cell values, axes in [`axes`](Self::axes) order.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.data
    }

    /// Position of `coord` along the axis called `axis`.
    pub fn index_of(&self, axis: &str, coord: &Coord) -> Option<usize> {
        self.axis(axis)?.index_of(coord)
    }

    /// Cell addressed by one coordinate per axis.
    pub fn get(&self, coords: &[Coord]) -> Option<f64> {
        if coords.len() != self.axes.len() {
            return None;
        }
        let index = coords
            .iter()
            .zip(&self.axes)
            .map(|(coord, axis)| axis.index_of(coord))
            .collect::<Option<Vec<usize>>>()?;
        self.get_by_index(&index)
    }

    /// Cell addressed by position.
    pub fn get_by_index(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.data.ndim() {
            return None;
        }
        self.data.get(index).copied()
    }

    /// Sub-tensor at `coord` along `axis`, with that axis removed.
    pub fn sel(&self, axis: &str, coord: &Coord) -> Option<ArrayViewD<'_, f64>> {
        let dim = self.axes.iter().position(|a| a.name == axis)?;
        let idx = self.axes[dim].index_of(coord)?;
        Some(self.data.index_axis(ndarray::Axis(dim), idx))
    }

    /// Number of cells holding a value (not the `NaN` sentinel).
    pub fn n_defined(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PerformanceTensor {
        let axes = vec![
            Axis::new(AXIS_MODEL, vec!["a".into(), "b".into()]).unwrap(),
            Axis::new(AXIS_K, vec![Coord::Trees(10), Coord::Trees(20), Coord::Trees(25)]).unwrap(),
        ];
        let mut tensor = PerformanceTensor::new("t", axes, f64::NAN);
        tensor.set(&[0, 0], 0.5);
        tensor.set(&[1, 2], 0.75);
        tensor
    }

    #[test]
    fn lookup_by_label() {
        let tensor = small();
        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.get(&["a".into(), Coord::Trees(10)]), Some(0.5));
        assert_eq!(tensor.get(&["b".into(), Coord::Trees(25)]), Some(0.75));
        assert!(tensor.get(&["b".into(), Coord::Trees(10)]).unwrap().is_nan());
        assert_eq!(tensor.get(&["c".into(), Coord::Trees(10)]), None);
        assert_eq!(tensor.get(&["a".into()]), None);
        assert_eq!(tensor.index_of(AXIS_K, &Coord::Trees(20)), Some(1));
        assert_eq!(tensor.n_defined(), 2);
    }

    #[test]
    fn sel_drops_axis() {
        let tensor = small();
        let row = tensor.sel(AXIS_MODEL, &"a".into()).unwrap();
        assert_eq!(row.shape(), &[3]);
        assert_eq!(row[[0]], 0.5);
        assert!(tensor.sel("missing", &"a".into()).is_none());
    }

    #[test]
    fn duplicate_coordinates_are_rejected() {
        let err = Axis::new(AXIS_DATASET, vec!["train".into(), "train".into()]).unwrap_err();
        assert_eq!(
            err,
            EvalError::DuplicateLabel {
                axis: AXIS_DATASET,
                label: "train".to_string()
            }
        );
    }

    #[test]
    fn edge_coordinates_compare_by_value() {
        let axis = Axis::new(AXIS_BIN, vec![Coord::Edge(0.5), Coord::Edge(1.0)]).unwrap();
        assert_eq!(axis.index_of(&Coord::Edge(1.0 / 2.0)), Some(0));
        assert_eq!(axis.index_of(&Coord::Trees(1)), None);
    }

    #[test]
    fn serializes_axes_and_values() {
        let json = serde_json::to_value(small()).unwrap();
        assert_eq!(json["name"], "t");
        assert_eq!(json["axes"][1]["name"], "k");
        assert_eq!(json["axes"][1]["coords"][2], 25);
    }
}
