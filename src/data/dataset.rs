//! In-memory ranking dataset.

use ndarray::{Array1, Array2, ArrayView1};

use super::DatasetView;

/// Errors raised while assembling a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("number of labels ({labels}) does not match number of instances ({rows})")]
    LabelLenMismatch { rows: usize, labels: usize },

    #[error("number of query ids ({query_ids}) does not match number of instances ({rows})")]
    QueryIdLenMismatch { rows: usize, query_ids: usize },

    #[error("query {query_id} reappears at instance {row} after its group ended")]
    NonContiguousQuery { query_id: u64, row: usize },
}

/// Dense, instance-major ranking dataset.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use rankeval::data::{Dataset, DatasetView};
///
/// let ds = Dataset::new(
///     "toy",
///     array![[0.2f32, 1.0], [0.8, 0.0], [0.5, 0.5]],
///     array![1.0, 0.0, 2.0],
///     vec![7, 7, 9],
/// )
/// .unwrap();
/// assert_eq!(ds.n_queries(), 2);
/// assert_eq!(ds.query_offsets(), &[0, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    features: Array2<f32>,
    labels: Array1<f32>,
    query_ids: Vec<u64>,
    query_offsets: Vec<usize>,
}

impl Dataset {
    /// Create a dataset from a `[n_instances, n_features]` matrix, labels and
    /// per-instance query ids.
    ///
    /// Query groups are the runs of equal consecutive ids.
    pub fn new(
        name: impl Into<String>,
        features: Array2<f32>,
        labels: Array1<f32>,
        query_ids: Vec<u64>,
    ) -> Result<Self, DatasetError> {
        let rows = features.nrows();
        if labels.len() != rows {
            return Err(DatasetError::LabelLenMismatch {
                rows,
                labels: labels.len(),
            });
        }
        if query_ids.len() != rows {
            return Err(DatasetError::QueryIdLenMismatch {
                rows,
                query_ids: query_ids.len(),
            });
        }

        let query_offsets = Self::compute_query_offsets(&query_ids)?;
        // Row access hands out contiguous views.
        let features = if features.is_standard_layout() {
            features
        } else {
            features.as_standard_layout().into_owned()
        };

        Ok(Self {
            name: name.into(),
            features,
            labels,
            query_ids,
            query_offsets,
        })
    }

    fn compute_query_offsets(query_ids: &[u64]) -> Result<Vec<usize>, DatasetError> {
        let mut offsets = vec![0];
        let mut seen = std::collections::HashSet::new();

        for (row, &qid) in query_ids.iter().enumerate() {
            if row > 0 && query_ids[row - 1] == qid {
                continue;
            }
            if !seen.insert(qid) {
                return Err(DatasetError::NonContiguousQuery { query_id: qid, row });
            }
            if row > 0 {
                offsets.push(row);
            }
        }
        if !query_ids.is_empty() {
            offsets.push(query_ids.len());
        }

        Ok(offsets)
    }

    /// Feature matrix, `[n_instances, n_features]`.
    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }
}

impl DatasetView for Dataset {
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn n_instances(&self) -> usize {
        self.features.nrows()
    }

    #[inline]
    fn n_features(&self) -> usize {
        self.features.ncols()
    }

    #[inline]
    fn sample(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.features.row(idx)
    }

    fn labels(&self) -> ArrayView1<'_, f32> {
        self.labels.view()
    }

    fn query_ids(&self) -> &[u64] {
        &self.query_ids
    }

    fn query_offsets(&self) -> &[usize] {
        &self.query_offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn query_offsets_follow_runs() {
        let ds = Dataset::new(
            "d",
            Array2::zeros((5, 2)),
            Array1::zeros(5),
            vec![3, 3, 1, 1, 1],
        )
        .unwrap();

        assert_eq!(ds.query_offsets(), &[0, 2, 5]);
        assert_eq!(ds.n_queries(), 2);
        assert_eq!(ds.n_features(), 2);
    }

    #[test]
    fn empty_dataset_has_no_queries() {
        let ds = Dataset::new("empty", Array2::zeros((0, 3)), Array1::zeros(0), vec![]).unwrap();
        assert_eq!(ds.query_offsets(), &[0]);
        assert_eq!(ds.n_queries(), 0);
        assert_eq!(ds.n_instances(), 0);
    }

    #[test]
    fn rejects_length_mismatches() {
        let err = Dataset::new("d", Array2::zeros((2, 1)), Array1::zeros(3), vec![1, 1]).unwrap_err();
        assert_eq!(err, DatasetError::LabelLenMismatch { rows: 2, labels: 3 });

        let err = Dataset::new("d", Array2::zeros((2, 1)), Array1::zeros(2), vec![1]).unwrap_err();
        assert_eq!(
            err,
            DatasetError::QueryIdLenMismatch {
                rows: 2,
                query_ids: 1
            }
        );
    }

    #[test]
    fn rejects_split_query_group() {
        let err = Dataset::new("d", Array2::zeros((3, 1)), Array1::zeros(3), vec![1, 2, 1]).unwrap_err();
        assert_eq!(err, DatasetError::NonContiguousQuery { query_id: 1, row: 2 });
    }

    #[test]
    fn column_major_input_is_normalized() {
        let features = array![[1.0f32, 2.0], [3.0, 4.0]].reversed_axes();
        let ds = Dataset::new("d", features, array![0.0, 1.0], vec![0, 0]).unwrap();
        assert_eq!(ds.sample(0).as_slice(), Some(&[1.0f32, 3.0][..]));
        assert_eq!(ds.feature(1, 1), 4.0);
    }
}
