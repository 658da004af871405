//! Read-only accessors for datasets and single instances.

use ndarray::ArrayView1;

/// Feature access for a single instance during tree traversal.
pub trait SampleAccessor {
    /// Number of features available for this instance.
    fn n_features(&self) -> usize;

    /// Value of feature `idx`.
    ///
    /// Callers must check `idx < n_features()` first.
    fn feature(&self, idx: usize) -> f32;
}

impl SampleAccessor for [f32] {
    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }

    #[inline]
    fn feature(&self, idx: usize) -> f32 {
        self[idx]
    }
}

impl SampleAccessor for ArrayView1<'_, f32> {
    #[inline]
    fn n_features(&self) -> usize {
        self.len()
    }

    #[inline]
    fn feature(&self, idx: usize) -> f32 {
        self[idx]
    }
}

/// Read-only view of a labelled ranking dataset.
///
/// Instances belonging to the same query are stored contiguously;
/// `query_offsets()` delimits them, so query `q` spans instances
/// `query_offsets()[q]..query_offsets()[q + 1]`.
///
/// The trait is object safe: metrics receive `&dyn DatasetView`. It requires
/// `Sync` so instances can be scored from several threads.
pub trait DatasetView: Sync {
    /// Name used as the dataset's label in performance tensors.
    fn name(&self) -> &str;

    /// Number of instances (query-document pairs).
    fn n_instances(&self) -> usize;

    /// Dimensionality shared by every instance.
    fn n_features(&self) -> usize;

    /// Dense feature vector of instance `idx`.
    fn sample(&self, idx: usize) -> ArrayView1<'_, f32>;

    /// Relevance label of every instance.
    fn labels(&self) -> ArrayView1<'_, f32>;

    /// Query identifier of every instance.
    fn query_ids(&self) -> &[u64];

    /// Boundaries of the query groups (`n_queries() + 1` entries, starting at 0).
    fn query_offsets(&self) -> &[usize];

    /// Number of query groups.
    fn n_queries(&self) -> usize {
        self.query_offsets().len().saturating_sub(1)
    }

    /// Feature value of `instance` at `feature`.
    #[inline]
    fn feature(&self, instance: usize, feature: usize) -> f32 {
        self.sample(instance)[feature]
    }
}
