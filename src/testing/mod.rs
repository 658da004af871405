//! Testing utilities for rankeval.
//!
//! Assertion helpers and deterministic data generators shared by unit tests,
//! integration tests and benchmarks.
//!
//! ```
//! use rankeval::testing::{assert_slice_approx_eq, random_dataset, random_ensemble, DEFAULT_TOLERANCE};
//!
//! let dataset = random_dataset("d", 4, 10, 5, 42);
//! let ensemble = random_ensemble("m", 20, 3, 5, 7);
//! let a = ensemble.score(&dataset, false).unwrap();
//! let b = ensemble.score(&dataset, false).unwrap();
//! assert_slice_approx_eq(a.y_pred.as_slice().unwrap(), b.y_pred.as_slice().unwrap(), DEFAULT_TOLERANCE, "rescore");
//! ```

mod data;

pub use data::{random_dataset, random_dense_f32, random_ensemble, random_tree};

// =============================================================================
// Constants
// =============================================================================

/// Absolute tolerance for comparing scores that went through different
/// summation orders.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Floating Point Assertions
// =============================================================================

/// Assert that two slices are approximately equal element-wise.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than `tolerance`.
pub fn assert_slice_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} ≠ {e} (diff={diff}, tolerance={tolerance})"
        );
    }
}

/// Like [`assert_slice_approx_eq`], for any iterables of `f64`
/// (ndarray views, columns).
pub fn assert_values_approx_eq<'a, A, E>(actual: A, expected: E, tolerance: f64, context: &str)
where
    A: IntoIterator<Item = &'a f64>,
    E: IntoIterator<Item = &'a f64>,
{
    let actual: Vec<f64> = actual.into_iter().copied().collect();
    let expected: Vec<f64> = expected.into_iter().copied().collect();
    assert_slice_approx_eq(&actual, &expected, tolerance, context);
}
