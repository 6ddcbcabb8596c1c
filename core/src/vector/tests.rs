use super::*;

const EPSILON: f32 = 1e-5;

fn approx_eq_tol(left: f32, right: f32, epsilon: f32) {
    assert!((left - right).abs() < epsilon, "expected {left} ~= {right}");
}

fn deterministic_vector(seed: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|index| {
            let mixed = seed
                .wrapping_mul(1_103_515_245)
                .wrapping_add(index.wrapping_mul(12_345))
                .wrapping_add(97);
            let base = (mixed % 10_000) as f32 / 5_000.0;
            base - 1.0
        })
        .collect()
}

fn scalar_l2_squared(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(l, r)| (l - r) * (l - r))
        .sum()
}

#[test]
fn l2_squared_skips_square_root() {
    let squared = l2_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 6.0]).expect("must succeed");
    approx_eq_tol(squared, 9.0, EPSILON);
    let distance = l2_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 6.0]).expect("must succeed");
    approx_eq_tol(distance, 3.0, EPSILON);
}

#[test]
fn unit_axes_are_two_apart_when_squared() {
    let squared = l2_squared(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).expect("must succeed");
    assert_eq!(squared, 2.0);
}

#[test]
fn rejects_dimension_mismatch() {
    let error = l2_squared(&[1.0, 2.0], &[1.0]).expect_err("must fail");
    assert_eq!(error, VectorError::DimensionMismatch { left: 2, right: 1 });
}

#[test]
fn rejects_empty_vectors() {
    let error = l2_distance(&[], &[]).expect_err("must fail");
    assert_eq!(error, VectorError::EmptyVector);
}

#[test]
fn first_non_finite_reports_component() {
    assert_eq!(first_non_finite(&[1.0, 2.0]), None);
    assert_eq!(first_non_finite(&[1.0, f32::NAN, f32::INFINITY]), Some(1));
}

#[test]
fn prepared_l2_matches_validated_path() {
    for len in [1usize, 2, 3, 7, 8, 9, 16, 17, 24, 64, 65, 127, 128, 129, 384] {
        let query = deterministic_vector(17, len);
        let candidate = deterministic_vector(31, len);
        let prepared = PreparedL2Query::new(&query);
        assert_eq!(prepared.len(), len);
        let reference = scalar_l2_squared(&query, &candidate);
        let tolerance = reference.max(1.0) * 1e-4;
        approx_eq_tol(prepared.l2_squared(&candidate), reference, tolerance);
        approx_eq_tol(
            l2_squared(&query, &candidate).expect("must succeed"),
            reference,
            tolerance,
        );
    }
}

#[test]
fn prepared_l2_is_exactly_zero_for_identical_vectors() {
    for len in [3usize, 8, 19, 384] {
        let query = deterministic_vector(5, len);
        let prepared = PreparedL2Query::new(&query);
        assert_eq!(prepared.l2_squared(&query), 0.0);
    }
}
