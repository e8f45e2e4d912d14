// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: operations composed over multi-block maps.
//!
//! These tests build maps the way a descriptor pipeline would (several keys,
//! components, gradients) and check the algebraic identities operations
//! must satisfy end to end.

use array_backend::{Array, DenseArray};
use labeled_tensor::{Labels, TensorBlock, TensorError, TensorMap};
use tensor_ops::{
    add, allclose, divide, dot, equal, equal_metadata, multiply, ones_like, slice, solve, split,
    subtract, unique_metadata, zeros_like, Axis, OpsConfig,
};

// ── Helpers ────────────────────────────────────────────────────

fn array(shape: &[usize], data: Vec<f64>) -> DenseArray {
    <DenseArray as Array>::from_shape_vec(shape, data).unwrap()
}

fn ramp(shape: &[usize], offset: f64) -> DenseArray {
    let n: usize = shape.iter().product();
    array(shape, (0..n).map(|i| offset + i as f64 * 0.25).collect())
}

/// A block with samples (structure, center), one "m" component of size 3,
/// two properties and a "positions" gradient with an "xyz" component.
fn descriptor_block(structures: &[i32], offset: f64) -> TensorBlock {
    let rows: Vec<Vec<i32>> = structures
        .iter()
        .enumerate()
        .map(|(c, &s)| vec![s, c as i32])
        .collect();
    let n = rows.len();
    let m = Labels::new(["m"], vec![vec![-1], vec![0], vec![1]]).unwrap();
    let properties = Labels::new(["n"], vec![vec![0], vec![1]]).unwrap();

    let gradient_rows: Vec<Vec<i32>> = (0..n as i32).map(|s| vec![s, 0, s]).collect();
    let gradient = TensorBlock::new(
        ramp(&[n, 3, 3, 2], offset + 0.5),
        Labels::new(["sample", "structure", "atom"], gradient_rows).unwrap(),
        vec![Labels::range("xyz", 3).unwrap(), m.clone()],
        properties.clone(),
    )
    .unwrap();

    TensorBlock::new(
        ramp(&[n, 3, 2], offset + 1.0),
        Labels::new(["structure", "center"], rows).unwrap(),
        vec![m],
        properties,
    )
    .unwrap()
    .with_gradient("positions", gradient)
    .unwrap()
}

fn descriptor_map(offset: f64) -> TensorMap {
    let keys = Labels::new(["species"], vec![vec![1], vec![6], vec![8]]).unwrap();
    TensorMap::new(
        keys,
        vec![
            descriptor_block(&[0, 0, 1], offset),
            descriptor_block(&[1, 2], offset + 3.0),
            descriptor_block(&[0, 2, 2, 3], offset + 7.0),
        ],
    )
    .unwrap()
}

fn simple_block(shape: &[usize], data: Vec<f64>, samples: Labels, properties: Labels) -> TensorBlock {
    TensorBlock::new(array(shape, data), samples, vec![], properties).unwrap()
}

fn loose() -> OpsConfig {
    OpsConfig {
        rtol: 1e-6,
        atol: 1e-9,
        equal_nan: false,
    }
}

// ── Arithmetic ─────────────────────────────────────────────────

#[test]
fn test_add_is_commutative() {
    let a = descriptor_map(0.0);
    let b = descriptor_map(10.0);
    assert!(equal(&add(&a, &b).unwrap(), &add(&b, &a).unwrap()));
}

#[test]
fn test_subtract_self_is_zero_with_same_metadata() {
    let a = descriptor_map(1.0);
    let zero = subtract(&a, &a).unwrap();
    assert!(equal_metadata(&zero, &a));
    assert!(equal(&zero, &zeros_like(&a, None).unwrap()));
}

#[test]
fn test_multiply_then_divide_roundtrips() {
    let a = descriptor_map(1.0);
    let b = descriptor_map(2.0);
    let back = divide(&multiply(&a, &b).unwrap(), &b).unwrap();
    assert!(allclose(&back, &a, &loose()));
}

#[test]
fn test_scalar_operations_compose() {
    let a = descriptor_map(1.0);
    let r = subtract(&multiply(&add(&a, 2.0).unwrap(), 3.0).unwrap(), 6.0).unwrap();
    assert!(allclose(&r, &multiply(&a, 3.0).unwrap(), &loose()));
    // scalar addition leaves gradients untouched
    let shifted = add(&a, 5.0).unwrap();
    for (left, right) in shifted.blocks().iter().zip(a.blocks()) {
        assert_eq!(left.gradient("positions").unwrap(), right.gradient("positions").unwrap());
    }
}

#[test]
fn test_mismatched_key_sets() {
    let a = descriptor_map(0.0);
    let keys = Labels::new(["species"], vec![vec![1], vec![6]]).unwrap();
    let b = TensorMap::new(
        keys,
        vec![descriptor_block(&[0, 0, 1], 0.0), descriptor_block(&[1, 2], 0.0)],
    )
    .unwrap();
    assert!(matches!(add(&a, &b), Err(TensorError::Validation(_))));
}

// ── Selection ──────────────────────────────────────────────────

#[test]
fn test_slice_then_split_partition_samples() {
    let a = descriptor_map(0.0);
    let groups = [
        Labels::new(["structure"], vec![vec![0], vec![3]]).unwrap(),
        Labels::new(["structure"], vec![vec![1], vec![2]]).unwrap(),
    ];
    let parts = split(&a, Axis::Samples, &groups).unwrap();
    assert_eq!(parts.len(), 2);
    for (key, block) in a.iter() {
        let total: usize = parts.iter().map(|p| p.block(key).unwrap().samples().count()).sum();
        assert_eq!(total, block.samples().count());
    }

    let direct = slice(&a, Axis::Samples, &groups[0]).unwrap();
    assert!(equal(&direct, &parts[0]));
}

#[test]
fn test_unique_structures() {
    let a = descriptor_map(0.0);
    let structures = unique_metadata(&a, Axis::Samples, &["structure"], None).unwrap();
    assert_eq!(structures.to_rows(), vec![vec![0], vec![1], vec![2], vec![3]]);
    let atoms = unique_metadata(&a, Axis::Samples, &["atom"], Some("positions")).unwrap();
    assert_eq!(atoms.to_rows(), vec![vec![0], vec![1], vec![2], vec![3]]);
}

// ── Linear algebra ─────────────────────────────────────────────

#[test]
fn test_solve_reference_values() {
    let keys = Labels::new(["key"], vec![vec![0], vec![1]]).unwrap();
    let samples = Labels::new(["s"], vec![vec![0], vec![2]]).unwrap();
    let x_block = || {
        simple_block(&[2, 2], vec![1.0, 2.0, 3.0, 5.0], samples.clone(), Labels::range("p", 2).unwrap())
    };
    let x = TensorMap::new(keys.clone(), vec![x_block(), x_block()]).unwrap();
    let y = TensorMap::new(
        keys,
        vec![
            simple_block(&[2, 1], vec![1.0, 2.0], samples.clone(), Labels::range("y", 1).unwrap()),
            simple_block(&[2, 1], vec![2.0, 4.0], samples.clone(), Labels::range("y", 1).unwrap()),
        ],
    )
    .unwrap();

    let w = solve(&x, &y).unwrap();
    let expected = [[-1.0, 1.0], [-2.0, 2.0]];
    for (block, expected) in w.blocks().iter().zip(expected) {
        let values = block.values().to_vec();
        assert!((values[0] - expected[0]).abs() < 1e-12);
        assert!((values[1] - expected[1]).abs() < 1e-12);
        assert_eq!(block.samples(), &Labels::range("y", 1).unwrap());
        assert_eq!(block.properties(), &Labels::range("p", 2).unwrap());
    }

    let back = dot(&x, &w).unwrap();
    assert!(allclose(&back, &y, &loose()));
}

#[test]
fn test_dot_with_components_and_gradients() {
    let a = descriptor_map(0.0);
    let weights = |rows: usize| {
        simple_block(
            &[rows, 2],
            (0..rows * 2).map(|i| i as f64 - 1.0).collect(),
            Labels::range("target", rows).unwrap(),
            Labels::new(["n"], vec![vec![0], vec![1]]).unwrap(),
        )
    };
    let b = TensorMap::new(a.keys().clone(), vec![weights(4), weights(4), weights(4)]).unwrap();
    let r = dot(&a, &b).unwrap();
    let block = r.block(&[6]).unwrap();
    assert_eq!(block.values().shape(), &[2, 3, 4]);
    assert_eq!(block.components(), a.block(&[6]).unwrap().components());
    let gradient = block.gradient("positions").unwrap();
    assert_eq!(gradient.values().shape(), &[2, 3, 3, 4]);
    assert_eq!(gradient.properties(), &Labels::range("target", 4).unwrap());
}

// ── Creation ───────────────────────────────────────────────────

#[test]
fn test_ones_like_reference_map() {
    let keys = Labels::new(["key"], vec![vec![0], vec![1]]).unwrap();
    let block = || {
        simple_block(
            &[2, 2],
            vec![1.0, 2.0, 3.0, 5.0],
            Labels::new(["s"], vec![vec![0], vec![2]]).unwrap(),
            Labels::range("p", 2).unwrap(),
        )
    };
    let map = TensorMap::new(keys, vec![block(), block()]).unwrap();
    let ones = ones_like(&map, None).unwrap();
    assert!(equal_metadata(&ones, &map));
    for block in ones.blocks() {
        assert_eq!(block.values().to_vec(), vec![1.0; 4]);
    }
}

#[test]
fn test_zeros_like_without_gradients() {
    let a = descriptor_map(0.0);
    let zeros = zeros_like(&a, Some(&[])).unwrap();
    assert!(zeros.gradients_list().is_empty());
    assert!(!equal_metadata(&zeros, &a));
}
