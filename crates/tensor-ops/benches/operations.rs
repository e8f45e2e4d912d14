// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for map arithmetic and splitting.

use array_backend::{Array, DenseArray};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use labeled_tensor::{Labels, TensorBlock, TensorMap};
use tensor_ops::{multiply, split, Axis};

const STRUCTURES: i32 = 100;
const ATOMS: i32 = 20;

fn block(properties: usize) -> TensorBlock {
    let rows: Vec<Vec<i32>> = (0..STRUCTURES)
        .flat_map(|s| (0..ATOMS).map(move |a| vec![s, a]))
        .collect();
    let n = rows.len();
    let values =
        <DenseArray as Array>::from_shape_vec(&[n, properties], (0..n * properties).map(|i| i as f64).collect())
            .unwrap();
    let gradient_rows: Vec<Vec<i32>> = (0..n as i32).map(|s| vec![s, 0]).collect();
    let gradient = TensorBlock::new(
        <DenseArray as Array>::full(&[n, 3, properties], 0.5),
        Labels::new(["sample", "atom"], gradient_rows).unwrap(),
        vec![Labels::range("xyz", 3).unwrap()],
        Labels::range("n", properties).unwrap(),
    )
    .unwrap();
    TensorBlock::new(
        values,
        Labels::new(["structure", "atom"], rows).unwrap(),
        vec![],
        Labels::range("n", properties).unwrap(),
    )
    .unwrap()
    .with_gradient("positions", gradient)
    .unwrap()
}

fn map() -> TensorMap {
    let keys = Labels::new(["species"], vec![vec![1], vec![6], vec![8]]).unwrap();
    TensorMap::new(keys, vec![block(32), block(32), block(32)]).unwrap()
}

fn bench_multiply(c: &mut Criterion) {
    let a = map();
    let b = map();
    c.bench_function("multiply 3 blocks with gradients", |bench| {
        bench.iter(|| black_box(multiply(&a, &b).unwrap()))
    });
}

fn bench_split(c: &mut Criterion) {
    let a = map();
    let groups: Vec<Labels> = (0..10)
        .map(|g| {
            let rows = (0..STRUCTURES / 10).map(|s| vec![g * 10 + s]).collect();
            Labels::new(["structure"], rows).unwrap()
        })
        .collect();
    c.bench_function("split samples into 10 groups", |bench| {
        bench.iter(|| black_box(split(&a, Axis::Samples, &groups).unwrap()))
    });
}

criterion_group!(benches, bench_multiply, bench_split);
criterion_main!(benches);
