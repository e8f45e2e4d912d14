// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: saving and loading maps through the file system.

use array_backend::{Array, DenseArray};
use labeled_tensor::{Labels, TensorBlock, TensorMap};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tensor_io::{load, load_buffer, load_custom_array, save, save_buffer, IoError};

// ── Helpers ────────────────────────────────────────────────────

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tensor-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn block(samples: Vec<Vec<i32>>, offset: f64) -> TensorBlock {
    let n = samples.len();
    let m = Labels::new(["m"], vec![vec![-1], vec![0], vec![1]]).unwrap();
    let values = <DenseArray as Array>::from_shape_vec(
        &[n, 3, 2],
        (0..n * 6).map(|i| offset + i as f64).collect(),
    )
    .unwrap();
    let gradient = TensorBlock::new(
        <DenseArray as Array>::from_shape_vec(
            &[n, 3, 3, 2],
            (0..n * 18).map(|i| -(i as f64)).collect(),
        )
        .unwrap(),
        Labels::new(
            ["sample", "structure", "atom"],
            (0..n as i32).map(|s| vec![s, 0, s]).collect(),
        )
        .unwrap(),
        vec![Labels::range("xyz", 3).unwrap(), m.clone()],
        Labels::range("n", 2).unwrap(),
    )
    .unwrap();
    TensorBlock::new(
        values,
        Labels::new(["structure", "center"], samples).unwrap(),
        vec![m],
        Labels::range("n", 2).unwrap(),
    )
    .unwrap()
    .with_gradient("positions", gradient)
    .unwrap()
}

fn map() -> TensorMap {
    let keys = Labels::new(
        ["spherical_harmonics_l", "species"],
        vec![vec![1, 6], vec![0, 1], vec![1, 1]],
    )
    .unwrap();
    TensorMap::new(
        keys,
        vec![
            block(vec![vec![0, 0], vec![0, 1]], 0.0),
            block(vec![vec![1, 0]], 100.0),
            block(vec![vec![0, 2], vec![1, 1], vec![2, 0]], 200.0),
        ],
    )
    .unwrap()
}

// ── Tests ──────────────────────────────────────────────────────

#[test]
fn test_file_roundtrip() {
    let original = map();
    let path = save(scratch("roundtrip.npz"), &original).unwrap();
    assert_eq!(path.extension().unwrap(), "npz");
    let back = load(&path).unwrap();
    assert_eq!(back, original);
    assert_eq!(back.keys().names(), original.keys().names());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_save_appends_extension() {
    let requested = scratch("descriptor.data");
    let path = save(&requested, &map()).unwrap();
    assert_eq!(path.file_name().unwrap(), "descriptor.data.npz");
    assert!(path.exists());
    assert!(!requested.exists());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_file_and_buffer_agree() {
    let original = map();
    let path = save(scratch("agree.npz"), &original).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, save_buffer(&original).unwrap());
    assert_eq!(load_buffer(&on_disk).unwrap(), original);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_empty_map_roundtrip() {
    let empty = TensorMap::<DenseArray>::new(Labels::empty(["species"]).unwrap(), vec![]).unwrap();
    let back = load_buffer(&save_buffer(&empty).unwrap()).unwrap();
    assert!(back.is_empty());
    assert_eq!(back.keys().names(), &["species".to_string()]);
}

#[test]
fn test_block_without_samples_roundtrip() {
    let original = map();
    let selection = Labels::new(["structure"], vec![vec![42]]).unwrap();
    let emptied = select_samples_everywhere(&original, &selection);
    let back = load_buffer(&save_buffer(&emptied).unwrap()).unwrap();
    assert_eq!(back, emptied);
    assert_eq!(back.block_by_id(0).unwrap().values().shape(), &[0, 3, 2]);
}

/// Slices samples block by block with the block API only.
fn select_samples_everywhere(map: &TensorMap, selection: &Labels) -> TensorMap {
    let blocks = map
        .blocks()
        .iter()
        .map(|b| b.select_samples(selection).unwrap())
        .collect();
    TensorMap::new(map.keys().clone(), blocks).unwrap()
}

#[test]
fn test_load_missing_file() {
    let err = load(scratch("does-not-exist.npz")).unwrap_err();
    assert!(matches!(err, IoError::Io(_)));
}

#[test]
fn test_load_custom_array_from_file() {
    let path = save(scratch("custom.npz"), &map()).unwrap();
    let back = load_custom_array(&path, |shape, data| {
        <DenseArray as Array>::from_shape_vec(shape, data.into_iter().map(f64::abs).collect())
    })
    .unwrap();
    let gradient = back.block_by_id(1).unwrap().gradient("positions").unwrap();
    assert!(gradient.values().to_vec().iter().all(|&v| v >= 0.0));
    std::fs::remove_file(path).unwrap();
}

// ── Archives written by other tools ────────────────────────────

fn npy(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
    let dict = format!("{{'descr': {descr}, 'fortran_order': False, 'shape': {shape}, }}\n");
    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend_from_slice(data);
    out
}

fn npy_values(rows: usize, cols: usize, values: &[f64]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy("'<f8'", &format!("({rows}, {cols})"), &data)
}

fn npy_labels(names: &[&str], rows: &[&[i32]]) -> Vec<u8> {
    let fields: Vec<String> = names.iter().map(|n| format!("('{n}', '<i4')")).collect();
    let data: Vec<u8> = rows.iter().flat_map(|r| r.iter()).flat_map(|v| v.to_le_bytes()).collect();
    npy(&format!("[{}]", fields.join(", ")), &format!("({},)", rows.len()), &data)
}

fn archive(entries: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        zip.start_file(name, options).unwrap();
        zip.write_all(&bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// One block with two samples and two properties, without gradients.
fn plain_block_entries() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("keys.npy", npy_labels(&["key"], &[&[0]])),
        ("blocks/0/values.npy", npy_values(2, 2, &[1.0, 2.0, 3.0, 4.0])),
        ("blocks/0/samples.npy", npy_labels(&["s"], &[&[0], &[1]])),
        ("blocks/0/properties.npy", npy_labels(&["p"], &[&[0], &[1]])),
    ]
}

fn gradient_entries(parameter: &'static str, fill: f64) -> Vec<(String, Vec<u8>)> {
    vec![
        (
            format!("blocks/0/gradients/{parameter}/values.npy"),
            npy_values(1, 2, &[fill, fill]),
        ),
        (
            format!("blocks/0/gradients/{parameter}/samples.npy"),
            npy_labels(&["sample"], &[&[1]]),
        ),
    ]
}

#[test]
fn test_load_gradients_in_archive_order() {
    let mut owned: Vec<(String, Vec<u8>)> = Vec::new();
    // a gradient stored before the values of its block
    owned.extend(gradient_entries("strain", 2.0));
    owned.extend(plain_block_entries().into_iter().map(|(n, b)| (n.to_string(), b)));
    owned.extend(gradient_entries("positions", 1.0));
    let bytes = archive(owned.iter().map(|(n, b)| (n.as_str(), b.clone())).collect());

    let map = load_buffer(&bytes).unwrap();
    let block = map.block_by_id(0).unwrap();
    assert_eq!(block.gradients_list(), vec!["strain", "positions"]);
    assert_eq!(block.gradient("strain").unwrap().values().to_vec(), vec![2.0, 2.0]);
    assert_eq!(block.gradient("positions").unwrap().properties(), block.properties());

    // saving keeps the loaded order
    let again = load_buffer(&save_buffer(&map).unwrap()).unwrap();
    assert_eq!(again, map);
}

#[test]
fn test_load_gradient_parameter_with_slash() {
    let mut owned: Vec<(String, Vec<u8>)> = plain_block_entries()
        .into_iter()
        .map(|(n, b)| (n.to_string(), b))
        .collect();
    owned.extend(gradient_entries("cell/strain", 3.0));
    let bytes = archive(owned.iter().map(|(n, b)| (n.as_str(), b.clone())).collect());

    let map = load_buffer(&bytes).unwrap();
    let block = map.block_by_id(0).unwrap();
    assert_eq!(block.gradients_list(), vec!["cell/strain"]);
    assert_eq!(load_buffer(&save_buffer(&map).unwrap()).unwrap(), map);
}

#[test]
fn test_load_truncated_values() {
    let mut entries = plain_block_entries();
    let mut values = npy_values(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    values.truncate(values.len() - 5);
    entries[1].1 = values;
    match load_buffer(&archive(entries)) {
        Err(IoError::Format { entry, .. }) => assert_eq!(entry, "blocks/0/values"),
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn test_load_garbage_entry() {
    let mut entries = plain_block_entries();
    entries[2].1 = b"this is not an array".to_vec();
    match load_buffer(&archive(entries)) {
        Err(IoError::Format { entry, .. }) => assert_eq!(entry, "blocks/0/samples"),
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn test_load_oversized_label_shape() {
    let keys = npy(
        "[('a', '<i4'), ('b', '<i4')]",
        "(4611686018427387904,)",
        &[],
    );
    match load_buffer(&archive(vec![("keys.npy", keys)])) {
        Err(IoError::Format { entry, detail }) => {
            assert_eq!(entry, "keys");
            assert!(detail.contains("too large"));
        }
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn test_load_without_keys() {
    let entries: Vec<_> = plain_block_entries().into_iter().skip(1).collect();
    match load_buffer(&archive(entries)) {
        Err(IoError::MissingEntry { name }) => assert_eq!(name, "keys"),
        other => panic!("expected a missing entry, got {other:?}"),
    }
}
