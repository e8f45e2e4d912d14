// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Unique metadata entries along an axis.

use crate::slice::Axis;
use array_backend::Array;
use labeled_tensor::{Labels, TensorBlock, TensorError, TensorMap};

/// Returns the sorted unique entries of `axis`, projected on `names`, across
/// all blocks of `map`.
///
/// With `gradient = Some(parameter)` the samples (or properties) of that
/// gradient are used instead of the block's own.
///
/// # Errors
/// - [`TensorError::NotFound`] if a name is not a dimension of `axis` or the
///   gradient does not exist.
pub fn unique_metadata<A: Array>(
    map: &TensorMap<A>,
    axis: Axis,
    names: &[&str],
    gradient: Option<&str>,
) -> Result<Labels, TensorError> {
    let mut unique = Labels::empty(names.iter().copied())?;
    for block in map.blocks() {
        unique = unique.union(&unique_metadata_block(block, axis, names, gradient)?)?;
    }
    Ok(unique.sorted())
}

/// Block form of [`unique_metadata`].
pub fn unique_metadata_block<A: Array>(
    block: &TensorBlock<A>,
    axis: Axis,
    names: &[&str],
    gradient: Option<&str>,
) -> Result<Labels, TensorError> {
    let target = match gradient {
        Some(parameter) => block.gradient(parameter)?,
        None => block,
    };
    Ok(axis.labels(target).project(names)?.sorted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_backend::DenseArray;

    fn block(structures: &[i32]) -> TensorBlock {
        let rows: Vec<Vec<i32>> = structures
            .iter()
            .enumerate()
            .map(|(atom, &s)| vec![s, atom as i32])
            .collect();
        let n = rows.len();
        let gradient = TensorBlock::new(
            <DenseArray as Array>::full(&[2, 1], 0.0),
            Labels::new(["sample", "atom"], vec![vec![0, 5], vec![0, 3]]).unwrap(),
            vec![],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap();
        TensorBlock::new(
            <DenseArray as Array>::full(&[n, 1], 0.0),
            Labels::new(["structure", "center"], rows).unwrap(),
            vec![],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap()
        .with_gradient("positions", gradient)
        .unwrap()
    }

    #[test]
    fn test_unique_block() {
        let r = unique_metadata_block(&block(&[4, 1, 4, 0]), Axis::Samples, &["structure"], None)
            .unwrap();
        assert_eq!(r.to_rows(), vec![vec![0], vec![1], vec![4]]);
    }

    #[test]
    fn test_unique_map_merges_blocks() {
        let keys = Labels::new(["k"], vec![vec![0], vec![1]]).unwrap();
        let map = TensorMap::new(keys, vec![block(&[3, 1]), block(&[2, 1, 0])]).unwrap();
        let r = unique_metadata(&map, Axis::Samples, &["structure"], None).unwrap();
        assert_eq!(r.to_rows(), vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_unique_gradient_samples() {
        let r = unique_metadata_block(&block(&[1]), Axis::Samples, &["atom"], Some("positions"))
            .unwrap();
        assert_eq!(r.to_rows(), vec![vec![3], vec![5]]);
    }

    #[test]
    fn test_unique_empty_map() {
        let map = TensorMap::<DenseArray>::new(Labels::empty(["k"]).unwrap(), vec![]).unwrap();
        let r = unique_metadata(&map, Axis::Properties, &["p"], None).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.names(), &["p".to_string()]);
    }

    #[test]
    fn test_unique_unknown_name() {
        assert!(matches!(
            unique_metadata_block(&block(&[0]), Axis::Samples, &["species"], None),
            Err(TensorError::NotFound(_))
        ));
    }
}
