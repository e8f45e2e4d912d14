// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Splitting a map or block into several along one axis.

use crate::slice::{slice, slice_block, Axis};
use array_backend::Array;
use labeled_tensor::{Labels, TensorBlock, TensorError, TensorMap};

/// Splits `map` into one map per entry of `groups`, each holding the
/// entries of `axis` selected by that group.
///
/// Every output has the keys of `map`. An empty group list yields no output.
///
/// # Errors
/// Returns [`TensorError::Validation`] if the groups do not all share the
/// same dimension names, or if those names are not dimensions of `axis`.
///
/// # Examples
/// ```
/// use array_backend::{Array, DenseArray};
/// use labeled_tensor::{Labels, TensorBlock, TensorMap};
/// use tensor_ops::{split, Axis};
///
/// let samples = Labels::new(["structure"], vec![vec![0], vec![2], vec![6]]).unwrap();
/// let block = TensorBlock::new(
///     <DenseArray as Array>::full(&[3, 1], 1.0),
///     samples,
///     vec![],
///     Labels::range("p", 1).unwrap(),
/// ).unwrap();
/// let map = TensorMap::new(Labels::single(), vec![block]).unwrap();
///
/// let groups = [
///     Labels::new(["structure"], vec![vec![0], vec![6]]).unwrap(),
///     Labels::new(["structure"], vec![vec![2]]).unwrap(),
/// ];
/// let parts = split(&map, Axis::Samples, &groups).unwrap();
/// assert_eq!(parts.len(), 2);
/// assert_eq!(parts[0].block_by_id(0).unwrap().samples().count(), 2);
/// ```
pub fn split<A: Array>(
    map: &TensorMap<A>,
    axis: Axis,
    groups: &[Labels],
) -> Result<Vec<TensorMap<A>>, TensorError> {
    check_groups(map.blocks().first(), axis, groups)?;
    tracing::debug!(axis = %axis, groups = groups.len(), "splitting tensor map");
    groups
        .iter()
        .map(|group| slice(map, axis, group))
        .collect()
}

/// Block form of [`split`].
pub fn split_block<A: Array>(
    block: &TensorBlock<A>,
    axis: Axis,
    groups: &[Labels],
) -> Result<Vec<TensorBlock<A>>, TensorError> {
    check_groups(Some(block), axis, groups)?;
    groups
        .iter()
        .map(|group| slice_block(block, axis, group))
        .collect()
}

fn check_groups<A: Array>(
    reference: Option<&TensorBlock<A>>,
    axis: Axis,
    groups: &[Labels],
) -> Result<(), TensorError> {
    let Some(first) = groups.first() else {
        return Ok(());
    };
    let names = first.names();
    if let Some(group) = groups.iter().find(|group| group.names() != names) {
        return Err(TensorError::Validation(format!(
            "the dimension names of all selections must be the same, got {:?} and {:?}",
            names,
            group.names()
        )));
    }

    if let Some(block) = reference {
        let axis_names = axis.labels(block).names();
        if let Some(missing) = names.iter().find(|name| !axis_names.contains(*name)) {
            return Err(TensorError::Validation(format!(
                "the selection dimension '{missing}' is not part of the {axis} names {axis_names:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_backend::DenseArray;

    fn block() -> TensorBlock {
        let values =
            <DenseArray as Array>::from_shape_vec(&[4, 3], (0..12).map(f64::from).collect())
                .unwrap();
        let samples = Labels::new(
            ["structure", "atom"],
            vec![vec![0, 0], vec![2, 0], vec![3, 1], vec![6, 2]],
        )
        .unwrap();
        TensorBlock::new(values, samples, vec![], Labels::range("n", 3).unwrap()).unwrap()
    }

    fn group(names: &[&str], rows: Vec<Vec<i32>>) -> Labels {
        Labels::new(names.iter().copied(), rows).unwrap()
    }

    #[test]
    fn test_split_samples() {
        let groups = [
            group(&["structure"], vec![vec![0], vec![6]]),
            group(&["structure"], vec![vec![2], vec![3]]),
        ];
        let parts = split_block(&block(), Axis::Samples, &groups).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].samples().to_rows(), vec![vec![0, 0], vec![6, 2]]);
        assert_eq!(parts[0].values().to_vec(), vec![0.0, 1.0, 2.0, 9.0, 10.0, 11.0]);
        assert_eq!(parts[1].samples().to_rows(), vec![vec![2, 0], vec![3, 1]]);
    }

    #[test]
    fn test_split_properties() {
        let groups = [group(&["n"], vec![vec![2]]), group(&["n"], vec![vec![0], vec![1]])];
        let parts = split_block(&block(), Axis::Properties, &groups).unwrap();
        assert_eq!(parts[0].values().to_vec(), vec![2.0, 5.0, 8.0, 11.0]);
        assert_eq!(parts[1].properties().count(), 2);
    }

    #[test]
    fn test_split_empty_groups() {
        assert!(split_block(&block(), Axis::Samples, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_split_mismatched_group_names() {
        let groups = [
            group(&["structure"], vec![vec![0]]),
            group(&["atom"], vec![vec![0]]),
        ];
        assert!(matches!(
            split_block(&block(), Axis::Samples, &groups),
            Err(TensorError::Validation(_))
        ));
    }

    #[test]
    fn test_split_names_not_on_axis() {
        let groups = [group(&["structure"], vec![vec![0]])];
        let err = split_block(&block(), Axis::Properties, &groups).unwrap_err();
        assert!(err.to_string().contains("properties"));
    }

    #[test]
    fn test_split_map_keeps_keys() {
        let keys = Labels::new(["k"], vec![vec![3], vec![1]]).unwrap();
        let map = TensorMap::new(keys.clone(), vec![block(), block()]).unwrap();
        let groups = [group(&["atom"], vec![vec![0]])];
        let parts = split(&map, Axis::Samples, &groups).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].keys(), &keys);
        assert_eq!(parts[0].block(&[1]).unwrap().samples().count(), 2);
    }
}
