// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named integer-tuple index sets.
//!
//! A [`Labels`] describes one axis of a block (or the keys of a map): a list
//! of dimension names and one `i32` row per entry. Rows are stored flat, in
//! row-major order, next to a `row → position` hash index.

use crate::TensorError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

/// An immutable, ordered set of unique integer rows with named dimensions.
///
/// Equality is structural and order-sensitive (same names, same rows in the
/// same order). Use [`Labels::is_same_set`] for the order-insensitive check.
#[derive(Clone)]
pub struct Labels {
    names: Vec<String>,
    values: Vec<i32>,
    count: usize,
    /// Row → position index. Filled during validation, or lazily for labels
    /// derived from an already-valid instance.
    index: OnceLock<HashMap<Vec<i32>, usize>>,
}

impl Labels {
    /// Creates labels from dimension names and one row per entry.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if a name is repeated or is not a
    /// valid identifier, if a row does not have one value per name, or if two
    /// rows are identical.
    ///
    /// # Examples
    /// ```
    /// use labeled_tensor::Labels;
    /// let l = Labels::new(["structure", "atom"], vec![vec![0, 1], vec![0, 2]]).unwrap();
    /// assert_eq!(l.count(), 2);
    /// assert_eq!(l.position(&[0, 2]), Some(1));
    /// ```
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        rows: Vec<Vec<i32>>,
    ) -> Result<Self, TensorError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let size = names.len();
        let mut values = Vec::with_capacity(rows.len() * size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(TensorError::Validation(format!(
                    "row {i} of labels {names:?} has {} values, expected {size}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::validated(names, values, rows.len())
    }

    /// Creates labels from dimension names and a flat row-major buffer.
    pub fn from_flat<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        values: Vec<i32>,
    ) -> Result<Self, TensorError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let size = names.len();
        if size == 0 {
            if !values.is_empty() {
                return Err(TensorError::Validation(
                    "labels without dimensions cannot hold values".into(),
                ));
            }
            return Self::validated(names, values, 0);
        }
        if values.len() % size != 0 {
            return Err(TensorError::Validation(format!(
                "{} values cannot be split in rows of {size} for labels {names:?}",
                values.len()
            )));
        }
        let count = values.len() / size;
        Self::validated(names, values, count)
    }

    /// Labels with a single dimension `name` and rows `0..n`.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if `name` is not a valid name or
    /// if `n` exceeds `i32::MAX`.
    pub fn range(name: &str, n: usize) -> Result<Self, TensorError> {
        let end = i32::try_from(n).map_err(|_| {
            TensorError::Validation(format!(
                "a range of {n} entries does not fit in i32 label values"
            ))
        })?;
        let names = vec![name.to_string()];
        validate_names(&names)?;
        Ok(Self::from_unchecked(names, (0..end).collect(), n))
    }

    /// The conventional labels of a single entry: `"_"` = `[[0]]`.
    pub fn single() -> Self {
        Self::from_unchecked(vec!["_".to_string()], vec![0], 1)
    }

    /// Labels with the given dimensions and no entry.
    pub fn empty<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, TensorError> {
        Self::from_flat(names, Vec::new())
    }

    /// Builds labels whose rows are already known to be unique and whose
    /// names are already known to be valid.
    pub(crate) fn from_unchecked(names: Vec<String>, values: Vec<i32>, count: usize) -> Self {
        debug_assert_eq!(values.len(), count * names.len());
        Self {
            names,
            values,
            count,
            index: OnceLock::new(),
        }
    }

    fn validated(names: Vec<String>, values: Vec<i32>, count: usize) -> Result<Self, TensorError> {
        validate_names(&names)?;
        if names.is_empty() && count != 0 {
            return Err(TensorError::Validation(
                "labels without dimensions cannot hold entries".into(),
            ));
        }

        let size = names.len();
        let mut index = HashMap::with_capacity(count);
        for i in 0..count {
            let row = &values[i * size..(i + 1) * size];
            if let Some(first) = index.insert(row.to_vec(), i) {
                return Err(TensorError::Validation(format!(
                    "duplicate entry {row:?} in labels {names:?} (rows {first} and {i})"
                )));
            }
        }

        let labels = Self::from_unchecked(names, values, count);
        let _ = labels.index.set(index);
        Ok(labels)
    }

    fn index(&self) -> &HashMap<Vec<i32>, usize> {
        self.index.get_or_init(|| {
            (0..self.count)
                .map(|i| (self.row(i).to_vec(), i))
                .collect()
        })
    }

    /// Returns the dimension names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the number of dimensions (the length of each row).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Returns the number of entries (rows).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if there is no entry.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns all rows as one flat row-major slice.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Returns the row at `position`.
    ///
    /// # Panics
    /// Panics if `position >= self.count()`.
    pub fn row(&self, position: usize) -> &[i32] {
        assert!(
            position < self.count,
            "row {position} out of bounds for labels with {} entries",
            self.count
        );
        let size = self.size();
        &self.values[position * size..(position + 1) * size]
    }

    /// Returns the row at `position`, or `None` if out of bounds.
    pub fn get(&self, position: usize) -> Option<&[i32]> {
        (position < self.count).then(|| self.row(position))
    }

    /// Iterates over the rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &[i32]> + '_ {
        (0..self.count).map(move |i| self.row(i))
    }

    /// Copies the rows out as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        self.iter().map(<[i32]>::to_vec).collect()
    }

    /// Returns `true` if `row` is one of the entries.
    pub fn contains(&self, row: &[i32]) -> bool {
        self.position(row).is_some()
    }

    /// Returns the position of `row`, or `None` if it is not an entry.
    pub fn position(&self, row: &[i32]) -> Option<usize> {
        if row.len() != self.size() {
            return None;
        }
        self.index().get(row).copied()
    }

    /// Returns `true` if both labels have the same names and the same rows,
    /// in any order.
    pub fn is_same_set(&self, other: &Labels) -> bool {
        self.names == other.names
            && self.count == other.count
            && other.iter().all(|row| self.contains(row))
    }

    /// Returns the position of each of `names` among the dimensions.
    ///
    /// # Errors
    /// Returns [`TensorError::NotFound`] for an unknown name and
    /// [`TensorError::Validation`] for a repeated one.
    pub fn dimension_positions(&self, names: &[&str]) -> Result<Vec<usize>, TensorError> {
        let mut seen = HashSet::with_capacity(names.len());
        names
            .iter()
            .map(|name| {
                if !seen.insert(*name) {
                    return Err(TensorError::Validation(format!(
                        "dimension '{name}' is requested more than once"
                    )));
                }
                self.names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| {
                        TensorError::NotFound(format!(
                            "dimension '{name}' is not part of labels {:?}",
                            self.names
                        ))
                    })
            })
            .collect()
    }

    /// Projects every row onto `names`, keeping the first occurrence of each
    /// projected row.
    pub fn project(&self, names: &[&str]) -> Result<Labels, TensorError> {
        let positions = self.dimension_positions(names)?;
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for row in self.iter() {
            let projected: Vec<i32> = positions.iter().map(|&p| row[p]).collect();
            if seen.insert(projected.clone()) {
                values.extend(projected);
            }
        }
        let names = names.iter().map(|n| n.to_string()).collect();
        Ok(Self::from_unchecked(names, values, seen.len()))
    }

    /// Returns the same rows sorted lexicographically.
    pub fn sorted(&self) -> Labels {
        let mut rows = self.to_rows();
        rows.sort_unstable();
        let values = rows.into_iter().flatten().collect();
        Self::from_unchecked(self.names.clone(), values, self.count)
    }

    /// Returns the positions of the rows whose projection on
    /// `selection.names()` is one of the `selection` entries, in the original
    /// order. Selection entries with no counterpart are ignored.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if a selection dimension is not
    /// part of these labels.
    pub fn matching_positions(&self, selection: &Labels) -> Result<Vec<usize>, TensorError> {
        let names: Vec<&str> = selection.names.iter().map(String::as_str).collect();
        let positions = self.dimension_positions(&names).map_err(|_| {
            TensorError::Validation(format!(
                "selection dimensions {:?} are not a subset of {:?}",
                selection.names, self.names
            ))
        })?;

        let mut projected = Vec::with_capacity(positions.len());
        Ok((0..self.count)
            .filter(|&i| {
                let row = self.row(i);
                projected.clear();
                projected.extend(positions.iter().map(|&p| row[p]));
                selection.contains(&projected)
            })
            .collect())
    }

    /// Keeps the rows at `positions`, in that order.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if a position is out of bounds or
    /// repeated.
    pub fn take(&self, positions: &[usize]) -> Result<Labels, TensorError> {
        let mut seen = HashSet::with_capacity(positions.len());
        let mut values = Vec::with_capacity(positions.len() * self.size());
        for &p in positions {
            if p >= self.count {
                return Err(TensorError::Validation(format!(
                    "position {p} is out of bounds for labels with {} entries",
                    self.count
                )));
            }
            if !seen.insert(p) {
                return Err(TensorError::Validation(format!(
                    "position {p} is selected more than once"
                )));
            }
            values.extend_from_slice(self.row(p));
        }
        Ok(Self::from_unchecked(
            self.names.clone(),
            values,
            positions.len(),
        ))
    }

    /// Rows of `self` followed by the rows of `other` not already present.
    pub fn union(&self, other: &Labels) -> Result<Labels, TensorError> {
        self.check_same_names("union", other)?;
        let mut values = self.values.clone();
        let mut count = self.count;
        for row in other.iter().filter(|row| !self.contains(row)) {
            values.extend_from_slice(row);
            count += 1;
        }
        Ok(Self::from_unchecked(self.names.clone(), values, count))
    }

    /// Rows of `self` that are also in `other`, in `self` order.
    pub fn intersection(&self, other: &Labels) -> Result<Labels, TensorError> {
        self.check_same_names("intersection", other)?;
        let positions: Vec<usize> = (0..self.count)
            .filter(|&i| other.contains(self.row(i)))
            .collect();
        self.take(&positions)
    }

    /// Rows of `self` that are not in `other`, in `self` order.
    pub fn difference(&self, other: &Labels) -> Result<Labels, TensorError> {
        self.check_same_names("difference", other)?;
        let positions: Vec<usize> = (0..self.count)
            .filter(|&i| !other.contains(self.row(i)))
            .collect();
        self.take(&positions)
    }

    fn check_same_names(&self, op: &str, other: &Labels) -> Result<(), TensorError> {
        if self.names != other.names {
            return Err(TensorError::Validation(format!(
                "{op} of labels with different names: {:?} and {:?}",
                self.names, other.names
            )));
        }
        Ok(())
    }
}

/// Names must be unique, non-empty identifiers.
fn validate_names(names: &[String]) -> Result<(), TensorError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) => (c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
            None => false,
        };
        if !valid {
            return Err(TensorError::Validation(format!(
                "'{name}' is not a valid label name"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(TensorError::Validation(format!(
                "label name '{name}' is used more than once in {names:?}"
            )));
        }
    }
    Ok(())
}

impl PartialEq for Labels {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names && self.count == other.count && self.values == other.values
    }
}

impl Eq for Labels {}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labels")
            .field("names", &self.names)
            .field("values", &self.to_rows())
            .finish()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Labels {:?} ({} entries)", self.names, self.count)?;
        for row in self.iter() {
            writeln!(f, "  {row:?}")?;
        }
        Ok(())
    }
}
