// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A single dense block and its axis metadata.
//!
//! A [`TensorBlock`] owns one array and the [`Labels`] of each of its axes:
//!
//! ```text
//! values.shape == [samples.count(), components[0].count(), ..., properties.count()]
//! ```
//!
//! Gradient blocks are attached per parameter name. Their first sample
//! dimension is `"sample"` and points at a row of the parent's samples; their
//! trailing components repeat the parent's components; their properties are
//! the parent's properties. Gradients cannot themselves have gradients.

use crate::{Labels, TensorError};
use array_backend::{Array, DenseArray};
use std::fmt;

/// Name of the gradient sample dimension that refers back to the parent sample.
pub const GRADIENT_SAMPLE: &str = "sample";

/// One dense array with labeled axes and optional gradient blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBlock<A: Array = DenseArray> {
    values: A,
    samples: Labels,
    components: Vec<Labels>,
    properties: Labels,
    /// Gradient blocks, in attach order.
    gradients: Vec<(String, TensorBlock<A>)>,
}

impl<A: Array> TensorBlock<A> {
    /// Creates a block, checking that the array shape matches the labels.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if `values` has rank < 2, if the
    /// number of component labels differs from `rank - 2`, or if any axis
    /// length differs from the corresponding labels count.
    pub fn new(
        values: A,
        samples: Labels,
        components: Vec<Labels>,
        properties: Labels,
    ) -> Result<Self, TensorError> {
        let shape = values.shape();
        if shape.len() < 2 {
            return Err(TensorError::Validation(format!(
                "block values must have at least two dimensions (samples and properties), got shape {shape:?}"
            )));
        }
        if components.len() != shape.len() - 2 {
            return Err(TensorError::Validation(format!(
                "values of shape {shape:?} need {} component labels, got {}",
                shape.len() - 2,
                components.len()
            )));
        }
        if shape[0] != samples.count() {
            return Err(TensorError::Validation(format!(
                "the samples labels have {} entries, but values have {} rows",
                samples.count(),
                shape[0]
            )));
        }
        for (i, component) in components.iter().enumerate() {
            if shape[i + 1] != component.count() {
                return Err(TensorError::Validation(format!(
                    "component {i} labels have {} entries, but values dimension {} has length {}",
                    component.count(),
                    i + 1,
                    shape[i + 1]
                )));
            }
        }
        let last = shape[shape.len() - 1];
        if last != properties.count() {
            return Err(TensorError::Validation(format!(
                "the properties labels have {} entries, but the last values dimension has length {last}",
                properties.count()
            )));
        }

        Ok(Self {
            values,
            samples,
            components,
            properties,
            gradients: Vec::new(),
        })
    }

    /// Returns the values array.
    pub fn values(&self) -> &A {
        &self.values
    }

    /// Returns the labels of the first axis.
    pub fn samples(&self) -> &Labels {
        &self.samples
    }

    /// Returns the labels of the middle axes.
    pub fn components(&self) -> &[Labels] {
        &self.components
    }

    /// Returns the labels of the last axis.
    pub fn properties(&self) -> &Labels {
        &self.properties
    }

    /// Attaches `gradient` as the gradient with respect to `parameter`.
    ///
    /// # Errors
    /// - [`TensorError::NotImplemented`] if `gradient` has gradients itself.
    /// - [`TensorError::Validation`] if `parameter` is already attached, if
    ///   the properties differ from this block's, if the first gradient sample
    ///   dimension is not `"sample"` or refers to a missing parent sample, or
    ///   if the gradient components do not end with this block's components.
    pub fn add_gradient(
        &mut self,
        parameter: impl Into<String>,
        gradient: TensorBlock<A>,
    ) -> Result<(), TensorError> {
        let parameter = parameter.into();

        if !gradient.gradients.is_empty() {
            return Err(TensorError::NotImplemented(format!(
                "gradients of gradients are not supported: the gradient with respect to '{parameter}' has gradients {:?}",
                gradient.gradients_list()
            )));
        }
        if self.has_gradient(&parameter) {
            return Err(TensorError::Validation(format!(
                "gradient with respect to '{parameter}' already exists for this block"
            )));
        }
        if gradient.properties != self.properties {
            return Err(TensorError::Validation(format!(
                "the gradient with respect to '{parameter}' must have the same properties as the block"
            )));
        }

        let samples = &gradient.samples;
        if samples.names().first().map(String::as_str) != Some(GRADIENT_SAMPLE) {
            return Err(TensorError::Validation(format!(
                "the first dimension of the gradient samples must be '{GRADIENT_SAMPLE}', got {:?}",
                samples.names()
            )));
        }
        let n_samples = self.samples.count();
        if let Some(row) = samples
            .iter()
            .find(|row| row[0] < 0 || row[0] as usize >= n_samples)
        {
            return Err(TensorError::Validation(format!(
                "gradient sample {row:?} refers to sample {}, but the block only has {n_samples} samples",
                row[0]
            )));
        }

        let n_parent = self.components.len();
        let n_gradient = gradient.components.len();
        if n_gradient < n_parent || gradient.components[n_gradient - n_parent..] != self.components[..] {
            return Err(TensorError::Validation(format!(
                "the gradient with respect to '{parameter}' must end with the block components"
            )));
        }

        tracing::trace!(parameter = %parameter, rows = samples.count(), "attached gradient");
        self.gradients.push((parameter, gradient));
        Ok(())
    }

    /// Consuming form of [`TensorBlock::add_gradient`].
    pub fn with_gradient(
        mut self,
        parameter: impl Into<String>,
        gradient: TensorBlock<A>,
    ) -> Result<Self, TensorError> {
        self.add_gradient(parameter, gradient)?;
        Ok(self)
    }

    /// Returns the gradient with respect to `parameter`.
    pub fn gradient(&self, parameter: &str) -> Result<&TensorBlock<A>, TensorError> {
        self.gradients
            .iter()
            .find(|(p, _)| p == parameter)
            .map(|(_, g)| g)
            .ok_or_else(|| {
                TensorError::NotFound(format!(
                    "no gradient with respect to '{parameter}' in this block"
                ))
            })
    }

    /// Returns `true` if a gradient with respect to `parameter` is attached.
    pub fn has_gradient(&self, parameter: &str) -> bool {
        self.gradients.iter().any(|(p, _)| p == parameter)
    }

    /// Returns the gradient parameter names in attach order.
    pub fn gradients_list(&self) -> Vec<&str> {
        self.gradients.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Iterates over `(parameter, gradient)` pairs in attach order.
    pub fn gradients(&self) -> impl Iterator<Item = (&str, &TensorBlock<A>)> + '_ {
        self.gradients.iter().map(|(p, g)| (p.as_str(), g))
    }

    /// For a gradient block, returns the parent sample row of each gradient row.
    ///
    /// # Errors
    /// Returns [`TensorError::Validation`] if the first sample dimension is not
    /// `"sample"` or holds a negative value.
    pub fn parent_rows(&self) -> Result<Vec<usize>, TensorError> {
        if self.samples.names().first().map(String::as_str) != Some(GRADIENT_SAMPLE) {
            return Err(TensorError::Validation(format!(
                "gradient samples must start with '{GRADIENT_SAMPLE}', got {:?}",
                self.samples.names()
            )));
        }
        self.samples
            .iter()
            .map(|row| {
                usize::try_from(row[0]).map_err(|_| {
                    TensorError::Validation(format!("negative parent sample in gradient row {row:?}"))
                })
            })
            .collect()
    }

    /// Keeps the samples whose projection on `selection.names()` is one of
    /// the `selection` entries, in their original order.
    ///
    /// Gradient rows pointing at a removed sample are dropped and the others
    /// are renumbered to the new sample positions.
    pub fn select_samples(&self, selection: &Labels) -> Result<Self, TensorError> {
        let kept = self.samples.matching_positions(selection)?;
        self.take_samples(&kept)
    }

    /// Keeps the properties whose projection on `selection.names()` is one of
    /// the `selection` entries, in their original order. Gradients are sliced
    /// the same way.
    pub fn select_properties(&self, selection: &Labels) -> Result<Self, TensorError> {
        let kept = self.properties.matching_positions(selection)?;
        self.take_properties(&kept)
    }

    /// Keeps the samples at `positions`, in that order.
    pub fn take_samples(&self, positions: &[usize]) -> Result<Self, TensorError> {
        let samples = self.samples.take(positions)?;
        let values = self.values.select(0, positions)?;

        let mut new_position = vec![None; self.samples.count()];
        for (new, &old) in positions.iter().enumerate() {
            new_position[old] = Some(new as i32);
        }

        let mut gradients = Vec::with_capacity(self.gradients.len());
        for (parameter, gradient) in &self.gradients {
            let size = gradient.samples.size();
            let mut rows = Vec::new();
            let mut flat = Vec::new();
            for (g, row) in gradient.samples.iter().enumerate() {
                if let Some(parent) = new_position[row[0] as usize] {
                    rows.push(g);
                    flat.push(parent);
                    flat.extend_from_slice(&row[1..]);
                }
            }
            debug_assert_eq!(flat.len(), rows.len() * size);

            // Renumbering is injective on the kept rows, so they stay unique.
            let grad_samples =
                Labels::from_unchecked(gradient.samples.names().to_vec(), flat, rows.len());
            let grad_values = gradient.values.select(0, &rows)?;

            gradients.push((
                parameter.clone(),
                TensorBlock {
                    values: grad_values,
                    samples: grad_samples,
                    components: gradient.components.clone(),
                    properties: gradient.properties.clone(),
                    gradients: Vec::new(),
                },
            ));
        }

        Ok(Self {
            values,
            samples,
            components: self.components.clone(),
            properties: self.properties.clone(),
            gradients,
        })
    }

    /// Keeps the properties at `positions`, in that order.
    pub fn take_properties(&self, positions: &[usize]) -> Result<Self, TensorError> {
        let properties = self.properties.take(positions)?;
        let axis = self.values.rank() - 1;
        let values = self.values.select(axis, positions)?;

        let mut gradients = Vec::with_capacity(self.gradients.len());
        for (parameter, gradient) in &self.gradients {
            let axis = gradient.values.rank() - 1;
            gradients.push((
                parameter.clone(),
                TensorBlock {
                    values: gradient.values.select(axis, positions)?,
                    samples: gradient.samples.clone(),
                    components: gradient.components.clone(),
                    properties: properties.clone(),
                    gradients: Vec::new(),
                },
            ));
        }

        Ok(Self {
            values,
            samples: self.samples.clone(),
            components: self.components.clone(),
            properties,
            gradients,
        })
    }

    /// Returns a block with the same metadata and gradients structure whose
    /// arrays are produced by `f`.
    ///
    /// `f` receives `None` for the block values and `Some(parameter)` for
    /// each gradient. Shapes must be preserved.
    pub fn map_values<F>(&self, mut f: F) -> Result<Self, TensorError>
    where
        F: FnMut(Option<&str>, &A) -> Result<A, TensorError>,
    {
        let mut result = TensorBlock::new(
            f(None, &self.values)?,
            self.samples.clone(),
            self.components.clone(),
            self.properties.clone(),
        )?;
        for (parameter, gradient) in &self.gradients {
            let values = f(Some(parameter), &gradient.values)?;
            let gradient = TensorBlock::new(
                values,
                gradient.samples.clone(),
                gradient.components.clone(),
                gradient.properties.clone(),
            )?;
            result.add_gradient(parameter.clone(), gradient)?;
        }
        Ok(result)
    }

    /// Splits the block into its array and labels, dropping gradients.
    pub fn into_parts(self) -> (A, Labels, Vec<Labels>, Labels) {
        (self.values, self.samples, self.components, self.properties)
    }
}

fn quoted(names: &[String]) -> String {
    let inner: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", inner.join(", "))
}

impl<A: Array> fmt::Display for TensorBlock<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let component_sizes: Vec<String> =
            self.components.iter().map(|c| c.count().to_string()).collect();
        let component_names: Vec<String> =
            self.components.iter().flat_map(|c| c.names().to_vec()).collect();

        writeln!(f, "TensorBlock")?;
        writeln!(
            f,
            "    samples ({}): {}",
            self.samples.count(),
            quoted(self.samples.names())
        )?;
        writeln!(
            f,
            "    components ({}): {}",
            component_sizes.join(", "),
            quoted(&component_names)
        )?;
        writeln!(
            f,
            "    properties ({}): {}",
            self.properties.count(),
            quoted(self.properties.names())
        )?;
        let gradients: Vec<String> = self.gradients.iter().map(|(p, _)| p.clone()).collect();
        write!(f, "    gradients: {}", quoted(&gradients))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(shape: &[usize], data: Vec<f64>) -> DenseArray {
        <DenseArray as Array>::from_shape_vec(shape, data).unwrap()
    }

    fn rows(names: &[&str], rows: &[&[i32]]) -> Labels {
        Labels::new(names.iter().copied(), rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    /// Block with 3 samples, one 2-entry component and 2 properties, plus a
    /// "positions" gradient with rows for samples 0 and 2.
    fn block_with_gradient() -> TensorBlock {
        let values = array(&[3, 2, 2], (0..12).map(f64::from).collect());
        let mut block = TensorBlock::new(
            values,
            rows(&["structure"], &[&[0], &[1], &[2]]),
            vec![Labels::range("m", 2).unwrap()],
            Labels::range("n", 2).unwrap(),
        )
        .unwrap();

        let gradient = TensorBlock::new(
            array(&[2, 3, 2, 2], (0..24).map(|x| f64::from(x) * 0.5).collect()),
            rows(&["sample", "atom"], &[&[0, 4], &[2, 7]]),
            vec![Labels::range("xyz", 3).unwrap(), Labels::range("m", 2).unwrap()],
            Labels::range("n", 2).unwrap(),
        )
        .unwrap();
        block.add_gradient("positions", gradient).unwrap();
        block
    }

    #[test]
    fn test_shape_validation() {
        let values = array(&[2, 3], vec![0.0; 6]);
        assert!(TensorBlock::new(values.clone(), Labels::range("s", 2).unwrap(), vec![], Labels::range("p", 3).unwrap()).is_ok());
        assert!(TensorBlock::new(values.clone(), Labels::range("s", 3).unwrap(), vec![], Labels::range("p", 3).unwrap()).is_err());
        assert!(TensorBlock::new(values.clone(), Labels::range("s", 2).unwrap(), vec![], Labels::range("p", 2).unwrap()).is_err());
        assert!(TensorBlock::new(
            values,
            Labels::range("s", 2).unwrap(),
            vec![Labels::range("c", 3).unwrap()],
            Labels::range("p", 3).unwrap()
        )
        .is_err());

        let rank_one = array(&[4], vec![0.0; 4]);
        assert!(TensorBlock::new(rank_one, Labels::range("s", 4).unwrap(), vec![], Labels::range("p", 4).unwrap()).is_err());
    }

    #[test]
    fn test_gradient_access() {
        let block = block_with_gradient();
        assert_eq!(block.gradients_list(), vec!["positions"]);
        assert!(block.has_gradient("positions"));
        assert_eq!(block.gradient("positions").unwrap().samples().count(), 2);
        assert!(matches!(block.gradient("cell"), Err(TensorError::NotFound(_))));
        assert_eq!(
            block.gradient("positions").unwrap().parent_rows().unwrap(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_gradient_order_is_attach_order() {
        let mut block = TensorBlock::new(
            array(&[1, 1], vec![1.0]),
            Labels::range("s", 1).unwrap(),
            vec![],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap();
        for parameter in ["zeta", "alpha", "mu"] {
            let gradient = TensorBlock::new(
                array(&[1, 1], vec![0.0]),
                Labels::range("sample", 1).unwrap(),
                vec![],
                Labels::range("p", 1).unwrap(),
            )
            .unwrap();
            block.add_gradient(parameter, gradient).unwrap();
        }
        assert_eq!(block.gradients_list(), vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_add_gradient_errors() {
        let mut block = block_with_gradient();
        let make = |samples: Labels, properties: Labels| -> TensorBlock {
            let (n, p) = (samples.count(), properties.count());
            TensorBlock::new(
                array(&[n, 2, p], vec![0.0; n * 2 * p]),
                samples,
                vec![Labels::range("m", 2).unwrap()],
                properties,
            )
            .unwrap()
        };

        // Duplicate parameter.
        let g = make(rows(&["sample"], &[&[0]]), Labels::range("n", 2).unwrap());
        assert!(matches!(block.add_gradient("positions", g), Err(TensorError::Validation(_))));

        // Different properties.
        let g = make(rows(&["sample"], &[&[0]]), Labels::range("n", 3).unwrap());
        assert!(matches!(block.add_gradient("cell", g), Err(TensorError::Validation(_))));

        // First sample dimension is not "sample".
        let g = make(rows(&["structure"], &[&[0]]), Labels::range("n", 2).unwrap());
        assert!(matches!(block.add_gradient("cell", g), Err(TensorError::Validation(_))));

        // Parent sample out of range.
        let g = make(rows(&["sample"], &[&[3]]), Labels::range("n", 2).unwrap());
        assert!(matches!(block.add_gradient("cell", g), Err(TensorError::Validation(_))));

        // Missing parent component.
        let g = TensorBlock::new(
            array(&[1, 2], vec![0.0; 2]),
            rows(&["sample"], &[&[0]]),
            vec![],
            Labels::range("n", 2).unwrap(),
        )
        .unwrap();
        assert!(matches!(block.add_gradient("cell", g), Err(TensorError::Validation(_))));
    }

    #[test]
    fn test_gradients_of_gradients_are_rejected() {
        let mut parent = TensorBlock::new(
            array(&[1, 1], vec![1.0]),
            Labels::range("s", 1).unwrap(),
            vec![],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap();
        let leaf = TensorBlock::new(
            array(&[1, 1], vec![0.0]),
            Labels::range("sample", 1).unwrap(),
            vec![],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap();
        let nested = leaf.clone().with_gradient("inner", leaf).unwrap();
        let err = parent.add_gradient("outer", nested).unwrap_err();
        assert!(matches!(err, TensorError::NotImplemented(_)));
    }

    #[test]
    fn test_select_samples_remaps_gradients() {
        let block = block_with_gradient();
        let selection = rows(&["structure"], &[&[2], &[1], &[42]]);
        let sliced = block.select_samples(&selection).unwrap();

        // Original order is kept: structure 1 then 2.
        assert_eq!(sliced.samples().to_rows(), vec![vec![1], vec![2]]);
        assert_eq!(sliced.values().shape(), &[2, 2, 2]);
        assert_eq!(Array::to_vec(sliced.values())[..4], [4.0, 5.0, 6.0, 7.0]);

        // Only the gradient row of structure 2 survives, now pointing at row 1.
        let gradient = sliced.gradient("positions").unwrap();
        assert_eq!(gradient.samples().to_rows(), vec![vec![1, 7]]);
        assert_eq!(gradient.values().shape(), &[1, 3, 2, 2]);
        assert_eq!(Array::to_vec(gradient.values())[0], 6.0);
    }

    #[test]
    fn test_select_properties() {
        let block = block_with_gradient();
        let selection = rows(&["n"], &[&[1]]);
        let sliced = block.select_properties(&selection).unwrap();
        assert_eq!(sliced.properties().to_rows(), vec![vec![1]]);
        assert_eq!(sliced.values().shape(), &[3, 2, 1]);
        assert_eq!(Array::to_vec(sliced.values())[..2], [1.0, 3.0]);

        let gradient = sliced.gradient("positions").unwrap();
        assert_eq!(gradient.properties(), sliced.properties());
        assert_eq!(gradient.values().shape(), &[2, 3, 2, 1]);
    }

    #[test]
    fn test_select_with_full_labels_is_identity() {
        let block = block_with_gradient();
        let all = block.samples().clone();
        assert_eq!(block.select_samples(&all).unwrap(), block);
    }

    #[test]
    fn test_map_values() {
        let block = block_with_gradient();
        let doubled = block.map_values(|_, v| Ok(v.mul_scalar(2.0))).unwrap();
        assert_eq!(Array::to_vec(doubled.values())[3], 6.0);
        assert_eq!(doubled.gradients_list(), vec!["positions"]);
    }

    #[test]
    fn test_display() {
        let block = block_with_gradient();
        let text = block.to_string();
        assert!(text.contains("samples (3): ['structure']"));
        assert!(text.contains("components (2): ['m']"));
        assert!(text.contains("properties (2): ['n']"));
        assert!(text.contains("gradients: ['positions']"));
    }
}
