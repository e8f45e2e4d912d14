// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Saving and loading tensor maps as uncompressed zip archives of `.npy`
//! arrays.

use crate::error::IoError;
use crate::npy;
use array_backend::{Array, ArrayError, DenseArray};
use labeled_tensor::{Labels, TensorBlock, TensorMap};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// File extension appended by [`save`] when missing.
pub const EXTENSION: &str = "npz";

// ── Saving ─────────────────────────────────────────────────────

/// Writes `map` to `path` and returns the path actually written.
///
/// If `path` does not end in `.npz`, the extension is appended (not
/// substituted) and a warning is logged.
///
/// # Errors
/// Returns [`IoError::Io`] if the file cannot be written.
pub fn save<A: Array>(path: impl AsRef<Path>, map: &TensorMap<A>) -> Result<PathBuf, IoError> {
    let path = path.as_ref();
    let path = if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
        path.to_path_buf()
    } else {
        let mut with_extension = path.as_os_str().to_owned();
        with_extension.push(".");
        with_extension.push(EXTENSION);
        let with_extension = PathBuf::from(with_extension);
        tracing::warn!(
            "adding '.{EXTENSION}' extension, the file will be saved at '{}'",
            with_extension.display()
        );
        with_extension
    };

    let buffer = save_buffer(map)?;
    std::fs::write(&path, &buffer)?;
    tracing::info!(
        "saved tensor map with {} blocks to '{}' ({:.2} KB)",
        map.len(),
        path.display(),
        buffer.len() as f64 / 1024.0,
    );
    Ok(path)
}

/// Encodes `map` into an in-memory archive.
pub fn save_buffer<A: Array>(map: &TensorMap<A>) -> Result<Vec<u8>, IoError> {
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
    writer.labels("keys", map.keys())?;
    for (i, block) in map.blocks().iter().enumerate() {
        let prefix = format!("blocks/{i}");
        writer.block(&prefix, block, false)?;
        for (parameter, gradient) in block.gradients() {
            writer.block(&format!("{prefix}/gradients/{parameter}"), gradient, true)?;
        }
    }
    Ok(writer.finish()?.into_inner())
}

struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
        }
    }

    fn entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), IoError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(bytes.len() as u64 >= u32::MAX as u64);
        self.zip.start_file(format!("{name}.npy"), options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn labels(&mut self, name: &str, labels: &Labels) -> Result<(), IoError> {
        self.entry(
            name,
            &npy::write_labels(labels.names(), labels.count(), labels.values()),
        )
    }

    /// Writes values, samples and components. Properties are only written
    /// for blocks that are not gradients.
    fn block<A: Array>(
        &mut self,
        prefix: &str,
        block: &TensorBlock<A>,
        is_gradient: bool,
    ) -> Result<(), IoError> {
        let values = block.values();
        self.entry(
            &format!("{prefix}/values"),
            &npy::write_f64(values.shape(), &values.to_vec()),
        )?;
        self.labels(&format!("{prefix}/samples"), block.samples())?;
        for (j, component) in block.components().iter().enumerate() {
            self.labels(&format!("{prefix}/components/{j}"), component)?;
        }
        if !is_gradient {
            self.labels(&format!("{prefix}/properties"), block.properties())?;
        }
        Ok(())
    }

    fn finish(self) -> Result<W, IoError> {
        Ok(self.zip.finish()?)
    }
}

// ── Loading ────────────────────────────────────────────────────

/// Reads a map with dense values from `path`.
///
/// The file is memory-mapped rather than read into memory.
///
/// # Errors
/// - [`IoError::Io`] / [`IoError::Zip`] if the file cannot be opened or is
///   not a zip archive.
/// - [`IoError::MissingEntry`] if a required array is absent.
/// - [`IoError::Format`] if an array has an unexpected dtype or shape.
/// - [`IoError::Tensor`] if the arrays do not form a valid map.
pub fn load(path: impl AsRef<Path>) -> Result<TensorMap<DenseArray>, IoError> {
    load_custom_array(path, dense_array)
}

/// Reads a map with dense values from an in-memory archive.
pub fn load_buffer(bytes: &[u8]) -> Result<TensorMap<DenseArray>, IoError> {
    load_buffer_custom_array(bytes, dense_array)
}

/// Reads a map from `path`, building each array with `create(shape, data)`.
///
/// `data` is in row-major order.
pub fn load_custom_array<A, F>(path: impl AsRef<Path>, create: F) -> Result<TensorMap<A>, IoError>
where
    A: Array,
    F: Fn(&[usize], Vec<f64>) -> Result<A, ArrayError>,
{
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }?;
    tracing::debug!(
        "mmap'd '{}' ({:.2} KB)",
        path.display(),
        mmap.len() as f64 / 1024.0
    );
    let map = load_buffer_custom_array(&mmap[..], create)?;
    tracing::info!(
        "loaded tensor map with {} blocks from '{}'",
        map.len(),
        path.display()
    );
    Ok(map)
}

/// Reads a map from an in-memory archive, building each array with
/// `create(shape, data)`.
pub fn load_buffer_custom_array<A, F>(bytes: &[u8], create: F) -> Result<TensorMap<A>, IoError>
where
    A: Array,
    F: Fn(&[usize], Vec<f64>) -> Result<A, ArrayError>,
{
    let mut reader = ArchiveReader::new(Cursor::new(bytes))?;
    let keys = reader.labels("keys")?;

    let mut blocks = Vec::with_capacity(keys.count());
    for i in 0..keys.count() {
        let prefix = format!("blocks/{i}");
        let mut block = reader.block(&prefix, None, &create)?;
        for parameter in reader.gradient_parameters(&prefix) {
            let gradient = reader.block(
                &format!("{prefix}/gradients/{parameter}"),
                Some(block.properties()),
                &create,
            )?;
            block.add_gradient(parameter, gradient)?;
        }
        blocks.push(block);
    }
    Ok(TensorMap::new(keys, blocks)?)
}

fn dense_array(shape: &[usize], data: Vec<f64>) -> Result<DenseArray, ArrayError> {
    <DenseArray as Array>::from_shape_vec(shape, data)
}

struct ArchiveReader<R: Read + Seek> {
    zip: ZipArchive<R>,
    /// Gradient parameters per block prefix (`blocks/{i}`), unique, in the
    /// order their `values` entry first appears in the central directory.
    gradients: HashMap<String, Vec<String>>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    fn new(inner: R) -> Result<Self, IoError> {
        let zip = ZipArchive::new(inner)?;
        let mut gradients: HashMap<String, Vec<String>> = HashMap::new();
        for name in (0..zip.len()).filter_map(|i| zip.name_for_index(i)) {
            if let Some((prefix, parameter)) = split_gradient_values(name) {
                let parameters = gradients.entry(prefix).or_default();
                if !parameters.iter().any(|p| p == parameter) {
                    parameters.push(parameter.to_string());
                }
            }
        }
        Ok(Self { zip, gradients })
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, IoError> {
        let mut file = match self.zip.by_name(&format!("{name}.npy")) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(IoError::MissingEntry {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        // the declared size comes from the archive, so it is not trusted
        // for preallocation
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn labels(&mut self, name: &str) -> Result<Labels, IoError> {
        let (names, values) = npy::read_labels(&self.read(name)?, name)?;
        Ok(Labels::from_flat(names, values)?)
    }

    /// Takes the gradient parameters of the block at `prefix`.
    fn gradient_parameters(&mut self, prefix: &str) -> Vec<String> {
        self.gradients.remove(prefix).unwrap_or_default()
    }

    /// Reads the block stored under `prefix`. Gradient blocks take the
    /// properties of their parent instead of reading them.
    fn block<A, F>(
        &mut self,
        prefix: &str,
        parent_properties: Option<&Labels>,
        create: &F,
    ) -> Result<TensorBlock<A>, IoError>
    where
        A: Array,
        F: Fn(&[usize], Vec<f64>) -> Result<A, ArrayError>,
    {
        let values_name = format!("{prefix}/values");
        let (shape, data) = npy::read_f64(&self.read(&values_name)?, &values_name)?;
        if shape.len() < 2 {
            return Err(IoError::format(
                &values_name,
                format!("block values need at least two dimensions, got shape {shape:?}"),
            ));
        }
        let values = create(&shape, data)?;

        let samples = self.labels(&format!("{prefix}/samples"))?;
        let components = (0..shape.len() - 2)
            .map(|j| self.labels(&format!("{prefix}/components/{j}")))
            .collect::<Result<Vec<_>, _>>()?;
        let properties = match parent_properties {
            Some(properties) => properties.clone(),
            None => self.labels(&format!("{prefix}/properties"))?,
        };

        Ok(TensorBlock::new(values, samples, components, properties)?)
    }
}

/// Splits `blocks/{i}/gradients/{parameter}/values.npy` into the block
/// prefix and the parameter, which may itself contain `/`.
fn split_gradient_values(name: &str) -> Option<(String, &str)> {
    let (index, rest) = name.strip_prefix("blocks/")?.split_once('/')?;
    let parameter = rest
        .strip_prefix("gradients/")?
        .strip_suffix("/values.npy")?;
    if parameter.is_empty() {
        return None;
    }
    Some((format!("blocks/{index}"), parameter))
}
