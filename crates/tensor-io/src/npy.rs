// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The NumPy `.npy` array format, restricted to what archives need.
//!
//! ```text
//! \x93NUMPY <major> <minor> <header length> <header> <data>
//! ```
//!
//! The header is a Python dict literal with `descr`, `fortran_order` and
//! `shape`, padded with spaces and a final newline so that the data starts
//! on a 64-byte boundary. Version 1.0 stores the header length on two bytes,
//! versions 2.0 and 3.0 on four.
//!
//! Two dtypes are supported: `'<f8'` for values and structured dtypes whose
//! fields are all `'<i4'` for labels.

use crate::error::IoError;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;
const FLOAT_DESCR: &str = "<f8";
const INT_DESCR: &str = "<i4";

/// Encodes a C-ordered `'<f8'` array.
pub(crate) fn write_f64(shape: &[usize], data: &[f64]) -> Vec<u8> {
    debug_assert_eq!(shape.iter().product::<usize>(), data.len());
    let descr = format!("'{FLOAT_DESCR}'");
    let mut out = header(&descr, &shape_literal(shape));
    out.reserve(data.len() * 8);
    for value in data {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Encodes labels as a 1-D structured array with one `'<i4'` field per name.
pub(crate) fn write_labels(names: &[String], count: usize, values: &[i32]) -> Vec<u8> {
    debug_assert_eq!(names.len() * count, values.len());
    let fields: Vec<String> = names
        .iter()
        .map(|name| format!("('{name}', '{INT_DESCR}')"))
        .collect();
    let descr = format!("[{}]", fields.join(", "));
    let mut out = header(&descr, &shape_literal(&[count]));
    out.reserve(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decodes a `'<f8'` array into its shape and row-major data.
///
/// Fortran-ordered arrays are transposed to row-major.
pub(crate) fn read_f64(bytes: &[u8], entry: &str) -> Result<(Vec<usize>, Vec<f64>), IoError> {
    let (header, data) = parse(bytes, entry)?;
    match &header.descr {
        Descr::Scalar(descr) if descr == FLOAT_DESCR => {}
        other => {
            return Err(IoError::format(
                entry,
                format!("expected dtype '{FLOAT_DESCR}', got {other}"),
            ))
        }
    }

    let expected = data_len(&header.shape, 8, entry)?;
    if data.len() != expected {
        return Err(IoError::format(
            entry,
            format!(
                "shape {:?} needs {expected} bytes of data, found {}",
                header.shape,
                data.len()
            ),
        ));
    }
    let values: Vec<f64> = data
        .chunks_exact(8)
        .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap_or([0; 8])))
        .collect();

    let values = if header.fortran_order {
        fortran_to_c_order(values, &header.shape)
            .map_err(|e| IoError::format(entry, format!("cannot reorder Fortran array: {e}")))?
    } else {
        values
    };
    Ok((header.shape, values))
}

/// Decodes a structured `'<i4'` array into its field names and flat rows.
pub(crate) fn read_labels(bytes: &[u8], entry: &str) -> Result<(Vec<String>, Vec<i32>), IoError> {
    let (header, data) = parse(bytes, entry)?;
    let names = match header.descr {
        Descr::Fields(fields) => {
            let mut names = Vec::with_capacity(fields.len());
            for (name, descr) in fields {
                if descr != INT_DESCR {
                    return Err(IoError::format(
                        entry,
                        format!("label field '{name}' must have dtype '{INT_DESCR}', got '{descr}'"),
                    ));
                }
                names.push(name);
            }
            names
        }
        other => {
            return Err(IoError::format(
                entry,
                format!("expected a structured dtype for labels, got {other}"),
            ))
        }
    };
    let [count] = header.shape[..] else {
        return Err(IoError::format(
            entry,
            format!("labels must be one-dimensional, got shape {:?}", header.shape),
        ));
    };

    let expected = data_len(&[count, names.len()], 4, entry)?;
    if data.len() != expected {
        return Err(IoError::format(
            entry,
            format!("{count} labels need {expected} bytes of data, found {}", data.len()),
        ));
    }
    let values = data
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap_or([0; 4])))
        .collect();
    Ok((names, values))
}

/// Number of data bytes an array of `shape` occupies, or a format error if
/// that does not fit in `usize`.
fn data_len(shape: &[usize], item_size: usize, entry: &str) -> Result<usize, IoError> {
    shape
        .iter()
        .try_fold(item_size, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| IoError::format(entry, format!("shape {shape:?} is too large")))
}

// ── Header ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Descr {
    Scalar(String),
    Fields(Vec<(String, String)>),
}

impl std::fmt::Display for Descr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Descr::Scalar(descr) => write!(f, "'{descr}'"),
            Descr::Fields(fields) => write!(f, "structured {fields:?}"),
        }
    }
}

#[derive(Debug)]
struct Header {
    descr: Descr,
    fortran_order: bool,
    shape: Vec<usize>,
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({n},)"),
        dims => {
            let dims: Vec<String> = dims.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Builds magic, version, length and padded header for the given literals.
fn header(descr: &str, shape: &str) -> Vec<u8> {
    let dict = format!("{{'descr': {descr}, 'fortran_order': False, 'shape': {shape}, }}");

    let (version, length_bytes) = if dict.len() + ALIGNMENT < u16::MAX as usize {
        (1u8, 2)
    } else {
        (2u8, 4)
    };
    let prefix = MAGIC.len() + 2 + length_bytes;
    let unpadded = prefix + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(prefix + header_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[version, 0]);
    if length_bytes == 2 {
        out.extend_from_slice(&(header_len as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&(header_len as u32).to_le_bytes());
    }
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    out
}

/// Splits an encoded array into its parsed header and raw data.
fn parse<'a>(bytes: &'a [u8], entry: &str) -> Result<(Header, &'a [u8]), IoError> {
    if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(IoError::format(entry, "not a .npy array (bad magic string)"));
    }
    let major = bytes[MAGIC.len()];
    let rest = &bytes[MAGIC.len() + 2..];
    let (header_len, rest) = match major {
        1 => (u16::from_le_bytes([rest[0], rest[1]]) as usize, &rest[2..]),
        2 | 3 => {
            if rest.len() < 4 {
                return Err(IoError::format(entry, "truncated .npy header"));
            }
            (
                u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize,
                &rest[4..],
            )
        }
        other => {
            return Err(IoError::format(
                entry,
                format!("unsupported .npy version {other}.{}", bytes[MAGIC.len() + 1]),
            ))
        }
    };
    if rest.len() < header_len {
        return Err(IoError::format(entry, "truncated .npy header"));
    }
    let (text, data) = rest.split_at(header_len);
    let text = std::str::from_utf8(text)
        .map_err(|_| IoError::format(entry, "header is not valid text"))?;

    let header = interpret(text).map_err(|detail| IoError::format(entry, detail))?;
    Ok((header, data))
}

fn interpret(text: &str) -> Result<Header, String> {
    let PyLiteral::Dict(items) = Parser::new(text).parse_document()? else {
        return Err("header is not a dict".into());
    };
    let lookup = |key: &str| {
        items
            .iter()
            .find(|(k, _)| matches!(k, PyLiteral::Str(s) if s == key))
            .map(|(_, v)| v)
            .ok_or_else(|| format!("header has no '{key}' key"))
    };

    let descr = match lookup("descr")? {
        PyLiteral::Str(s) => Descr::Scalar(s.clone()),
        PyLiteral::Seq(fields) => {
            let mut parsed = Vec::with_capacity(fields.len());
            for field in fields {
                match field {
                    PyLiteral::Seq(pair) => match pair.as_slice() {
                        [PyLiteral::Str(name), PyLiteral::Str(dtype)] => {
                            parsed.push((name.clone(), dtype.clone()))
                        }
                        _ => return Err(format!("unsupported structured field {field:?}")),
                    },
                    _ => return Err(format!("unsupported structured field {field:?}")),
                }
            }
            Descr::Fields(parsed)
        }
        other => return Err(format!("unsupported descr {other:?}")),
    };
    let fortran_order = match lookup("fortran_order")? {
        PyLiteral::Bool(b) => *b,
        other => return Err(format!("fortran_order must be a bool, got {other:?}")),
    };
    let shape = match lookup("shape")? {
        PyLiteral::Seq(dims) => dims
            .iter()
            .map(|d| match d {
                PyLiteral::Int(n) => {
                    usize::try_from(*n).map_err(|_| format!("invalid shape dimension {n}"))
                }
                other => Err(format!("invalid shape dimension {other:?}")),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(format!("shape must be a tuple, got {other:?}")),
    };
    Ok(Header {
        descr,
        fortran_order,
        shape,
    })
}

fn fortran_to_c_order(data: Vec<f64>, shape: &[usize]) -> Result<Vec<f64>, ndarray::ShapeError> {
    if shape.len() < 2 {
        return Ok(data);
    }
    let reversed: Vec<usize> = shape.iter().rev().copied().collect();
    let array = ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&reversed), data)?;
    Ok(array.reversed_axes().iter().copied().collect())
}

// ── Python literal parser ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum PyLiteral {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    /// A tuple or a list.
    Seq(Vec<PyLiteral>),
    Dict(Vec<(PyLiteral, PyLiteral)>),
}

struct Parser<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text: text.as_bytes(),
            pos: 0,
        }
    }

    fn parse_document(&mut self) -> Result<PyLiteral, String> {
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.pos != self.text.len() {
            return Err(format!("trailing characters in header at offset {}", self.pos));
        }
        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), String> {
        self.skip_whitespace();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", byte as char, self.pos))
        }
    }

    fn parse_value(&mut self) -> Result<PyLiteral, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.parse_dict(),
            Some(b'(') => self.parse_seq(b'(', b')'),
            Some(b'[') => self.parse_seq(b'[', b']'),
            Some(quote @ (b'\'' | b'"')) => self.parse_str(quote),
            Some(b'-' | b'0'..=b'9') => self.parse_int(),
            Some(b'A'..=b'Z' | b'a'..=b'z') => self.parse_word(),
            Some(other) => Err(format!(
                "unexpected '{}' at offset {}",
                other as char, self.pos
            )),
            None => Err("unexpected end of header".into()),
        }
    }

    /// Parses comma-separated items up to `close`, allowing a trailing comma.
    fn parse_items<T>(
        &mut self,
        close: u8,
        mut item: impl FnMut(&mut Self) -> Result<T, String>,
    ) -> Result<Vec<T>, String> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(item(self)?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(format!("expected ',' or '{}' at offset {}", close as char, self.pos)),
            }
        }
    }

    fn parse_seq(&mut self, open: u8, close: u8) -> Result<PyLiteral, String> {
        self.expect(open)?;
        Ok(PyLiteral::Seq(self.parse_items(close, Self::parse_value)?))
    }

    fn parse_dict(&mut self) -> Result<PyLiteral, String> {
        self.expect(b'{')?;
        let items = self.parse_items(b'}', |p| {
            let key = p.parse_value()?;
            p.expect(b':')?;
            let value = p.parse_value()?;
            Ok((key, value))
        })?;
        Ok(PyLiteral::Dict(items))
    }

    fn parse_str(&mut self, quote: u8) -> Result<PyLiteral, String> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err("unterminated string in header".into()),
                Some(b'\\') => {
                    let escaped = self
                        .text
                        .get(self.pos + 1)
                        .copied()
                        .ok_or("unterminated escape in header")?;
                    out.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        other => other,
                    });
                    self.pos += 2;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        String::from_utf8(out)
            .map(PyLiteral::Str)
            .map_err(|_| "string in header is not valid UTF-8".into())
    }

    fn parse_int(&mut self) -> Result<PyLiteral, String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.text[start..self.pos])
            .map_err(|_| "invalid integer in header".to_string())?;
        let value = digits
            .parse::<i64>()
            .map_err(|e| format!("invalid integer '{digits}' in header: {e}"))?;
        // Python 2 long suffix, as in `(3L,)`
        if matches!(self.peek(), Some(b'L' | b'l')) {
            self.pos += 1;
        }
        Ok(PyLiteral::Int(value))
    }

    fn parse_word(&mut self) -> Result<PyLiteral, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'_')) {
            self.pos += 1;
        }
        match &self.text[start..self.pos] {
            b"True" => Ok(PyLiteral::Bool(true)),
            b"False" => Ok(PyLiteral::Bool(false)),
            b"None" => Ok(PyLiteral::None),
            other => Err(format!(
                "unknown identifier '{}' in header",
                String::from_utf8_lossy(other)
            )),
        }
    }
}
