//! Linkability matrix.
//!
//! A fixed-shape table of combination counts indexed `[output][input]`.
//! The shape is fixed at construction; ragged input is rejected instead of
//! surfacing later as an out-of-bounds index.

use serde::{Deserialize, Serialize};

/// Error type for matrix construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// A row has a different length than the first row.
    #[error("Ragged matrix: row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Offending row index.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// Flat cell buffer does not match the declared shape.
    #[error("Cell count {found} does not match shape {rows}x{cols}")]
    CellCount {
        /// Declared rows.
        rows: usize,
        /// Declared columns.
        cols: usize,
        /// Number of cells supplied.
        found: usize,
    },
    /// Matrix shape disagrees with the transaction's outputs × inputs.
    #[error("Matrix shape {found_rows}x{found_cols} does not match {outputs} outputs x {inputs} inputs")]
    ShapeMismatch {
        /// Rows in the matrix.
        found_rows: usize,
        /// Columns in the matrix.
        found_cols: usize,
        /// Number of outputs.
        outputs: usize,
        /// Number of inputs.
        inputs: usize,
    },
    /// A cell counts more combinations than exist.
    #[error("Cell [{output}][{input}] = {value} exceeds nb_cmbn = {nb_cmbn}")]
    CellExceedsCombinations {
        /// Output (row) index.
        output: usize,
        /// Input (column) index.
        input: usize,
        /// Cell value.
        value: u64,
        /// Total combinations.
        nb_cmbn: u64,
    },
}

/// Linkability matrix: `cell(o, i)` is the number of valid combinations in
/// which output `o` is fed, at least in part, by input `i`.
///
/// Stored row-major. Serializes as a list of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u64>>", into = "Vec<Vec<u64>>")]
pub struct LinkabilityMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<u64>,
}

impl LinkabilityMatrix {
    /// Create a matrix from a flat row-major buffer.
    pub fn new(rows: usize, cols: usize, cells: Vec<u64>) -> Result<Self, MatrixError> {
        if cells.len() != rows * cols {
            return Err(MatrixError::CellCount {
                rows,
                cols,
                found: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Create a matrix from nested rows (one row per output).
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut cells = Vec::with_capacity(n_rows * n_cols);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(MatrixError::Ragged {
                    row,
                    expected: n_cols,
                    found: values.len(),
                });
            }
            cells.extend(values);
        }

        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            cells,
        })
    }

    /// Number of rows (outputs).
    pub fn num_outputs(&self) -> usize {
        self.rows
    }

    /// Number of columns (inputs).
    pub fn num_inputs(&self) -> usize {
        self.cols
    }

    /// Shape as `(outputs, inputs)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell value, or `None` when out of bounds.
    pub fn get(&self, output: usize, input: usize) -> Option<u64> {
        if output < self.rows && input < self.cols {
            Some(self.cells[output * self.cols + input])
        } else {
            None
        }
    }

    /// Set a cell. Returns `false` when out of bounds.
    pub fn set(&mut self, output: usize, input: usize, value: u64) -> bool {
        if output < self.rows && input < self.cols {
            self.cells[output * self.cols + input] = value;
            true
        } else {
            false
        }
    }

    /// One output's row.
    pub fn row(&self, output: usize) -> Option<&[u64]> {
        if output < self.rows {
            let start = output * self.cols;
            Some(&self.cells[start..start + self.cols])
        } else {
            None
        }
    }

    /// Iterate over rows in output order.
    ///
    /// Always yields `num_outputs()` rows, including when there are no
    /// inputs (coinbase transactions), so the nested form keeps its shape.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    /// Check the matrix against the transaction it describes.
    ///
    /// Dimensions must equal `outputs × inputs` and no cell may exceed
    /// `nb_cmbn`.
    pub fn validate_against(
        &self,
        nb_cmbn: u64,
        inputs: usize,
        outputs: usize,
    ) -> Result<(), MatrixError> {
        let cols_ok = self.cols == inputs || (self.rows == 0 && outputs == 0);
        if self.rows != outputs || !cols_ok {
            return Err(MatrixError::ShapeMismatch {
                found_rows: self.rows,
                found_cols: self.cols,
                outputs,
                inputs,
            });
        }

        for (idx, &value) in self.cells.iter().enumerate() {
            if value > nb_cmbn {
                return Err(MatrixError::CellExceedsCombinations {
                    output: idx / self.cols,
                    input: idx % self.cols,
                    value,
                    nb_cmbn,
                });
            }
        }

        Ok(())
    }

    /// Link probabilities (`cell / nb_cmbn`), or `None` when `nb_cmbn == 0`.
    pub fn probabilities(&self, nb_cmbn: u64) -> Option<Vec<Vec<f64>>> {
        if nb_cmbn == 0 {
            return None;
        }
        let total = nb_cmbn as f64;
        Some(
            self.rows()
                .map(|row| row.iter().map(|&v| v as f64 / total).collect())
                .collect(),
        )
    }

    /// Nested-row copy of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.rows().map(<[u64]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<u64>>> for LinkabilityMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<u64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<LinkabilityMatrix> for Vec<Vec<u64>> {
    fn from(matrix: LinkabilityMatrix) -> Self {
        matrix.to_rows()
    }
}
