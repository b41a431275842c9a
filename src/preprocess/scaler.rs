use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How per-feature statistics are turned into an affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// `(x - mean) / std`, population standard deviation.
    Standard,
    /// `(x - min) / (max - min)`.
    MinMax,
}

/// Per-feature `(x - offset) / scale`, fitted on training rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub kind: ScalerKind,
    pub offset: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Learns offset and scale from `rows`. Constant columns get scale 1 so
    /// they map to zero instead of NaN.
    pub fn fit(kind: ScalerKind, rows: &[Vec<f64>]) -> Result<Scaler> {
        let width = check_rows(rows)?;
        let n = rows.len() as f64;

        let mut offset = vec![0.0; width];
        let mut scale = vec![1.0; width];

        for j in 0..width {
            let column = rows.iter().map(|r| r[j]);
            let (o, s) = match kind {
                ScalerKind::Standard => {
                    let mean = column.clone().sum::<f64>() / n;
                    let var = column.map(|x| (x - mean).powi(2)).sum::<f64>() / n;
                    (mean, var.sqrt())
                }
                ScalerKind::MinMax => {
                    let min = column.clone().fold(f64::INFINITY, f64::min);
                    let max = column.fold(f64::NEG_INFINITY, f64::max);
                    (min, max - min)
                }
            };
            offset[j] = o;
            scale[j] = if s > f64::EPSILON { s } else { 1.0 };
        }

        Ok(Scaler { kind, offset, scale })
    }

    pub fn width(&self) -> usize {
        self.offset.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(Error::Preprocessing(format!(
                "scaler expects {} features, got {}",
                self.width(),
                row.len()
            )));
        }
        Ok(row.iter()
            .zip(self.offset.iter().zip(self.scale.iter()))
            .map(|(x, (o, s))| (x - o) / s)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

/// Returns the common width of `rows`, rejecting empty, ragged or
/// non-finite input.
fn check_rows(rows: &[Vec<f64>]) -> Result<usize> {
    let width = rows.first()
        .map(|r| r.len())
        .ok_or_else(|| Error::Preprocessing("cannot fit a scaler on zero rows".into()))?;
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::Preprocessing(format!(
                "row {} has {} features, expected {}",
                i, row.len(), width
            )));
        }
        if let Some(j) = row.iter().position(|x| !x.is_finite()) {
            return Err(Error::Preprocessing(format!("row {}, feature {} is not finite", i, j)));
        }
    }
    Ok(width)
}
