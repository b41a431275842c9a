use tracing::debug;

use crate::data::RawTable;
use crate::error::{Error, Result};
use crate::features::encoding::{encode, Applicant, FeatureVector, Research, UniversityRating};

/// Accepted (normalised) header spellings per input column.
const GRE_COLUMNS: &[&str] = &["gre_score", "gre"];
const TOEFL_COLUMNS: &[&str] = &["toefl_score", "toefl"];
const SOP_COLUMNS: &[&str] = &["sop"];
const LOR_COLUMNS: &[&str] = &["lor"];
const CGPA_COLUMNS: &[&str] = &["cgpa"];
const RATING_COLUMNS: &[&str] = &["university_rating", "rating"];
const RESEARCH_COLUMNS: &[&str] = &["research"];
const LABEL_COLUMNS: &[&str] = &["admit_chance", "chance_of_admit", "admitted", "admission"];

/// Feature matrix plus the binary target for each row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub features: Vec<FeatureVector>,
    /// 0.0 or 1.0 per row.
    pub targets: Vec<f64>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

struct Columns {
    gre: usize,
    toefl: usize,
    sop: usize,
    lor: usize,
    cgpa: usize,
    rating: usize,
    research: usize,
    label: usize,
}

impl Columns {
    fn resolve(table: &RawTable) -> Result<Columns> {
        let find = |aliases: &[&str]| {
            table.column_index(aliases).ok_or_else(|| {
                Error::DataShape(format!(
                    "missing column '{}' (found: {})",
                    aliases[0],
                    table.headers.join(", ")
                ))
            })
        };
        Ok(Columns {
            gre: find(GRE_COLUMNS)?,
            toefl: find(TOEFL_COLUMNS)?,
            sop: find(SOP_COLUMNS)?,
            lor: find(LOR_COLUMNS)?,
            cgpa: find(CGPA_COLUMNS)?,
            rating: find(RATING_COLUMNS)?,
            research: find(RESEARCH_COLUMNS)?,
            label: find(LABEL_COLUMNS)?,
        })
    }
}

/// Splits the table into encoded features and binary targets.
///
/// Serial ids and any other unrecognised columns are dropped. The outcome
/// column may already be 0/1 or an admission probability; either way it is
/// binarised as `value >= label_threshold`.
pub fn build_features(table: &RawTable, label_threshold: f64) -> Result<FeatureSet> {
    let cols = Columns::resolve(table)?;

    let mut features = Vec::with_capacity(table.len());
    let mut targets = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        // Row 1 is the header, so data rows start at 2.
        let row_num = i + 2;
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
        let number = |idx: usize| -> Result<f64> {
            let raw = cell(idx);
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::FeatureEncoding(format!(
                    "row {}, column '{}': '{}' is not a number",
                    row_num, table.headers[idx], raw
                )))
        };
        let categorical_err = |idx: usize, msg: String| {
            Error::FeatureEncoding(format!("row {}, column '{}': {}", row_num, table.headers[idx], msg))
        };

        let applicant = Applicant {
            gre_score: number(cols.gre)?,
            toefl_score: number(cols.toefl)?,
            sop: number(cols.sop)?,
            lor: number(cols.lor)?,
            cgpa: number(cols.cgpa)?,
            university_rating: cell(cols.rating)
                .parse::<UniversityRating>()
                .map_err(|e| categorical_err(cols.rating, e))?,
            research: cell(cols.research)
                .parse::<Research>()
                .map_err(|e| categorical_err(cols.research, e))?,
        };
        let outcome = number(cols.label)?;

        features.push(encode(&applicant));
        targets.push(if outcome >= label_threshold { 1.0 } else { 0.0 });
    }

    let positives = targets.iter().filter(|&&t| t == 1.0).count();
    debug!(rows = features.len(), positives, "features built");

    Ok(FeatureSet { features, targets })
}
