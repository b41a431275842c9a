//! The one place that turns an applicant into model input.
//!
//! Training (`features::builder`) and serving (the studio form) both call
//! [`encode`], so the column order below cannot drift between the two. Any
//! change to the layout must bump [`ENCODING_VERSION`]; saved models record
//! the version they were trained with and refuse to load under another.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bumped whenever [`FEATURE_NAMES`] or the meaning of a column changes.
pub const ENCODING_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 12;

/// Column order of every [`FeatureVector`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gre_score",
    "toefl_score",
    "sop",
    "lor",
    "cgpa",
    "university_rating_1",
    "university_rating_2",
    "university_rating_3",
    "university_rating_4",
    "university_rating_5",
    "research_0",
    "research_1",
];

/// Index of the first university-rating indicator.
pub const RATING_OFFSET: usize = 5;
/// Index of the first research indicator (`research_0`).
pub const RESEARCH_OFFSET: usize = 10;

/// Rating of the applicant's undergraduate university, 1 (lowest) to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniversityRating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl UniversityRating {
    pub const ALL: [UniversityRating; 5] = [
        UniversityRating::One,
        UniversityRating::Two,
        UniversityRating::Three,
        UniversityRating::Four,
        UniversityRating::Five,
    ];

    pub fn from_level(level: u8) -> Option<UniversityRating> {
        match level {
            1 => Some(UniversityRating::One),
            2 => Some(UniversityRating::Two),
            3 => Some(UniversityRating::Three),
            4 => Some(UniversityRating::Four),
            5 => Some(UniversityRating::Five),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            UniversityRating::One => 1,
            UniversityRating::Two => 2,
            UniversityRating::Three => 3,
            UniversityRating::Four => 4,
            UniversityRating::Five => 5,
        }
    }
}

impl FromStr for UniversityRating {
    type Err = String;

    /// Accepts `"3"` as well as `"3.0"`, which is how numeric CSV exports
    /// often spell integer categories.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let level = t
            .parse::<u8>()
            .ok()
            .or_else(|| {
                t.parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && (1.0..=5.0).contains(v))
                    .map(|v| v as u8)
            })
            .ok_or_else(|| format!("'{}' is not a university rating", t))?;
        UniversityRating::from_level(level)
            .ok_or_else(|| format!("university rating {} is outside 1..=5", level))
    }
}

impl fmt::Display for UniversityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Whether the applicant has research experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Research {
    No,
    Yes,
}

impl FromStr for Research {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" | "1.0" => Ok(Research::Yes),
            "no" | "n" | "false" | "0" | "0.0" => Ok(Research::No),
            other => Err(format!("'{}' is not a research flag (expected Yes/No or 1/0)", other)),
        }
    }
}

impl fmt::Display for Research {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Research::No => "No",
            Research::Yes => "Yes",
        })
    }
}

/// One applicant's raw attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub gre_score: f64,
    pub toefl_score: f64,
    pub sop: f64,
    pub lor: f64,
    pub cgpa: f64,
    pub university_rating: UniversityRating,
    pub research: Research,
}

impl Applicant {
    /// Checks the ranges the serving form advertises:
    /// GRE 0–340, TOEFL 0–120, SOP/LOR 0–5, CGPA 0–10.
    pub fn check_ranges(&self) -> Result<(), String> {
        let checks = [
            ("GRE score", self.gre_score, 0.0, 340.0),
            ("TOEFL score", self.toefl_score, 0.0, 120.0),
            ("Statement of purpose strength", self.sop, 0.0, 5.0),
            ("Letter of recommendation strength", self.lor, 0.0, 5.0),
            ("CGPA", self.cgpa, 0.0, 10.0),
        ];
        for (name, value, lo, hi) in checks {
            if !value.is_finite() || value < lo || value > hi {
                return Err(format!("{} must be between {} and {}, got {}", name, lo, hi, value));
            }
        }
        Ok(())
    }
}

/// Model input in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

/// Encodes an applicant: five continuous columns untouched, then a one-hot
/// block for the rating and a one-hot block for research.
pub fn encode(applicant: &Applicant) -> FeatureVector {
    let mut v = [0.0; FEATURE_COUNT];
    v[0] = applicant.gre_score;
    v[1] = applicant.toefl_score;
    v[2] = applicant.sop;
    v[3] = applicant.lor;
    v[4] = applicant.cgpa;
    v[RATING_OFFSET + usize::from(applicant.university_rating.level()) - 1] = 1.0;
    let research_col = match applicant.research {
        Research::No => RESEARCH_OFFSET,
        Research::Yes => RESEARCH_OFFSET + 1,
    };
    v[research_col] = 1.0;
    FeatureVector(v)
}
