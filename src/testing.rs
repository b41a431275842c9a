//! Deterministic applicant data for unit tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::features::encoding::{encode, Applicant, Research, UniversityRating};
use crate::features::FeatureSet;

/// `n` applicants whose admission is driven by a noisy linear score, roughly
/// half of them admitted.
pub(crate) fn synthetic_features(n: usize) -> FeatureSet {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut features = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);

    for _ in 0..n {
        let merit: f64 = rng.gen_range(0.0..1.0);
        let jitter = |rng: &mut ChaCha8Rng, span: f64| rng.gen_range(-span..span);

        let applicant = Applicant {
            gre_score: (295.0 + 40.0 * merit + jitter(&mut rng, 6.0)).round(),
            toefl_score: (95.0 + 22.0 * merit + jitter(&mut rng, 3.0)).round(),
            sop: (1.5 + 3.0 * merit + jitter(&mut rng, 0.5)).clamp(1.0, 5.0),
            lor: (1.5 + 3.0 * merit + jitter(&mut rng, 0.5)).clamp(1.0, 5.0),
            cgpa: (7.0 + 2.8 * merit + jitter(&mut rng, 0.2)).clamp(6.8, 9.92),
            university_rating: UniversityRating::from_level((1.0 + 4.0 * merit).round() as u8)
                .unwrap_or(UniversityRating::Three),
            research: if rng.gen_bool(0.3 + 0.5 * merit) { Research::Yes } else { Research::No },
        };

        features.push(encode(&applicant));
        targets.push(if merit + jitter(&mut rng, 0.05) >= 0.5 { 1.0 } else { 0.0 });
    }

    FeatureSet { features, targets }
}
