use std::io::{Cursor, Read};
use tiny_http::{Request, Response};
use tracing::{error, info, warn};

use admission_nn::features::encoding::{encode, Applicant, Research, UniversityRating};
use admission_nn::{Error, Result};

use crate::render::{html_escape, render_page};
use crate::routes::html_response;
use crate::state::AppContext;
use crate::util::form::{form_get, parse_form};

const ELIGIBLE: &str = "You are eligible for an admission!";
const NOT_ELIGIBLE: &str = "Sorry, you are not eligible for an admission.";
const PREDICTION_FAILED: &str = "An error occurred during prediction. Please check inputs and try again.";

/// Raw form values, kept as typed so they can be echoed back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    pub gre: String,
    pub toefl: String,
    pub sop: String,
    pub lor: String,
    pub cgpa: String,
    pub rating: String,
    pub research: String,
}

impl FormValues {
    pub fn from_pairs(pairs: &[(String, String)]) -> FormValues {
        let get = |key: &str| form_get(pairs, key).unwrap_or("").trim().to_owned();
        FormValues {
            gre: get("gre"),
            toefl: get("toefl"),
            sop: get("sop"),
            lor: get("lor"),
            cgpa: get("cgpa"),
            rating: get("rating"),
            research: get("research"),
        }
    }

    /// Validates every field and builds the applicant.
    pub fn to_applicant(&self) -> Result<Applicant> {
        let applicant = Applicant {
            gre_score: integer("GRE score", &self.gre)?,
            toefl_score: integer("TOEFL score", &self.toefl)?,
            sop: decimal("Statement of purpose strength", &self.sop)?,
            lor: decimal("Letter of recommendation strength", &self.lor)?,
            cgpa: decimal("CGPA", &self.cgpa)?,
            university_rating: required("University rating", &self.rating)?
                .parse::<UniversityRating>()
                .map_err(Error::Prediction)?,
            research: required("Research experience", &self.research)?
                .parse::<Research>()
                .map_err(Error::Prediction)?,
        };
        applicant.check_ranges().map_err(Error::Prediction)?;
        Ok(applicant)
    }
}

fn required<'a>(name: &str, raw: &'a str) -> Result<&'a str> {
    if raw.is_empty() {
        Err(Error::Prediction(format!("{} is required", name)))
    } else {
        Ok(raw)
    }
}

fn integer(name: &str, raw: &str) -> Result<f64> {
    required(name, raw)?
        .parse::<u32>()
        .map(f64::from)
        .map_err(|_| Error::Prediction(format!("{} must be a whole number, got '{}'", name, raw)))
}

fn decimal(name: &str, raw: &str) -> Result<f64> {
    required(name, raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Prediction(format!("{} must be a number, got '{}'", name, raw)))
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_get(_ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    html_response(build_page(&FormValues::default(), ""))
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle_post(request: &mut Request, ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        error!(error = %e, "could not read form body");
        return html_response(build_page(&FormValues::default(), &error_html("The form could not be read. Please try again.")));
    }

    let values = FormValues::from_pairs(&parse_form(&body));
    let result_html = result_section(&values, ctx);
    html_response(build_page(&values, &result_html))
}

/// Verdict card for valid input. Validation problems are shown as-is; model
/// failures only get a generic message and are logged.
pub fn result_section(values: &FormValues, ctx: &AppContext) -> String {
    let applicant = match values.to_applicant() {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "rejected form input");
            return error_html(&e.to_string());
        }
    };
    match score(&applicant, ctx) {
        Ok((label, probability)) => {
            info!(label, probability, "prediction served");
            verdict_html(label, probability, ctx)
        }
        Err(e) => {
            error!(error = %e, "prediction failed");
            error_html(PREDICTION_FAILED)
        }
    }
}

/// Form values → applicant → shared encoding → model.
pub fn predict(values: &FormValues, ctx: &AppContext) -> Result<(u8, f64)> {
    score(&values.to_applicant()?, ctx)
}

fn score(applicant: &Applicant, ctx: &AppContext) -> Result<(u8, f64)> {
    let features = encode(applicant);
    let probability = ctx.model.predict_proba(&features)?;
    let label = ctx.model.predict(&features)?;
    Ok((label, probability))
}

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

fn build_page(values: &FormValues, result_html: &str) -> String {
    render_page(|tmpl| {
        tmpl.replace("{{GRE}}", &html_escape(&values.gre))
            .replace("{{TOEFL}}", &html_escape(&values.toefl))
            .replace("{{SOP}}", &html_escape(&values.sop))
            .replace("{{LOR}}", &html_escape(&values.lor))
            .replace("{{CGPA}}", &html_escape(&values.cgpa))
            .replace("{{RATING_OPTIONS}}", &rating_options(&values.rating))
            .replace("{{RESEARCH_OPTIONS}}", &research_options(&values.research))
            .replace("{{RESULT_SECTION}}", result_html)
    })
}

fn rating_options(selected: &str) -> String {
    let selected = selected.parse::<UniversityRating>().ok();
    UniversityRating::ALL.iter().map(|r| {
        let sel = if Some(*r) == selected { " selected" } else { "" };
        format!("<option value=\"{}\"{}>{}</option>", r, sel, r)
    }).collect::<Vec<_>>().join("")
}

fn research_options(selected: &str) -> String {
    let selected = selected.parse::<Research>().unwrap_or(Research::No);
    [Research::No, Research::Yes].iter().map(|r| {
        let sel = if *r == selected { " selected" } else { "" };
        format!("<option value=\"{}\"{}>{}</option>", r, sel, r)
    }).collect::<Vec<_>>().join("")
}

fn verdict_html(label: u8, probability: f64, ctx: &AppContext) -> String {
    let (class, message) = if label == 1 { ("ok", ELIGIBLE) } else { ("no", NOT_ELIGIBLE) };

    let curve = if ctx.loss_curve_path.is_file() {
        r#"<img class="loss-img" src="/loss_curve.png" alt="Training loss per iteration">"#.to_owned()
    } else {
        warn!(path = %ctx.loss_curve_path.display(), "loss curve image not found");
        r#"<p class="hint">The loss curve image is not available yet. Run the training pipeline to generate it.</p>"#.to_owned()
    };

    format!(
        r#"<div class="card"><h2>Result</h2>
<p class="verdict {class}">{message}</p>
<p class="hint">Predicted probability of eligibility: {pct:.1}%</p>
</div>
<div class="card"><h2>Training loss</h2>
{curve}
</div>"#,
        class = class,
        message = message,
        pct = probability * 100.0,
        curve = curve,
    )
}

fn error_html(message: &str) -> String {
    format!(
        r#"<div class="card"><p class="error">{}</p></div>"#,
        html_escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_nn::config::AppConfig;
    use admission_nn::data::parse_table;
    use admission_nn::features::build_features;
    use admission_nn::model::AdmissionModel;
    use admission_nn::preprocess::scaler::{Scaler, ScalerKind};
    use admission_nn::{ActivationFunction, Network};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::path::PathBuf;

    const FORM: &str = "gre=320&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3&research=Yes";

    fn context(loss_curve_path: PathBuf) -> AppContext {
        let scaler = Scaler {
            kind: ScalerKind::Standard,
            offset: vec![310.0, 105.0, 3.0, 3.0, 8.5, 0.2, 0.2, 0.2, 0.2, 0.2, 0.5, 0.5],
            scale: vec![10.0, 5.0, 1.0, 1.0, 0.5, 0.4, 0.4, 0.4, 0.4, 0.4, 0.5, 0.5],
        };
        context_with(scaler, loss_curve_path)
    }

    fn context_with(scaler: Scaler, loss_curve_path: PathBuf) -> AppContext {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let network = Network::binary_classifier(12, &[3], &ActivationFunction::ReLU, &mut rng);
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::load_from(dir.path()).unwrap();
        config.artifacts.loss_curve_path = loss_curve_path.display().to_string();
        AppContext {
            config,
            model: AdmissionModel::new(network, scaler, vec![0.7, 0.5], true),
            loss_curve_path,
        }
    }

    #[test]
    fn reference_applicant_encodes_as_documented() {
        let values = FormValues::from_pairs(&parse_form(FORM));
        let v = encode(&values.to_applicant().unwrap());
        assert_eq!(
            v.as_slice(),
            &[320.0, 110.0, 4.5, 4.0, 9.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn form_and_training_paths_encode_identically() {
        let csv = "Serial No.,GRE Score,TOEFL Score,University Rating,SOP,LOR ,CGPA,Research,Chance of Admit\n\
                   1,320,110,3,4.5,4,9,1,0.85\n\
                   2,301,99,1,2,2.5,7.4,0,0.41\n";
        let set = build_features(&parse_table(csv, "lockstep").unwrap(), 0.8).unwrap();

        let forms = [
            FORM,
            "gre=301&toefl=99&sop=2&lor=2.5&cgpa=7.4&rating=1&research=No",
        ];
        for (form, from_csv) in forms.iter().zip(&set.features) {
            let values = FormValues::from_pairs(&parse_form(form));
            assert_eq!(&encode(&values.to_applicant().unwrap()), from_csv);
        }
    }

    #[test]
    fn invalid_input_is_a_prediction_error() {
        for form in [
            "gre=320&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3",
            "gre=abc&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3&research=Yes",
            "gre=400&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3&research=Yes",
            "gre=320&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=6&research=Yes",
            "gre=320.5&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3&research=Yes",
        ] {
            let values = FormValues::from_pairs(&parse_form(form));
            assert!(matches!(values.to_applicant(), Err(Error::Prediction(_))), "{}", form);
        }
    }

    #[test]
    fn prediction_is_a_single_binary_label() {
        let ctx = context(PathBuf::from("missing.png"));
        let values = FormValues::from_pairs(&parse_form(FORM));
        let (label, probability) = predict(&values, &ctx).unwrap();
        assert!(label == 0 || label == 1);
        assert!((0.0..=1.0).contains(&probability));
        assert_eq!(label, u8::from(probability >= 0.5));
    }

    #[test]
    fn page_echoes_values_and_shows_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("loss_curve.png");
        std::fs::write(&img, b"png").unwrap();
        let ctx = context(img);

        let values = FormValues::from_pairs(&parse_form(FORM));
        let (label, p) = predict(&values, &ctx).unwrap();
        let page = build_page(&values, &verdict_html(label, p, &ctx));

        assert!(page.contains("value=\"320\""));
        assert!(page.contains("<option value=\"3\" selected>3</option>"));
        assert!(page.contains("<option value=\"Yes\" selected>Yes</option>"));
        assert!(page.contains(ELIGIBLE) || page.contains(NOT_ELIGIBLE));
        assert!(page.contains("src=\"/loss_curve.png\""));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn missing_loss_curve_shows_a_hint() {
        let ctx = context(PathBuf::from("definitely/not/here.png"));
        let html = verdict_html(1, 0.9, &ctx);
        assert!(html.contains(ELIGIBLE));
        assert!(html.contains("not available yet"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn fractional_statement_and_letter_strengths_are_accepted() {
        let form = "gre=320&toefl=110&sop=4.3&lor=3.7&cgpa=9.0&rating=3&research=Yes";
        let applicant = FormValues::from_pairs(&parse_form(form)).to_applicant().unwrap();
        assert_eq!(applicant.sop, 4.3);
        assert_eq!(applicant.lor, 3.7);
    }

    #[test]
    fn sop_and_lor_inputs_step_by_a_tenth() {
        let page = build_page(&FormValues::default(), "");
        for name in ["sop", "lor"] {
            let start = page.find(&format!("name=\"{}\"", name)).unwrap();
            let tag_start = page[..start].rfind('<').unwrap();
            let tag_end = start + page[start..].find('>').unwrap();
            let tag = &page[tag_start..tag_end];
            assert!(tag.contains("step=\"0.1\""), "{}", tag);
        }
    }

    #[test]
    fn bad_request_does_not_poison_the_next_one() {
        let ctx = context(PathBuf::from("missing.png"));

        let bad = FormValues::from_pairs(&parse_form("gre=abc&toefl=110&sop=4.5&lor=4.0&cgpa=9.0&rating=3&research=Yes"));
        let html = result_section(&bad, &ctx);
        assert!(html.contains("GRE score must be a whole number"));
        assert!(!html.contains(ELIGIBLE) && !html.contains(NOT_ELIGIBLE));

        let good = FormValues::from_pairs(&parse_form(FORM));
        let html = result_section(&good, &ctx);
        assert!(html.contains(ELIGIBLE) || html.contains(NOT_ELIGIBLE));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn model_failures_show_a_generic_message() {
        let narrow = Scaler {
            kind: ScalerKind::Standard,
            offset: vec![0.0; 5],
            scale: vec![1.0; 5],
        };
        let ctx = context_with(narrow, PathBuf::from("missing.png"));
        let values = FormValues::from_pairs(&parse_form(FORM));

        let internal = predict(&values, &ctx).unwrap_err().to_string();
        let html = result_section(&values, &ctx);
        assert!(html.contains(PREDICTION_FAILED));
        assert!(!html.contains(&html_escape(&internal)));
    }
}
