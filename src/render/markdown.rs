use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::entities::patient::PatientRecord;
use crate::entities::trial::TrialRecord;
use crate::error::TrialScoutError;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

const MATCH_REPORT: &str = r#"# Trial Matches

## Patient
{% if patient.age is defined %}- Age: {{ patient.age }}
{% endif %}{% if patient.sex is defined %}- Sex: {{ patient.sex }}
{% endif %}{% if patient.diagnosis is defined %}- Diagnosis: {{ patient.diagnosis }}
{% endif %}{% if patient.cancer_stage is defined %}- Stage: {{ patient.cancer_stage }}
{% endif %}{% if patient.location is defined %}- Location: {{ patient.location }}
{% endif %}{% if patient.prior_treatments %}- Prior treatments: {{ patient.prior_treatments | join(", ") }}
{% endif %}{% if patient.performance_status is defined %}- Performance status: {{ patient.performance_status }}
{% endif %}
## Trials ({{ trials | length }})
{% for trial in trials %}
### {{ loop.index }}. {{ trial.title }} ({{ trial.nct_id }})
- Score: {{ trial.score }}
- Phase: {% if trial.phase is defined %}{{ trial.phase }}{% else %}Not reported{% endif %}
- Status: {{ trial.status }}
{% if trial.conditions %}- Conditions: {{ trial.conditions | join(", ") }}
{% endif %}{% if trial.locations %}- Locations: {{ trial.locations | join("; ") }}
{% endif %}- {{ trial.brief_description }}
- {{ trial.url }}
{% endfor %}"#;

fn env() -> Result<&'static Environment<'static>, TrialScoutError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_template("match_report", MATCH_REPORT)?;
    let _ = ENV.set(env);
    ENV.get().ok_or_else(|| TrialScoutError::Api {
        api: "render".into(),
        message: "Template environment initialization race".into(),
    })
}

pub(crate) fn match_report(
    patient: &PatientRecord,
    trials: &[TrialRecord],
) -> Result<String, TrialScoutError> {
    let template = env()?.get_template("match_report")?;
    Ok(template.render(context! { patient, trials })?)
}
