use serde::Serialize;

use crate::error::TrialScoutError;

pub(crate) fn to_pretty<T: Serialize>(value: &T) -> Result<String, TrialScoutError> {
    Ok(serde_json::to_string_pretty(value)?)
}
