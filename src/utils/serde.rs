use serde::Deserialize;

/// A field the registry reports either as a scalar or as an array.
///
/// The nested `full_studies` shape is inconsistent about multi-valued fields
/// such as phases and conditions; this accepts both and flattens to a list.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    #[default]
    Absent,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.clone().into_vec()
    }
}
