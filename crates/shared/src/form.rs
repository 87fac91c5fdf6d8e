use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{field_by_column, field_by_key, fields, FieldSpec, WidgetKind},
    error::{ApiException, ErrorCode},
};

/// A single answer. Only the multi-select field carries `Choices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Choices(Vec<String>),
}

impl FieldValue {
    /// Text as stored in a sheet cell; choices are joined with `", "`.
    pub fn to_cell(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Choices(choices) => choices.join(", "),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Choices(_) => None,
        }
    }

    pub fn choices(&self) -> &[String] {
        match self {
            Self::Choices(choices) => choices,
            Self::Text(_) => &[],
        }
    }

    fn default_for(field: &FieldSpec) -> Self {
        match field.kind {
            WidgetKind::MultiSelect { .. } => Self::Choices(Vec::new()),
            WidgetKind::Radio { options } => {
                Self::Text(options.first().copied().unwrap_or_default().to_string())
            }
            WidgetKind::TextInput | WidgetKind::TextArea { .. } => {
                Self::Text(field.default.unwrap_or_default().to_string())
            }
        }
    }
}

/// Values of the questionnaire widgets for one user.
///
/// Unset fields read as their widget default. `reset` drops every value and
/// bumps `version`, which the renderer embeds in the form id so the browser
/// rebuilds the widgets from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: HashMap<&'static str, FieldValue>,
    version: u64,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_pristine(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<FieldValue> {
        let field = field_by_key(key)?;
        Some(
            self.values
                .get(field.key)
                .cloned()
                .unwrap_or_else(|| FieldValue::default_for(field)),
        )
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) -> Result<(), ApiException> {
        let field = known_field(key)?;
        if field.kind.is_multi() {
            return Err(ApiException::new(
                ErrorCode::Validation,
                format!("field `{key}` takes a list of choices"),
            ));
        }
        let value = value.into();
        if let WidgetKind::Radio { options } = field.kind {
            if !options.contains(&value.as_str()) {
                return Err(ApiException::new(
                    ErrorCode::Validation,
                    format!("`{value}` is not an option of `{key}`"),
                ));
            }
        }
        self.values.insert(field.key, FieldValue::Text(value));
        Ok(())
    }

    pub fn set_choices<I, S>(&mut self, key: &str, choices: I) -> Result<(), ApiException>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = known_field(key)?;
        let WidgetKind::MultiSelect { options } = field.kind else {
            return Err(ApiException::new(
                ErrorCode::Validation,
                format!("field `{key}` takes a single value"),
            ));
        };
        let mut selected = Vec::new();
        for choice in choices {
            let choice = choice.into();
            if !options.contains(&choice.as_str()) {
                return Err(ApiException::new(
                    ErrorCode::Validation,
                    format!("`{choice}` is not an option of `{key}`"),
                ));
            }
            if !selected.contains(&choice) {
                selected.push(choice);
            }
        }
        self.values.insert(field.key, FieldValue::Choices(selected));
        Ok(())
    }

    /// Replaces every field with the values of a posted HTML form.
    ///
    /// A browser omits a multi-select with nothing selected, so every field is
    /// written, not only those present in `pairs`. Unknown keys and options
    /// outside a widget's option list are ignored.
    pub fn apply_pairs<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut posted: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            if let Some(field) = field_by_key(key.as_ref()) {
                posted.entry(field.key).or_default().push(value.into());
            }
        }

        for field in fields() {
            let submitted = posted.remove(field.key).unwrap_or_default();
            let value = match field.kind {
                WidgetKind::MultiSelect { options } => {
                    let mut selected: Vec<String> = Vec::new();
                    for choice in submitted {
                        if options.contains(&choice.as_str()) && !selected.contains(&choice) {
                            selected.push(choice);
                        }
                    }
                    FieldValue::Choices(selected)
                }
                WidgetKind::Radio { options } => submitted
                    .into_iter()
                    .find(|choice| options.contains(&choice.as_str()))
                    .map(FieldValue::Text)
                    .unwrap_or_else(|| FieldValue::default_for(field)),
                WidgetKind::TextInput | WidgetKind::TextArea { .. } => {
                    FieldValue::Text(submitted.into_iter().next().unwrap_or_default())
                }
            };
            self.values.insert(field.key, value);
        }
    }

    /// Builds a form from an object keyed by sheet column.
    pub fn from_columns<I>(columns: I) -> Result<Self, ApiException>
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        let mut form = Self::new();
        for (column, value) in columns {
            let field = field_by_column(&column).ok_or_else(|| {
                ApiException::new(ErrorCode::Validation, format!("unknown column `{column}`"))
            })?;
            match value {
                FieldValue::Text(text) => form.set_text(field.key, text)?,
                FieldValue::Choices(choices) => form.set_choices(field.key, choices)?,
            }
        }
        Ok(form)
    }

    /// Forgets every form value and invalidates the rendered widgets.
    pub fn reset(&mut self) {
        self.values.clear();
        self.version += 1;
    }
}

fn known_field(key: &str) -> Result<&'static FieldSpec, ApiException> {
    field_by_key(key)
        .ok_or_else(|| ApiException::new(ErrorCode::Validation, format!("unknown field `{key}`")))
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
