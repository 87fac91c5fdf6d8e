use anyhow::Context;
use handlebars::Handlebars;
use serde::Serialize;
use server_api::Notice;
use shared::{
    domain::{FieldSpec, WidgetKind, SECTIONS},
    form::{FieldValue, FormState},
};

const FORM_TEMPLATE: &str = include_str!("../templates/form.hbs");

#[derive(Debug, Serialize)]
struct OptionView {
    name: &'static str,
    value: &'static str,
    checked: bool,
}

#[derive(Debug, Serialize)]
struct FieldView {
    key: &'static str,
    label: &'static str,
    subheading: Option<&'static str>,
    value: String,
    height: Option<u16>,
    is_text_input: bool,
    is_text_area: bool,
    is_radio: bool,
    is_multiselect: bool,
    options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
struct SectionView {
    title: &'static str,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct NoticeView<'a> {
    success: bool,
    message: &'a str,
    detail: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    form_id: String,
    notice: Option<NoticeView<'a>>,
    submissions: u32,
    sections: Vec<SectionView>,
}

/// Renders the questionnaire page.
pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("form", FORM_TEMPLATE)
            .context("invalid form template")?;
        Ok(Self { registry })
    }

    pub fn render(
        &self,
        form: &FormState,
        notice: Option<&Notice>,
        submissions: u32,
    ) -> anyhow::Result<String> {
        let page = PageView {
            // A new id after each reset makes the browser drop what it cached
            // for the previous form.
            form_id: format!("form_projeto_{}", form.version()),
            notice: notice.map(|notice| match notice {
                Notice::Success { message } => NoticeView {
                    success: true,
                    message,
                    detail: None,
                },
                Notice::Failure { message, detail } => NoticeView {
                    success: false,
                    message,
                    detail: Some(detail),
                },
            }),
            submissions,
            sections: SECTIONS
                .iter()
                .map(|section| SectionView {
                    title: section.title,
                    fields: section
                        .fields
                        .iter()
                        .map(|field| field_view(form, field))
                        .collect(),
                })
                .collect(),
        };

        self.registry
            .render("form", &page)
            .context("failed to render form page")
    }
}

fn field_view(form: &FormState, field: &'static FieldSpec) -> FieldView {
    let value = form
        .value(field.key)
        .unwrap_or_else(|| FieldValue::Text(String::new()));
    let options = field
        .kind
        .options()
        .iter()
        .map(|&option| OptionView {
            name: field.key,
            value: option,
            checked: match &value {
                FieldValue::Text(text) => text == option,
                FieldValue::Choices(choices) => choices.iter().any(|choice| choice == option),
            },
        })
        .collect();

    FieldView {
        key: field.key,
        label: field.label,
        subheading: field.subheading,
        value: value.as_text().unwrap_or_default().to_string(),
        height: match field.kind {
            WidgetKind::TextArea { height } => Some(height),
            _ => None,
        },
        is_text_input: matches!(field.kind, WidgetKind::TextInput),
        is_text_area: matches!(field.kind, WidgetKind::TextArea { .. }),
        is_radio: matches!(field.kind, WidgetKind::Radio { .. }),
        is_multiselect: field.kind.is_multi(),
        options,
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
