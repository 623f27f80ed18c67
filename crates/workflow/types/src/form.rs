//! Citizen input forms: the schema surfaced to the citizen-facing UI
//!
//! Each citizen-input Action step carries an [`InputForm`]. The host
//! renders it faithfully and must enforce its validation rules before
//! allowing the instance to resume; [`InputForm::validate_submission`]
//! is the reference implementation of that enforcement, returning every
//! issue found rather than stopping at the first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Context;

// ── Form ─────────────────────────────────────────────────────────────

/// A form presented to the citizen at a suspension point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputForm {
    /// Form title shown to the citizen
    pub title: String,
    /// Introductory description
    pub description: String,
    /// The fields, in display order
    pub fields: Vec<FormField>,
}

impl InputForm {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// The ids of all required fields
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.id.as_str())
            .collect()
    }

    /// Check a citizen submission against this form.
    ///
    /// Returns every issue found: missing required fields, values that
    /// fail their field's validation rules, and select values outside
    /// the declared options. An empty result means the submission may
    /// resume the instance.
    pub fn validate_submission(&self, data: &Context) -> Vec<String> {
        let mut issues = Vec::new();

        for field in &self.fields {
            match data.get(&field.id) {
                None | Some(Value::Null) => {
                    if field.required {
                        issues.push(format!("'{}' is required", field.id));
                    }
                }
                Some(value) => field.check_value(value, &mut issues),
            }
        }

        issues
    }
}

// ── Fields ───────────────────────────────────────────────────────────

/// A single field in a citizen form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Field id — the `data` key the submitted value lands under
    pub id: String,
    /// Label shown next to the field
    pub label: String,
    /// Rendering type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the citizen must supply a value
    pub required: bool,
    /// Placeholder text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Validation rules enforced before resume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    /// Choices for select fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Help text shown under the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FormField {
    fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: true,
            placeholder: None,
            validation: None,
            options: Vec::new(),
            help_text: None,
        }
    }

    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Text)
    }

    pub fn email(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Email)
    }

    pub fn phone(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Phone)
    }

    pub fn file(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::File)
    }

    pub fn select<I, S>(id: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::new(id, label, FieldType::Select);
        field.options = options.into_iter().map(Into::into).collect();
        field
    }

    pub fn number(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Number)
    }

    pub fn date(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Date)
    }

    pub fn textarea(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldType::Textarea)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    /// Check one submitted value, appending any issues found
    fn check_value(&self, value: &Value, issues: &mut Vec<String>) {
        if self.field_type == FieldType::Select && !self.options.is_empty() {
            let chosen: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for choice in chosen {
                match choice.as_str() {
                    Some(s) if self.options.iter().any(|o| o == s) => {}
                    Some(s) => issues.push(format!("'{}': '{}' is not an available option", self.id, s)),
                    None => issues.push(format!("'{}': expected a selection", self.id)),
                }
            }
        }

        if let Some(validation) = &self.validation {
            validation.check(&self.id, value, issues);
        }
    }
}

/// The rendering type of a form field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    File,
    Select,
    Number,
    Date,
    Textarea,
}

// ── Validation rules ─────────────────────────────────────────────────

/// Validation rules attached to a form field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    /// Regular expression the text value must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum text length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum text length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Check one value against these rules, appending any issues found
    pub fn check(&self, field_id: &str, value: &Value, issues: &mut Vec<String>) {
        if let Some(pattern) = &self.pattern {
            match value.as_str() {
                Some(text) => match Regex::new(pattern) {
                    Ok(re) => {
                        if !re.is_match(text) {
                            issues.push(format!("'{}' does not match the expected format", field_id));
                        }
                    }
                    Err(_) => issues.push(format!("'{}': invalid validation pattern", field_id)),
                },
                None => issues.push(format!("'{}': expected text", field_id)),
            }
        }

        if self.min.is_some() || self.max.is_some() {
            match value.as_f64() {
                Some(n) => {
                    if let Some(min) = self.min {
                        if n < min {
                            issues.push(format!("'{}' must be at least {}", field_id, min));
                        }
                    }
                    if let Some(max) = self.max {
                        if n > max {
                            issues.push(format!("'{}' must be at most {}", field_id, max));
                        }
                    }
                }
                None => issues.push(format!("'{}': expected a number", field_id)),
            }
        }

        if self.min_length.is_some() || self.max_length.is_some() {
            if let Some(text) = value.as_str() {
                let len = text.chars().count();
                if let Some(min) = self.min_length {
                    if len < min {
                        issues.push(format!("'{}' must be at least {} characters", field_id, min));
                    }
                }
                if let Some(max) = self.max_length {
                    if len > max {
                        issues.push(format!("'{}' must be at most {} characters", field_id, max));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn license_form() -> InputForm {
        InputForm::new("Permit Application", "Provide your details")
            .with_field(
                FormField::text("fisher_name", "Full Name")
                    .with_validation(FieldValidation::new().with_length(2, 100)),
            )
            .with_field(
                FormField::text("commercial_license", "License Number")
                    .with_placeholder("CF123456789")
                    .with_validation(
                        FieldValidation::new()
                            .with_pattern("^CF[0-9]{8,12}$")
                            .with_length(10, 14),
                    )
                    .with_help_text("Starts with CF"),
            )
            .with_field(
                FormField::select("permit_type", "Permit Type", ["general", "sustainable"])
                    .optional(),
            )
    }

    #[test]
    fn test_valid_submission() {
        let form = license_form();
        let mut data = Context::new();
        data.insert("fisher_name".into(), json!("Maria Santos"));
        data.insert("commercial_license".into(), json!("CF12345678"));

        assert!(form.validate_submission(&data).is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let form = license_form();
        let issues = form.validate_submission(&Context::new());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("fisher_name"));
    }

    #[test]
    fn test_pattern_mismatch() {
        let form = license_form();
        let mut data = Context::new();
        data.insert("fisher_name".into(), json!("Maria Santos"));
        data.insert("commercial_license".into(), json!("XX000"));

        let issues = form.validate_submission(&data);
        // fails the pattern and the length bound
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_select_options_enforced() {
        let form = license_form();
        let mut data = Context::new();
        data.insert("fisher_name".into(), json!("Maria Santos"));
        data.insert("commercial_license".into(), json!("CF12345678"));
        data.insert("permit_type".into(), json!("platinum"));

        let issues = form.validate_submission(&data);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("not an available option"));
    }

    #[test]
    fn test_multi_select_values() {
        let form = InputForm::new("Safety", "").with_field(FormField::select(
            "safety_equipment",
            "Equipment",
            ["life_jackets", "flares"],
        ));

        let mut data = Context::new();
        data.insert("safety_equipment".into(), json!(["life_jackets", "flares"]));
        assert!(form.validate_submission(&data).is_empty());

        data.insert("safety_equipment".into(), json!(["life_jackets", "anchor"]));
        assert_eq!(form.validate_submission(&data).len(), 1);
    }

    #[test]
    fn test_numeric_range() {
        let form = InputForm::new("Vessel", "").with_field(
            FormField::number("vessel_length", "Length (m)")
                .with_validation(FieldValidation::new().with_range(3.0, 200.0)),
        );

        let mut data = Context::new();
        data.insert("vessel_length".into(), json!(2));
        assert_eq!(form.validate_submission(&data).len(), 1);

        data.insert("vessel_length".into(), json!(24));
        assert!(form.validate_submission(&data).is_empty());
    }

    #[test]
    fn test_serialized_shape_is_camel_case() {
        let field = FormField::text("tax_id", "Tax ID")
            .with_validation(FieldValidation::new().with_length(9, 12))
            .with_help_text("Your 9-12 digit tax identification number");
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value["type"], json!("text"));
        assert_eq!(value["helpText"], json!("Your 9-12 digit tax identification number"));
        assert_eq!(value["validation"]["minLength"], json!(9));
        assert_eq!(value["validation"]["maxLength"], json!(12));
        assert!(value.get("placeholder").is_none());
    }
}
