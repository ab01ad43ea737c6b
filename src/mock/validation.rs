//! Request validation from collection rules. Errors are collected per field.

use crate::mock::error::{ApiError, FieldErrors};
use crate::mock::model::{CollectionSpec, FieldKind, FieldSpec, SLUG_PATTERN};
use crate::mock::state::{record_id, Record, Tables};
use regex::Regex;
use serde_json::Value;

/// Where a write lands, for checks that look at neighbouring records.
pub struct WriteTarget<'a> {
    pub site: &'a str,
    pub tables: &'a Tables,
    /// Record being replaced or patched; `None` on create.
    pub id: Option<&'a str>,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create or full replace. All required fields must be present.
    pub fn validate(spec: &CollectionSpec, body: &Record, target: &WriteTarget<'_>) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        for field in spec.fields.iter().filter(|f| !f.read_only) {
            match body.get(field.name) {
                None if field.rule.required => push(&mut errors, field.name, "This field is required."),
                None => {}
                Some(value) => check_field(spec, field, value, target, &mut errors)?,
            }
        }
        check_slug_unique(spec, body, target, &mut errors);
        finish(errors)
    }

    /// Validate only the fields present in body (PATCH).
    pub fn validate_partial(spec: &CollectionSpec, body: &Record, target: &WriteTarget<'_>) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        for (key, value) in body {
            if let Some(field) = spec.field_spec(key) {
                check_field(spec, field, value, target, &mut errors)?;
            }
        }
        check_slug_unique(spec, body, target, &mut errors);
        finish(errors)
    }
}

/// Keep writable fields only, mapping alternative keys (`brand_id`) onto the
/// stored name (`brand`).
pub fn extract_fields(spec: &CollectionSpec, raw: Record) -> Record {
    let mut body = Record::new();
    for field in spec.fields.iter().filter(|f| !f.read_only) {
        for key in field.request_keys() {
            if let Some(value) = raw.get(key) {
                body.insert(field.name.to_string(), value.clone());
            }
        }
    }
    body
}

/// Typed value for one multipart text part.
pub fn coerce_form_value(field: Option<&FieldSpec>, text: String) -> Value {
    let Some(field) = field else {
        return Value::String(text);
    };
    match field.kind {
        FieldKind::Bool => match text.as_str() {
            "true" | "True" | "1" => Value::Bool(true),
            "false" | "False" | "0" => Value::Bool(false),
            _ => Value::String(text),
        },
        FieldKind::Integer => text.parse::<i64>().map(Value::from).unwrap_or(Value::String(text)),
        FieldKind::Json => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        FieldKind::Ref { .. } if text.is_empty() => Value::Null,
        _ => Value::String(text),
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn finish(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn check_field(
    spec: &CollectionSpec,
    field: &FieldSpec,
    value: &Value,
    target: &WriteTarget<'_>,
    errors: &mut FieldErrors,
) -> Result<(), ApiError> {
    let name = field.name;
    if value.is_null() {
        if field.rule.required || !field.is_nullable() {
            push(errors, name, "This field may not be null.");
        }
        return Ok(());
    }
    match &field.kind {
        FieldKind::Text | FieldKind::File => {
            let Some(s) = value.as_str() else {
                push(errors, name, "Not a valid string.");
                return Ok(());
            };
            if field.rule.required && s.trim().is_empty() {
                push(errors, name, "This field may not be blank.");
                return Ok(());
            }
            if let Some(max) = field.rule.max_length {
                if s.chars().count() > max {
                    push(errors, name, format!("Ensure this field has no more than {} characters.", max));
                }
            }
            if let Some(pattern) = field.rule.pattern {
                let re = Regex::new(pattern)
                    .map_err(|_| ApiError::Internal(format!("invalid pattern for {}", name)))?;
                if !s.is_empty() && !re.is_match(s) {
                    push(errors, name, pattern_message(pattern));
                }
            }
            if let Some(allowed) = &field.rule.allowed {
                if !allowed.iter().any(|a| a == value) {
                    push(errors, name, format!("\"{}\" is not a valid choice.", s));
                }
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                push(errors, name, "Must be a valid boolean.");
            }
        }
        FieldKind::Integer => match value.as_i64() {
            Some(n) => check_minimum(field, n as f64, errors),
            None => push(errors, name, "A valid integer is required."),
        },
        FieldKind::Decimal => match decimal(value) {
            Some(n) => check_minimum(field, n, errors),
            None => push(errors, name, "A valid number is required."),
        },
        FieldKind::Json => {}
        FieldKind::Ref { target: segment, .. } => match value.as_str() {
            Some(id) if segment == &spec.segment && Some(id) == target.id => {
                push(errors, name, "A record cannot reference itself.");
            }
            Some(id) if target.tables.find(target.site, segment, id).is_some() => {}
            Some(id) => push(errors, name, missing_pk(id)),
            None => push(errors, name, "Incorrect type. Expected pk value."),
        },
        FieldKind::RefList { target: segment, .. } => {
            let Some(ids) = value.as_array() else {
                push(errors, name, "Expected a list of items.");
                return Ok(());
            };
            for id in ids {
                match id.as_str() {
                    Some(id) if target.tables.find(target.site, segment, id).is_some() => {}
                    Some(id) => push(errors, name, missing_pk(id)),
                    None => push(errors, name, "Incorrect type. Expected pk value."),
                }
            }
        }
    }
    Ok(())
}

fn check_minimum(field: &FieldSpec, n: f64, errors: &mut FieldErrors) {
    if let Some(min) = field.rule.minimum {
        if n < min {
            push(errors, field.name, format!("Ensure this value is greater than or equal to {}.", min));
        }
    }
}

/// A decimal given as a JSON number or a numeric string.
pub fn decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn pattern_message(pattern: &str) -> &'static str {
    if pattern == SLUG_PATTERN {
        "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens."
    } else {
        "Enter a valid value."
    }
}

fn missing_pk(id: &str) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

fn check_slug_unique(spec: &CollectionSpec, body: &Record, target: &WriteTarget<'_>, errors: &mut FieldErrors) {
    if spec.slug_from.is_none() {
        return;
    }
    let Some(slug) = body.get("slug").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return;
    };
    let taken = target
        .tables
        .rows(target.site, spec.segment)
        .iter()
        .any(|r| r.get("slug").and_then(Value::as_str) == Some(slug) && record_id(r) != target.id);
    if taken {
        push(errors, "slug", "A record with this slug already exists.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::model::CatalogModel;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn field_errors(result: Result<(), ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_fields_are_reported_together() {
        let model = CatalogModel::catalog();
        let pages = model.get("pages").unwrap();
        let tables = Tables::default();
        let target = WriteTarget { site: "s1", tables: &tables, id: None };
        let errors = field_errors(RequestValidator::validate(pages, &Record::new(), &target));
        assert_eq!(errors["name"], vec!["This field is required.".to_string()]);
        assert_eq!(errors["content"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn partial_checks_only_present_fields() {
        let model = CatalogModel::catalog();
        let brands = model.get("brands").unwrap();
        let tables = Tables::default();
        let target = WriteTarget { site: "s1", tables: &tables, id: Some("b1") };
        assert!(RequestValidator::validate_partial(brands, &record(json!({"is_published": false})), &target).is_ok());
        let errors = field_errors(RequestValidator::validate_partial(
            brands,
            &record(json!({"slug": "not a slug"})),
            &target,
        ));
        assert!(errors["slug"][0].contains("slug"));
    }

    #[test]
    fn unknown_references_and_bad_choices_fail() {
        let model = CatalogModel::catalog();
        let tables = Tables::default();
        let target = WriteTarget { site: "s1", tables: &tables, id: None };
        let errors = field_errors(RequestValidator::validate(
            model.get("size-charts").unwrap(),
            &record(json!({"name": "Shoes", "product_type": "missing"})),
            &target,
        ));
        assert_eq!(errors["product_type"], vec!["Invalid pk \"missing\" - object does not exist.".to_string()]);

        let errors = field_errors(RequestValidator::validate(
            model.get("pages").unwrap(),
            &record(json!({"name": "A", "content": "B", "page_type": "banner"})),
            &target,
        ));
        assert_eq!(errors["page_type"], vec!["\"banner\" is not a valid choice.".to_string()]);
    }

    #[test]
    fn duplicate_slug_in_site_is_rejected() {
        let model = CatalogModel::catalog();
        let brands = model.get("brands").unwrap();
        let mut tables = Tables::default();
        tables.rows_mut("s1", "brands").push(record(json!({"id": "b1", "slug": "acme"})));
        let target = WriteTarget { site: "s1", tables: &tables, id: None };
        let errors = field_errors(RequestValidator::validate(
            brands,
            &record(json!({"name": "Acme", "slug": "acme"})),
            &target,
        ));
        assert!(errors.contains_key("slug"));

        let same_record = WriteTarget { site: "s1", tables: &tables, id: Some("b1") };
        assert!(RequestValidator::validate_partial(brands, &record(json!({"slug": "acme"})), &same_record).is_ok());
        let other_site = WriteTarget { site: "s2", tables: &tables, id: None };
        assert!(RequestValidator::validate(brands, &record(json!({"name": "Acme", "slug": "acme"})), &other_site).is_ok());
    }

    #[test]
    fn form_values_follow_field_kinds() {
        let model = CatalogModel::catalog();
        let brands = model.get("brands").unwrap();
        assert_eq!(coerce_form_value(brands.field_spec("is_published"), "false".into()), json!(false));
        assert_eq!(coerce_form_value(brands.field_spec("name"), "42".into()), json!("42"));
        let categories = model.get("service-categories").unwrap();
        assert_eq!(coerce_form_value(categories.field_spec("order"), "3".into()), json!(3));
        assert_eq!(coerce_form_value(categories.field_spec("parent"), String::new()), Value::Null);
    }

    #[test]
    fn aliases_map_onto_stored_names() {
        let model = CatalogModel::catalog();
        let services = model.get("services").unwrap();
        let body = extract_fields(
            services,
            record(json!({"name": "Cut", "brand_id": "b1", "category_ids": ["c1"], "bogus": 1, "meta_tags": []})),
        );
        assert_eq!(body.get("brand"), Some(&json!("b1")));
        assert_eq!(body.get("categories"), Some(&json!(["c1"])));
        assert!(!body.contains_key("bogus"));
        assert!(!body.contains_key("brand_id"));
    }
}
