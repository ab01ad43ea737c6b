//! Stored record to response body: references expanded, derived fields
//! computed, list projections trimmed.

use crate::mock::model::{CatalogModel, CollectionSpec, Derived, FieldKind};
use crate::mock::query::order_rows;
use crate::mock::state::{record_id, Record, Tables};
use crate::mock::validation::decimal;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// Fields only detail responses carry on every collection.
const DETAIL_AUDIT: &[&str] = &["creator", "site"];

pub struct Renderer<'a> {
    pub model: &'a CatalogModel,
    pub tables: &'a Tables,
    pub site: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(model: &'a CatalogModel, tables: &'a Tables, site: &'a str) -> Self {
        Renderer { model, tables, site }
    }

    pub fn render(&self, spec: &CollectionSpec, record: &Record, view: View) -> Value {
        let hidden_parent = spec.parent.as_ref().filter(|p| !p.exposed).map(|p| p.key);
        let mut out = Map::new();
        for (key, value) in record {
            if Some(key.as_str()) == hidden_parent {
                continue;
            }
            if view == View::List && (DETAIL_AUDIT.contains(&key.as_str()) || spec.detail_only.contains(&key.as_str())) {
                continue;
            }
            let rendered = match spec.field_spec(key).map(|f| &f.kind) {
                Some(FieldKind::Ref { target, expand }) => self.expand(target, expand, value),
                Some(FieldKind::RefList { target, expand }) => Value::Array(
                    value
                        .as_array()
                        .map(Vec::as_slice)
                        .unwrap_or_default()
                        .iter()
                        .map(|id| self.expand(target, expand, id))
                        .filter(|v| !v.is_null())
                        .collect(),
                ),
                _ => value.clone(),
            };
            out.insert(key.clone(), rendered);
        }
        for derived in &spec.derived {
            if let Some((field, value)) = self.derive(spec, record, derived, view) {
                out.insert(field.to_string(), value);
            }
        }
        Value::Object(out)
    }

    fn expand(&self, target: &str, expand: &[&str], id: &Value) -> Value {
        let Some(id) = id.as_str() else {
            return Value::Null;
        };
        let Some(found) = self.tables.find(self.site, target, id) else {
            return Value::Null;
        };
        if expand.is_empty() {
            return Value::String(id.to_string());
        }
        let picked = expand
            .iter()
            .map(|f| (f.to_string(), found.get(*f).cloned().unwrap_or(Value::Null)))
            .collect();
        Value::Object(picked)
    }

    fn derive(&self, spec: &CollectionSpec, record: &Record, derived: &Derived, view: View) -> Option<(&'static str, Value)> {
        let id = record_id(record).unwrap_or_default();
        match derived {
            Derived::Level => Some(("level", Value::from(self.depth(spec, record)))),
            Derived::HasChildren => {
                let has = self
                    .tables
                    .rows(self.site, spec.segment)
                    .iter()
                    .any(|r| r.get("parent").and_then(Value::as_str) == Some(id));
                Some(("has_children", Value::Bool(has)))
            }
            Derived::HasDiscount => {
                let price = record.get("price").and_then(decimal);
                let old = record.get("old_price").and_then(decimal);
                let has = matches!((price, old), (Some(p), Some(o)) if o > p);
                Some(("has_discount", Value::Bool(has)))
            }
            Derived::PageTypeDisplay => {
                let display = match record.get("page_type").and_then(Value::as_str) {
                    Some("promo") => "Promo",
                    _ => "Page",
                };
                Some(("page_type_display", Value::String(display.to_string())))
            }
            Derived::AttributeTypeName => {
                let name = record
                    .get("attribute_value")
                    .and_then(Value::as_str)
                    .and_then(|value_id| self.tables.find(self.site, "values", value_id))
                    .and_then(|value| value.get("attribute_type").and_then(Value::as_str))
                    .and_then(|type_id| self.tables.find(self.site, "attribute-types", type_id))
                    .and_then(|t| t.get("name").cloned())
                    .unwrap_or(Value::String(String::new()));
                Some(("attribute_type_name", name))
            }
            Derived::Children {
                field,
                segment,
                fields,
                detail_only,
            } => {
                if *detail_only && view == View::List {
                    return None;
                }
                let child_spec = self.model.get(segment)?;
                let key = child_spec.parent.as_ref()?.key;
                let mut rows: Vec<&Record> = self
                    .tables
                    .rows(self.site, segment)
                    .iter()
                    .filter(|r| r.get(key).and_then(Value::as_str) == Some(id))
                    .collect();
                order_rows(&mut rows, child_spec.ordering);
                let children = rows
                    .into_iter()
                    .map(|row| pick(self.render(child_spec, row, View::List), fields))
                    .collect();
                Some((*field, Value::Array(children)))
            }
        }
    }

    /// Steps from a category up to its root. Broken or cyclic chains stop early.
    fn depth(&self, spec: &CollectionSpec, record: &Record) -> u64 {
        let rows = self.tables.rows(self.site, spec.segment);
        let mut depth = 0;
        let mut current = record.get("parent").and_then(Value::as_str);
        while let Some(parent_id) = current {
            if depth as usize >= rows.len() {
                break;
            }
            let Some(parent) = rows.iter().find(|r| record_id(r) == Some(parent_id)) else {
                break;
            };
            depth += 1;
            current = parent.get("parent").and_then(Value::as_str);
        }
        depth
    }
}

fn pick(value: Value, fields: &[&str]) -> Value {
    match value {
        Value::Object(map) if !fields.is_empty() => Value::Object(
            map.into_iter()
                .filter(|(k, _)| fields.contains(&k.as_str()))
                .collect(),
        ),
        other => other,
    }
}
