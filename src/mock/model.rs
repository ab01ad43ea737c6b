//! Catalog model served by the mock backend: one `CollectionSpec` per REST
//! collection, describing stored fields, how they are validated and how
//! records are rendered.

use serde_json::{json, Value};

pub const SLUG_PATTERN: &str = r"^[-a-zA-Z0-9_]+$";
pub const COLOR_PATTERN: &str = r"^#[0-9a-fA-F]{6}$";

/// Per-field request rules.
#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub allowed: Option<Vec<Value>>,
    pub minimum: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    Bool,
    Integer,
    /// Decimal carried as a string, e.g. `"19.90"`.
    Decimal,
    Json,
    /// Id of a record in `target`. Rendered as an object with the `expand`
    /// fields, or as the bare id when `expand` is empty.
    Ref {
        target: &'static str,
        expand: &'static [&'static str],
    },
    RefList {
        target: &'static str,
        expand: &'static [&'static str],
    },
    /// Uploaded file: stored as a `/media/...` URL with `file_name` and `file_type`.
    File,
}

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Value,
    /// Alternative request key, e.g. `brand_id` for `brand`.
    pub input: Option<&'static str>,
    pub rule: ValidationRule,
    pub read_only: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            default: Value::Null,
            input: None,
            rule: ValidationRule::default(),
            read_only: false,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn flag(name: &'static str, default: bool) -> Self {
        Self::new(name, FieldKind::Bool).default(json!(default))
    }

    pub fn integer(name: &'static str, default: i64) -> Self {
        Self::new(name, FieldKind::Integer).default(json!(default))
    }

    pub fn reference(name: &'static str, target: &'static str, expand: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Ref { target, expand })
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub fn input(mut self, key: &'static str) -> Self {
        self.input = Some(key);
        self
    }

    pub fn required(mut self) -> Self {
        self.rule.required = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.rule.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: &'static str) -> Self {
        self.rule.pattern = Some(pattern);
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.rule.allowed = Some(values.iter().map(|v| json!(v)).collect());
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.rule.minimum = Some(min);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.default.is_null()
    }

    /// Keys accepted for this field in a request body.
    pub fn request_keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.input)
    }
}

/// Where a nested collection hangs.
#[derive(Clone, Debug)]
pub struct ParentSpec {
    pub segment: &'static str,
    /// Stored field holding the parent id.
    pub key: &'static str,
    /// Whether `key` is part of the rendered record.
    pub exposed: bool,
}

/// Fields computed at render time from the rest of the site's data.
#[derive(Clone, Debug)]
pub enum Derived {
    /// Depth of a category in its tree (roots are 0).
    Level,
    HasChildren,
    /// `old_price > price`.
    HasDiscount,
    PageTypeDisplay,
    /// Name of the attribute type owning the referenced value.
    AttributeTypeName,
    /// Child records of a nested collection, rendered with the given fields.
    Children {
        field: &'static str,
        segment: &'static str,
        fields: &'static [&'static str],
        detail_only: bool,
    },
}

#[derive(Clone, Debug)]
pub struct CollectionSpec {
    pub segment: &'static str,
    pub parent: Option<ParentSpec>,
    pub fields: Vec<FieldSpec>,
    pub search_fields: &'static [&'static str],
    /// Default `ordering` when the request has none.
    pub ordering: &'static str,
    /// Field a missing slug is generated from.
    pub slug_from: Option<&'static str>,
    pub derived: Vec<Derived>,
    /// Fields rendered on detail responses only.
    pub detail_only: &'static [&'static str],
    /// Flags that at most one record per parent may carry.
    pub exclusive_flags: &'static [&'static str],
}

impl CollectionSpec {
    fn new(segment: &'static str) -> Self {
        CollectionSpec {
            segment,
            parent: None,
            fields: Vec::new(),
            search_fields: &[],
            ordering: "",
            slug_from: None,
            derived: Vec::new(),
            detail_only: &[],
            exclusive_flags: &[],
        }
    }

    fn nested(mut self, segment: &'static str, key: &'static str, exposed: bool) -> Self {
        self.parent = Some(ParentSpec { segment, key, exposed });
        self
    }

    fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// `slug` generated from `source` when absent, unique per site.
    fn slugged(mut self, source: &'static str) -> Self {
        self.slug_from = Some(source);
        self.field(FieldSpec::text("slug").max_length(255).pattern(SLUG_PATTERN))
    }

    /// `file` upload plus its read-only name, type and blurhash.
    fn with_file(self) -> Self {
        self.field(FieldSpec::new("file", FieldKind::File))
            .field(FieldSpec::text("file_name").read_only())
            .field(FieldSpec::text("file_type").read_only())
            .field(FieldSpec::text("blurhash").read_only())
    }

    fn search(mut self, fields: &'static [&'static str]) -> Self {
        self.search_fields = fields;
        self
    }

    fn ordered_by(mut self, field: &'static str) -> Self {
        self.ordering = field;
        self
    }

    fn derive(mut self, derived: Derived) -> Self {
        self.derived.push(derived);
        self
    }

    fn detail_only(mut self, fields: &'static [&'static str]) -> Self {
        self.detail_only = fields;
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_file(&self) -> bool {
        self.fields.iter().any(|f| f.kind == FieldKind::File)
    }

    /// Stored fields a list may be filtered on, including the parent key.
    pub fn is_filterable(&self, key: &str) -> bool {
        self.field_spec(key).is_some() || self.parent.as_ref().is_some_and(|p| p.key == key) || key == "id"
    }
}

const CATEGORY_REF: &[&str] = &["id", "name", "slug", "is_published", "order"];
const NAMED_REF: &[&str] = &["id", "name"];
const PRODUCT_TYPE_REF: &[&str] = &["id", "name", "description"];
const SIZE_REF: &[&str] = &["id", "value", "measurement_system", "base_value"];
const VALUE_REF: &[&str] = &["id", "value", "slug", "color_code", "order"];

/// All collections, addressable by their (unique) segment.
#[derive(Clone, Debug)]
pub struct CatalogModel {
    collections: Vec<CollectionSpec>,
}

impl CatalogModel {
    pub fn new(collections: Vec<CollectionSpec>) -> Self {
        CatalogModel { collections }
    }

    pub fn collections(&self) -> &[CollectionSpec] {
        &self.collections
    }

    pub fn get(&self, segment: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.segment == segment)
    }

    /// A collection addressed directly under the site.
    pub fn top_level(&self, segment: &str) -> Option<&CollectionSpec> {
        self.get(segment).filter(|c| c.parent.is_none())
    }

    /// A collection addressed as `{parent}/{id}/{segment}`.
    pub fn nested(&self, parent: &str, segment: &str) -> Option<&CollectionSpec> {
        self.get(segment)
            .filter(|c| c.parent.as_ref().is_some_and(|p| p.segment == parent))
    }

    pub fn children_of<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a CollectionSpec> + 'a {
        self.collections
            .iter()
            .filter(move |c| c.parent.as_ref().is_some_and(|p| p.segment == segment))
    }

    /// The catalog administration API.
    pub fn catalog() -> Self {
        let brands = CollectionSpec::new("brands")
            .field(FieldSpec::text("name").required().max_length(255))
            .slugged("name")
            .field(FieldSpec::text("description").default(json!("")))
            .field(FieldSpec::flag("is_published", true))
            .with_file()
            .search(&["name", "slug", "description"])
            .ordered_by("name")
            .detail_only(&["description", "file_name", "file_type", "blurhash"]);

        let product_types = CollectionSpec::new("product-types")
            .field(FieldSpec::text("name").required().max_length(255))
            .field(FieldSpec::text("description").default(json!("")))
            .search(&["name", "description"])
            .ordered_by("name");

        let measurement_systems = CollectionSpec::new("measurement-systems")
            .field(FieldSpec::text("name").required().max_length(100))
            .field(FieldSpec::flag("is_base_system", false))
            .search(&["name"])
            .ordered_by("name");

        let size_charts = CollectionSpec::new("size-charts")
            .field(FieldSpec::text("name").required().max_length(255))
            .field(FieldSpec::text("description").default(json!("")))
            .field(
                FieldSpec::reference("product_type", "product-types", PRODUCT_TYPE_REF)
                    .input("product_type_id")
                    .required(),
            )
            .search(&["name", "description"])
            .ordered_by("name");

        let sizes = CollectionSpec::new("sizes")
            .nested("size-charts", "size_chart", false)
            .field(FieldSpec::text("value").required().max_length(50))
            .field(FieldSpec::reference("measurement_system", "measurement-systems", &[]).required())
            .field(FieldSpec::text("base_value").default(json!("")))
            .search(&["value", "base_value"])
            .ordered_by("value");

        let service_categories = CollectionSpec::new("service-categories")
            .field(FieldSpec::text("name").required().max_length(255))
            .slugged("name")
            .field(FieldSpec::text("brief").default(json!("")))
            .field(FieldSpec::flag("is_published", true))
            .field(FieldSpec::reference("parent", "service-categories", CATEGORY_REF))
            .field(FieldSpec::integer("order", 0).minimum(0.0))
            .with_file()
            .derive(Derived::Level)
            .derive(Derived::HasChildren)
            .search(&["name", "brief", "slug"])
            .ordered_by("order")
            .detail_only(&["file_name", "file_type"]);

        let attribute_types = CollectionSpec::new("attribute-types")
            .field(FieldSpec::text("name").required().max_length(100))
            .slugged("name")
            .field(FieldSpec::integer("max_values_per_product", 1).minimum(1.0))
            .field(FieldSpec::flag("is_required", false))
            .field(FieldSpec::integer("order", 0).minimum(0.0))
            .field(FieldSpec::flag("show_in_filters", true))
            .derive(Derived::Children {
                field: "values",
                segment: "values",
                fields: VALUE_REF,
                detail_only: false,
            })
            .search(&["name", "slug"])
            .ordered_by("order");

        let attribute_values = CollectionSpec::new("values")
            .nested("attribute-types", "attribute_type", true)
            .field(FieldSpec::text("value").required().max_length(100))
            .slugged("value")
            .field(FieldSpec::text("color_code").pattern(COLOR_PATTERN))
            .field(FieldSpec::integer("order", 0).minimum(0.0))
            .search(&["value", "slug"])
            .ordered_by("order");

        let service_attributes = CollectionSpec::new("attributes")
            .nested("services", "service", false)
            .field(FieldSpec::reference("attribute_value", "values", VALUE_REF).required())
            .derive(Derived::AttributeTypeName);

        let services = CollectionSpec::new("services")
            .field(FieldSpec::text("name").required().max_length(255))
            .slugged("name")
            .field(FieldSpec::flag("is_published", true))
            .field(FieldSpec::new("price", FieldKind::Decimal).minimum(0.0))
            .field(FieldSpec::new("old_price", FieldKind::Decimal).minimum(0.0))
            .field(
                FieldSpec::new(
                    "categories",
                    FieldKind::RefList {
                        target: "service-categories",
                        expand: NAMED_REF,
                    },
                )
                .input("category_ids")
                .default(json!([])),
            )
            .field(FieldSpec::reference("brand", "brands", NAMED_REF).input("brand_id"))
            .field(FieldSpec::reference("product_type", "product-types", PRODUCT_TYPE_REF).input("product_type_id"))
            .field(FieldSpec::text("title").max_length(255))
            .field(FieldSpec::text("description"))
            .field(FieldSpec::text("keywords"))
            .field(FieldSpec::text("content").required())
            .field(FieldSpec::text("sku").max_length(100))
            .field(FieldSpec::text("video_url"))
            .field(FieldSpec::integer("order", 0))
            .field(FieldSpec::new("attributes", FieldKind::Json).default(json!({})))
            .derive(Derived::HasDiscount)
            .derive(Derived::Children {
                field: "attachments",
                segment: "attachments",
                fields: &["id", "file", "is_primary"],
                detail_only: false,
            })
            .derive(Derived::Children {
                field: "service_attributes",
                segment: "attributes",
                fields: &["id", "attribute_value", "attribute_type_name"],
                detail_only: true,
            })
            .search(&["name", "slug", "sku"])
            .ordered_by("name")
            .detail_only(&[
                "title",
                "description",
                "keywords",
                "content",
                "sku",
                "video_url",
                "order",
                "attributes",
                "product_type",
            ]);

        let mut attachments = CollectionSpec::new("attachments")
            .nested("services", "service", false)
            .field(FieldSpec::new("file", FieldKind::File).required())
            .field(FieldSpec::text("file_name").read_only())
            .field(FieldSpec::text("file_type").read_only())
            .field(FieldSpec::text("blurhash").read_only())
            .field(FieldSpec::text("alt_text").max_length(255))
            .field(FieldSpec::flag("is_primary", false))
            .field(FieldSpec::integer("order", 0).minimum(0.0))
            .ordered_by("order");
        attachments.exclusive_flags = &["is_primary"];

        let variants = CollectionSpec::new("variants")
            .nested("services", "service", false)
            .field(FieldSpec::reference("size", "sizes", SIZE_REF).required())
            .field(FieldSpec::text("sku").required().max_length(100))
            .field(FieldSpec::new("price", FieldKind::Decimal).required().minimum(0.0))
            .field(FieldSpec::flag("is_active", true))
            .field(FieldSpec::new("attributes", FieldKind::Json).default(json!({})))
            .search(&["sku"])
            .ordered_by("sku");

        let pages = CollectionSpec::new("pages")
            .field(FieldSpec::text("name").required().max_length(255))
            .slugged("name")
            .field(FieldSpec::text("title").max_length(255))
            .field(FieldSpec::text("description"))
            .field(FieldSpec::text("keywords"))
            .field(FieldSpec::text("content").required())
            .field(FieldSpec::flag("is_published", true))
            .field(FieldSpec::text("page_type").default(json!("page")).allowed(&["page", "promo"]))
            .field(FieldSpec::new("meta_tags", FieldKind::Json).default(json!([])).read_only())
            .with_file()
            .derive(Derived::PageTypeDisplay)
            .search(&["name", "title", "slug"])
            .ordered_by("name");

        CatalogModel::new(vec![
            brands,
            product_types,
            measurement_systems,
            size_charts,
            sizes,
            service_categories,
            attribute_types,
            attribute_values,
            service_attributes,
            services,
            attachments,
            variants,
            pages,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_unique() {
        let model = CatalogModel::catalog();
        let mut segments: Vec<_> = model.collections().iter().map(|c| c.segment).collect();
        let total = segments.len();
        segments.sort_unstable();
        segments.dedup();
        assert_eq!(segments.len(), total);
    }

    #[test]
    fn nested_collections_resolve_only_under_their_parent() {
        let model = CatalogModel::catalog();
        assert!(model.nested("size-charts", "sizes").is_some());
        assert!(model.nested("services", "sizes").is_none());
        assert!(model.top_level("sizes").is_none());
        assert!(model.top_level("brands").is_some());
        let children: Vec<_> = model.children_of("services").map(|c| c.segment).collect();
        assert_eq!(children, vec!["attributes", "attachments", "variants"]);
    }
}
