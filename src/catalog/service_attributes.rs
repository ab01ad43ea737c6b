//! Attribute types, their values, and the values attached to one service.

use crate::catalog::common::Audit;
use crate::error::ClientError;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct AttributeTypes;

impl Resource for AttributeTypes {
    const SEGMENT: &'static str = "attribute-types";
    const SINGULAR: &'static str = "Attribute type";
    const PLURAL: &'static str = "attribute types";
    type List = AttributeType;
    type Detail = AttributeTypeDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("order")
    }
}

pub type AttributeTypeStore = ResourceStore<AttributeTypes>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub max_values_per_product: u32,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub show_in_filters: bool,
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

identified!(AttributeType, title = name);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeTypeDetail {
    #[serde(flatten)]
    pub base: AttributeType,
    pub site: String,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(AttributeTypeDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct AttributeTypePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_values_per_product: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_in_filters: Option<bool>,
}

impl AttributeTypePayload {
    pub fn new(name: impl Into<String>) -> Self {
        AttributeTypePayload {
            name: Some(name.into()),
            ..AttributeTypePayload::default()
        }
    }
}

impl Payload for AttributeTypePayload {}

impl ResourceStore<AttributeTypes> {
    pub async fn set_show_in_filters(&mut self, id: &str, show: bool) -> Result<(), ClientError> {
        self.patch_local(id, &json!({ "show_in_filters": show }), |row| row.show_in_filters = show)
            .await
    }
}

pub struct AttributeValues;

impl Resource for AttributeValues {
    const SEGMENT: &'static str = "values";
    const PARENT: Option<&'static str> = Some("attribute-types");
    const SINGULAR: &'static str = "Attribute value";
    const PLURAL: &'static str = "attribute values";
    type List = AttributeValue;
    type Detail = AttributeValueDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("order")
    }
}

pub type AttributeValueStore = ResourceStore<AttributeValues>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: String,
    pub value: String,
    pub slug: String,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub order: i64,
}

identified!(AttributeValue, title = value);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeValueDetail {
    #[serde(flatten)]
    pub base: AttributeValue,
    /// Owning attribute type id.
    pub attribute_type: String,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(AttributeValueDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct AttributeValuePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl AttributeValuePayload {
    pub fn new(value: impl Into<String>) -> Self {
        AttributeValuePayload {
            value: Some(value.into()),
            ..AttributeValuePayload::default()
        }
    }
}

impl Payload for AttributeValuePayload {}

impl ResourceStore<AttributeValues> {
    pub fn set_attribute_type(&mut self, attribute_type_id: impl Into<String>) {
        self.set_parent(attribute_type_id);
    }
}

/// Attribute values attached to one service.
pub struct ServiceAttributes;

impl Resource for ServiceAttributes {
    const SEGMENT: &'static str = "attributes";
    const PARENT: Option<&'static str> = Some("services");
    const SINGULAR: &'static str = "Service attribute";
    const PLURAL: &'static str = "service attributes";
    type List = ServiceAttribute;
    type Detail = ServiceAttribute;
}

pub type ServiceAttributeStore = ResourceStore<ServiceAttributes>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAttribute {
    pub id: String,
    pub attribute_value: AttributeValue,
    pub attribute_type_name: String,
}

identified!(ServiceAttribute);

impl ResourceStore<ServiceAttributes> {
    pub fn set_service(&mut self, service_id: impl Into<String>) {
        self.set_parent(service_id);
    }

    pub async fn attach(&mut self, attribute_value_id: &str) -> Result<ServiceAttribute, ClientError> {
        self.create(&json!({ "attribute_value": attribute_value_id })).await
    }

    pub async fn detach(&mut self, service_attribute_id: &str) -> Result<(), ClientError> {
        self.delete(service_attribute_id).await
    }
}
