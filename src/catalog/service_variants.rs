//! Sellable variants (size, SKU, price) of one service.

use crate::catalog::sizes::Size;
use crate::error::ClientError;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub struct ServiceVariants;

impl Resource for ServiceVariants {
    const SEGMENT: &'static str = "variants";
    const PARENT: Option<&'static str> = Some("services");
    const SINGULAR: &'static str = "Variant";
    const PLURAL: &'static str = "variants";
    type List = ServiceVariant;
    type Detail = ServiceVariant;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("sku")
    }
}

pub type ServiceVariantStore = ResourceStore<ServiceVariants>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceVariant {
    pub id: String,
    pub size: Size,
    pub sku: String,
    pub price: String,
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

identified!(ServiceVariant, title = sku);

#[derive(Clone, Debug, Serialize)]
pub struct ServiceVariantPayload {
    /// Size id.
    pub size: String,
    pub sku: String,
    pub price: String,
    pub is_active: bool,
    pub attributes: Map<String, Value>,
}

impl ServiceVariantPayload {
    pub fn new(size: impl Into<String>, sku: impl Into<String>, price: impl Into<String>) -> Self {
        ServiceVariantPayload {
            size: size.into(),
            sku: sku.into(),
            price: price.into(),
            is_active: true,
            attributes: Map::new(),
        }
    }
}

impl Payload for ServiceVariantPayload {}

impl ResourceStore<ServiceVariants> {
    pub fn set_service(&mut self, service_id: impl Into<String>) {
        self.set_parent(service_id);
    }

    pub fn service_id(&self) -> Option<&str> {
        self.parent_id()
    }

    pub fn clear_service(&mut self) {
        self.clear_parent();
    }

    pub async fn set_active(&mut self, id: &str, is_active: bool) -> Result<(), ClientError> {
        self.patch_local(id, &json!({ "is_active": is_active }), |row| row.is_active = is_active)
            .await
    }

    pub async fn bulk_set_active<S: AsRef<str> + Sync>(&mut self, ids: &[S], is_active: bool) -> Result<(), ClientError> {
        self.bulk_patch_local(ids, &json!({ "is_active": is_active }), |row| row.is_active = is_active)
            .await
    }

    pub fn active_count(&self) -> usize {
        self.items().iter().filter(|v| v.is_active).count()
    }

    pub fn inactive_count(&self) -> usize {
        self.items().iter().filter(|v| !v.is_active).count()
    }
}
