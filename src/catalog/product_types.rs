use crate::catalog::common::Audit;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};

pub struct ProductTypes;

impl Resource for ProductTypes {
    const SEGMENT: &'static str = "product-types";
    const SINGULAR: &'static str = "Product type";
    const PLURAL: &'static str = "product types";
    type List = ProductType;
    type Detail = ProductTypeDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type ProductTypeStore = ResourceStore<ProductTypes>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

identified!(ProductType, title = name);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductTypeDetail {
    #[serde(flatten)]
    pub base: ProductType,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(ProductTypeDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProductTypePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductTypePayload {
    pub fn new(name: impl Into<String>) -> Self {
        ProductTypePayload {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Payload for ProductTypePayload {}
