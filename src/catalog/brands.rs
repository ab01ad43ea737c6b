use crate::catalog::common::{Audit, Publishable};
use crate::http::{Payload, Upload};
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};

pub struct Brands;

impl Resource for Brands {
    const SEGMENT: &'static str = "brands";
    const SINGULAR: &'static str = "Brand";
    const PLURAL: &'static str = "brands";
    type List = Brand;
    type Detail = BrandDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type BrandStore = ResourceStore<Brands>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_published: bool,
    /// Logo URL.
    #[serde(default)]
    pub file: Option<String>,
}

identified!(Brand, title = name);

impl Publishable for Brand {
    fn is_published(&self) -> bool {
        self.is_published
    }

    fn set_published_flag(&mut self, published: bool) {
        self.is_published = published;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandDetail {
    #[serde(flatten)]
    pub base: Brand,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    pub site: String,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(BrandDetail, base);

/// Create or update body. The logo goes out as multipart when present.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BrandPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip)]
    pub file: Option<Upload>,
}

impl BrandPayload {
    pub fn new(name: impl Into<String>) -> Self {
        BrandPayload {
            name: Some(name.into()),
            ..BrandPayload::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    pub fn logo(mut self, file: Upload) -> Self {
        self.file = Some(file);
        self
    }
}

impl Payload for BrandPayload {
    fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        self.file.iter().map(|f| ("file", f)).collect()
    }
}
