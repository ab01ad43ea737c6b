//! Services, their image galleries and the reference lists their forms need.

use crate::catalog::brands::Brand;
use crate::catalog::common::{Audit, NamedRef, Publishable};
use crate::catalog::product_types::ProductType;
use crate::catalog::service_attributes::ServiceAttribute;
use crate::catalog::service_categories::ServiceCategory;
use crate::error::ClientError;
use crate::http::{Payload, Upload};
use crate::notify::Notification;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::response::PaginatedResponse;
use crate::store::ResourceStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const IMAGE_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct Services;

impl Resource for Services {
    const SEGMENT: &'static str = "services";
    const SINGULAR: &'static str = "Service";
    const PLURAL: &'static str = "services";
    type List = Service;
    type Detail = ServiceDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type ServiceStore = ResourceStore<Services>;

/// Gallery entry as embedded in a service row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub file: String,
    pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_published: bool,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub old_price: Option<String>,
    #[serde(default)]
    pub has_discount: bool,
    #[serde(default)]
    pub categories: Vec<NamedRef>,
    #[serde(default)]
    pub brand: Option<NamedRef>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

identified!(Service, title = name);

impl Publishable for Service {
    fn is_published(&self) -> bool {
        self.is_published
    }

    fn set_published_flag(&mut self, published: bool) {
        self.is_published = published;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub base: Service,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub site: String,
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub service_attributes: Vec<ServiceAttribute>,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(ServiceDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct ServicePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type_id: Option<String>,
}

impl ServicePayload {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        ServicePayload {
            name: Some(name.into()),
            content: Some(content.into()),
            ..ServicePayload::default()
        }
    }

    pub fn price(mut self, price: impl Into<String>, old_price: Option<String>) -> Self {
        self.price = Some(price.into());
        self.old_price = old_price;
        self
    }

    pub fn brand(mut self, brand_id: impl Into<String>) -> Self {
        self.brand_id = Some(brand_id.into());
        self
    }

    pub fn categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }
}

impl Payload for ServicePayload {}

impl ResourceStore<Services> {
    pub async fn fetch_categories(&self) -> Result<Vec<ServiceCategory>, ClientError> {
        self.lookup("service-categories/", "Failed to load categories.").await
    }

    pub async fn fetch_brands(&self) -> Result<Vec<Brand>, ClientError> {
        self.lookup("brands/", "Failed to load brands.").await
    }

    pub async fn fetch_product_types(&self) -> Result<Vec<ProductType>, ClientError> {
        self.lookup("product-types/", "Failed to load product types.").await
    }

    /// First page of a sibling collection, for form pickers.
    async fn lookup<T: DeserializeOwned>(&self, segment: &str, fallback: &str) -> Result<Vec<T>, ClientError> {
        let result = async {
            let path = self.client().site_path(segment)?;
            self.client().get::<PaginatedResponse<T>>(&path, &[]).await
        }
        .await;
        match result {
            Ok(page) => Ok(page.results),
            Err(e) => Err(self.report(e, fallback)),
        }
    }
}

/// A service's image gallery.
pub struct ServiceAttachments;

impl Resource for ServiceAttachments {
    const SEGMENT: &'static str = "attachments";
    const PARENT: Option<&'static str> = Some("services");
    const SINGULAR: &'static str = "Image";
    const PLURAL: &'static str = "images";
    type List = ServiceAttachment;
    type Detail = ServiceAttachment;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("order")
    }
}

pub type ServiceAttachmentStore = ResourceStore<ServiceAttachments>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAttachment {
    pub id: String,
    pub file: String,
    #[serde(default)]
    pub blurhash: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    pub is_primary: bool,
    #[serde(default)]
    pub order: i64,
}

identified!(ServiceAttachment);

#[derive(Clone, Debug, Default, Serialize)]
pub struct AttachmentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip)]
    pub file: Option<Upload>,
}

impl Payload for AttachmentPayload {
    fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        self.file.iter().map(|f| ("file", f)).collect()
    }
}

/// Gallery images must be jpeg/png/gif/webp and at most 10 MiB.
pub fn validate_image(upload: &Upload) -> Result<(), String> {
    if !IMAGE_TYPES.contains(&upload.mime.to_ascii_lowercase().as_str()) {
        return Err("File must be an image (JPG, PNG, GIF, WebP).".to_string());
    }
    if upload.len() > MAX_IMAGE_BYTES {
        return Err("File must not exceed 10MB.".to_string());
    }
    Ok(())
}

impl ResourceStore<ServiceAttachments> {
    pub fn set_service(&mut self, service_id: impl Into<String>) {
        self.set_parent(service_id);
    }

    /// Upload images one by one. Invalid or rejected files are reported and
    /// skipped. On an empty gallery the first upload becomes primary.
    pub async fn upload_many(
        &mut self,
        files: Vec<Upload>,
        alt_texts: &[String],
    ) -> Result<Vec<ServiceAttachment>, ClientError> {
        self.collection_path()?;
        let first_upload = self.items().is_empty();
        let existing = self.items().len() as i64;
        let mut uploaded = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            if let Err(reason) = validate_image(&file) {
                tracing::warn!(file = %file.file_name, %reason, "skipping upload");
                self.client()
                    .notify(Notification::negative(format!("{}: {}", file.file_name, reason)));
                continue;
            }
            let payload = AttachmentPayload {
                alt_text: alt_texts.get(index).cloned(),
                is_primary: Some(index == 0 && first_upload),
                order: Some(existing + index as i64),
                file: Some(file),
            };
            if let Ok(created) = self.create(&payload).await {
                uploaded.push(created);
            }
        }

        if !uploaded.is_empty() {
            self.announce(format!("Uploaded {} images.", uploaded.len()));
        }
        Ok(uploaded)
    }

    pub async fn set_primary(&mut self, attachment_id: &str) -> Result<ServiceAttachment, ClientError> {
        self.patch(attachment_id, &json!({ "is_primary": true })).await
    }

    pub fn primary(&self) -> Option<&ServiceAttachment> {
        self.items().iter().find(|a| a.is_primary)
    }
}
