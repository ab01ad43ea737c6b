//! Static and promo pages.

use crate::catalog::common::{Creator, Publishable};
use crate::error::ClientError;
use crate::http::{Payload, Upload};
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct Pages;

impl Resource for Pages {
    const SEGMENT: &'static str = "pages";
    const SINGULAR: &'static str = "Page";
    const PLURAL: &'static str = "pages";
    type List = Page;
    type Detail = PageDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type PageStore = ResourceStore<Pages>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Page,
    Promo,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Page => "page",
            PageType::Promo => "promo",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetaTag {
    pub id: String,
    pub name: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub is_published: bool,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default)]
    pub page_type_display: String,
    #[serde(default)]
    pub meta_tags: Vec<PageMetaTag>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub blurhash: Option<String>,
}

identified!(Page, title = name);

impl Publishable for Page {
    fn is_published(&self) -> bool {
        self.is_published
    }

    fn set_published_flag(&mut self, published: bool) {
        self.is_published = published;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    #[serde(flatten)]
    pub base: Page,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(default)]
    pub site: Option<String>,
}

identified!(PageDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct PagePayload {
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
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    #[serde(skip)]
    pub file: Option<Upload>,
}

impl PagePayload {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        PagePayload {
            name: Some(name.into()),
            content: Some(content.into()),
            ..PagePayload::default()
        }
    }

    pub fn page_type(mut self, page_type: PageType) -> Self {
        self.page_type = Some(page_type);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    pub fn attach(mut self, file: Upload) -> Self {
        self.file = Some(file);
        self
    }

    /// A new page needs a name and content.
    pub fn validate_for_create(&self) -> Result<(), ClientError> {
        if is_blank(self.name.as_deref()) {
            return Err(ClientError::Validation("Page name is required.".to_string()));
        }
        if is_blank(self.content.as_deref()) {
            return Err(ClientError::Validation("Page content is required.".to_string()));
        }
        Ok(())
    }

    /// Fields left out are fine; fields sent must not be blank.
    pub fn validate_for_update(&self) -> Result<(), ClientError> {
        if self.name.is_some() && is_blank(self.name.as_deref()) {
            return Err(ClientError::Validation("Page name cannot be empty.".to_string()));
        }
        if self.content.is_some() && is_blank(self.content.as_deref()) {
            return Err(ClientError::Validation("Page content cannot be empty.".to_string()));
        }
        Ok(())
    }
}

impl Payload for PagePayload {
    fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        self.file.iter().map(|f| ("file", f)).collect()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl ResourceStore<Pages> {
    pub async fn create_page(&mut self, payload: &PagePayload) -> Result<PageDetail, ClientError> {
        if let Err(e) = payload.validate_for_create() {
            return Err(self.report(e, "Invalid page."));
        }
        self.create(payload).await
    }

    pub async fn update_page(&mut self, id: &str, payload: &PagePayload) -> Result<PageDetail, ClientError> {
        if let Err(e) = payload.validate_for_update() {
            return Err(self.report(e, "Invalid page."));
        }
        self.update(id, payload).await
    }

    pub async fn patch_page(&mut self, id: &str, payload: &PagePayload) -> Result<PageDetail, ClientError> {
        if let Err(e) = payload.validate_for_update() {
            return Err(self.report(e, "Invalid page."));
        }
        self.patch(id, payload).await
    }

    /// Flip `is_published` of a page in the current list.
    pub async fn toggle_publication(&mut self, id: &str) -> Result<PageDetail, ClientError> {
        let Some(published) = self.find(id).map(|p| p.is_published) else {
            let missing = ClientError::NotFound(format!("page {} is not in the current list", id));
            return Err(self.report(missing, "Page not found."));
        };
        self.patch(id, &json!({ "is_published": !published })).await
    }

    /// Case-insensitive match on name, title or slug within the cached page.
    pub fn search_by_name(&self, term: &str) -> Vec<&Page> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.items().iter().collect();
        }
        self.items()
            .iter()
            .filter(|page| {
                page.name.to_lowercase().contains(&term)
                    || page.title.as_deref().is_some_and(|t| t.to_lowercase().contains(&term))
                    || page.slug.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn published(&self) -> impl Iterator<Item = &Page> {
        self.items().iter().filter(|p| p.is_published)
    }

    pub fn unpublished(&self) -> impl Iterator<Item = &Page> {
        self.items().iter().filter(|p| !p.is_published)
    }

    pub fn clear_state(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_and_content() {
        assert!(PagePayload::new("About", "Hello").validate_for_create().is_ok());
        let err = PagePayload::new("  ", "Hello").validate_for_create().unwrap_err();
        assert_eq!(err.to_string(), "Page name is required.");
        let err = PagePayload::new("About", "").validate_for_create().unwrap_err();
        assert_eq!(err.to_string(), "Page content is required.");
    }

    #[test]
    fn update_checks_only_sent_fields() {
        let partial = PagePayload {
            is_published: Some(true),
            ..PagePayload::default()
        };
        assert!(partial.validate_for_update().is_ok());
        let blank = PagePayload {
            content: Some(" ".into()),
            ..PagePayload::default()
        };
        assert!(matches!(blank.validate_for_update(), Err(ClientError::Validation(_))));
    }

    #[test]
    fn page_type_round_trips_lowercase() {
        assert_eq!(serde_json::to_value(PageType::Promo).unwrap(), json!("promo"));
        let parsed: PageType = serde_json::from_value(json!("page")).unwrap();
        assert_eq!(parsed, PageType::Page);
    }
}
