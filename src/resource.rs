//! Entity schema: where a collection lives and what its records look like.

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::pagination::{PageFetcher, PageRequest, PaginationOptions};
use crate::response::PaginatedResponse;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A record with a server-assigned id.
pub trait Identified {
    fn id(&self) -> &str;

    /// Human label used in notifications.
    fn title(&self) -> Option<&str> {
        None
    }
}

/// One catalog collection under `/sites/{site}/`.
pub trait Resource: Send + Sync + 'static {
    /// Path segment, e.g. `brands`.
    const SEGMENT: &'static str;
    /// Parent collection segment for nested resources, e.g. `size-charts` for sizes.
    const PARENT: Option<&'static str> = None;
    /// Capitalised label for one record, e.g. `Brand`.
    const SINGULAR: &'static str;
    /// Lowercase label for many records, e.g. `brands`.
    const PLURAL: &'static str;

    type List: DeserializeOwned + Identified + Clone + Send + Sync + 'static;
    type Detail: DeserializeOwned + Identified + Clone + Send + Sync + 'static;

    fn pagination() -> PaginationOptions {
        PaginationOptions::default()
    }
}

/// `/sites/{site}/{segment}/` or `/sites/{site}/{parent}/{parent_id}/{segment}/`.
pub fn collection_path<R: Resource>(client: &ApiClient, parent_id: Option<&str>) -> Result<String, ClientError> {
    match R::PARENT {
        None => client.site_path(&format!("{}/", R::SEGMENT)),
        Some(parent) => {
            let parent_id = parent_id
                .filter(|id| !id.is_empty())
                .ok_or(ClientError::MissingContext(parent))?;
            client.site_path(&format!("{}/{}/{}/", parent, parent_id, R::SEGMENT))
        }
    }
}

pub fn item_path<R: Resource>(client: &ApiClient, parent_id: Option<&str>, id: &str) -> Result<String, ClientError> {
    Ok(format!("{}{}/", collection_path::<R>(client, parent_id)?, id))
}

/// Lists one collection page by page.
pub struct CollectionFetcher<R: Resource> {
    client: ApiClient,
    parent_id: Option<String>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> CollectionFetcher<R> {
    pub fn new(client: ApiClient) -> Self {
        CollectionFetcher {
            client,
            parent_id: None,
            _resource: PhantomData,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn set_parent_id(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
    }

    pub fn collection_path(&self) -> Result<String, ClientError> {
        collection_path::<R>(&self.client, self.parent_id.as_deref())
    }
}

#[async_trait]
impl<R: Resource> PageFetcher for CollectionFetcher<R> {
    type Item = R::List;

    async fn fetch_page(&self, request: PageRequest) -> Result<PaginatedResponse<R::List>, ClientError> {
        match request {
            PageRequest::Cursor(url) => self.client.get_url(&url).await,
            PageRequest::Params(params) => {
                let path = self.collection_path()?;
                self.client.get(&path, &params).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::config::ClientConfig;
    use crate::error::ConfigError;
    use crate::notify::TracingNotifier;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Clone, Deserialize)]
    struct Row {
        id: String,
    }

    impl Identified for Row {
        fn id(&self) -> &str {
            &self.id
        }
    }

    struct Things;

    impl Resource for Things {
        const SEGMENT: &'static str = "things";
        const SINGULAR: &'static str = "Thing";
        const PLURAL: &'static str = "things";
        type List = Row;
        type Detail = Row;
    }

    struct Parts;

    impl Resource for Parts {
        const SEGMENT: &'static str = "parts";
        const PARENT: Option<&'static str> = Some("things");
        const SINGULAR: &'static str = "Part";
        const PLURAL: &'static str = "parts";
        type List = Row;
        type Detail = Row;
    }

    fn client(site: Option<&str>) -> ApiClient {
        let mut config = ClientConfig::new("http://localhost:9/api/v1");
        config.site_id = site.map(Into::into);
        ApiClient::new(&config, Arc::new(MemoryTokenStore::default()), Arc::new(TracingNotifier)).unwrap()
    }

    #[test]
    fn top_level_paths() {
        let c = client(Some("s1"));
        assert_eq!(collection_path::<Things>(&c, None).unwrap(), "/sites/s1/things/");
        assert_eq!(item_path::<Things>(&c, None, "7").unwrap(), "/sites/s1/things/7/");
    }

    #[test]
    fn nested_paths_need_a_parent() {
        let c = client(Some("s1"));
        assert_eq!(
            collection_path::<Parts>(&c, Some("t1")).unwrap(),
            "/sites/s1/things/t1/parts/"
        );
        assert!(matches!(
            collection_path::<Parts>(&c, None),
            Err(ClientError::MissingContext("things"))
        ));
        assert!(matches!(
            collection_path::<Parts>(&c, Some("")),
            Err(ClientError::MissingContext("things"))
        ));
    }

    #[test]
    fn missing_site_is_a_config_error() {
        let c = client(None);
        assert!(matches!(
            collection_path::<Things>(&c, None),
            Err(ClientError::Config(ConfigError::MissingSite(_)))
        ));
    }
}
