//! One generic store per collection: cached page, selected record, CRUD,
//! bulk fan-out and optimistic in-place patches.
//!
//! Every failure is logged, reported to the notifier with a normalized
//! message and then returned to the caller.

use crate::error::ClientError;
use crate::http::{ApiClient, Payload};
use crate::notify::Notification;
use crate::pagination::{FilterValue, PaginationOptions, Paginator, TablePagination};
use crate::resource::{item_path, CollectionFetcher, Identified, Resource};
use futures::future::try_join_all;
use serde::de::IgnoredAny;

pub struct ResourceStore<R: Resource> {
    client: ApiClient,
    paginator: Paginator<CollectionFetcher<R>>,
    items: Vec<R::List>,
    selected: Option<R::Detail>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(client: ApiClient) -> Self {
        let mut options = R::pagination();
        options.default_page_size = client.default_page_size();
        Self::with_options(client, options)
    }

    pub fn with_options(client: ApiClient, options: PaginationOptions) -> Self {
        let fetcher = CollectionFetcher::new(client.clone());
        ResourceStore {
            client,
            paginator: Paginator::new(fetcher, options),
            items: Vec::new(),
            selected: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn items(&self) -> &[R::List] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<R::List> {
        &mut self.items
    }

    pub fn find(&self, id: &str) -> Option<&R::List> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn selected(&self) -> Option<&R::Detail> {
        self.selected.as_ref()
    }

    pub fn clear_selected(&mut self) {
        self.selected = None;
    }

    pub fn paginator(&self) -> &Paginator<CollectionFetcher<R>> {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator<CollectionFetcher<R>> {
        &mut self.paginator
    }

    pub fn is_loading(&self) -> bool {
        self.paginator.is_loading()
    }

    pub fn table_pagination(&self) -> TablePagination {
        self.paginator.table_pagination()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.paginator.fetcher().parent_id()
    }

    /// Scope a nested collection to one parent. Changing the parent drops the cache.
    pub fn set_parent(&mut self, parent_id: impl Into<String>) {
        let parent_id = parent_id.into();
        if self.parent_id() == Some(parent_id.as_str()) {
            return;
        }
        self.paginator.fetcher_mut().set_parent_id(Some(parent_id));
        self.paginator.reset();
        self.items.clear();
        self.selected = None;
    }

    /// Drop cached rows, the selection and all query state.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
        self.paginator.reset();
    }

    pub fn clear_parent(&mut self) {
        self.paginator.fetcher_mut().set_parent_id(None);
        self.paginator.reset();
        self.items.clear();
        self.selected = None;
    }

    pub fn collection_path(&self) -> Result<String, ClientError> {
        self.paginator.fetcher().collection_path()
    }

    pub fn item_path(&self, id: &str) -> Result<String, ClientError> {
        item_path::<R>(&self.client, self.parent_id(), id)
    }

    /// Log a failed action, tell the user, hand the error back.
    pub(crate) fn report(&self, error: ClientError, fallback: &str) -> ClientError {
        tracing::error!(resource = R::SEGMENT, error = %error, "{}", fallback);
        self.client.notify(Notification::negative(error.user_message(fallback)));
        error
    }

    pub(crate) fn announce(&self, message: impl Into<String>) {
        self.client.notify(Notification::positive(message));
    }

    fn load_failed() -> String {
        format!("Failed to load {}.", R::PLURAL)
    }

    fn absorb(&mut self, result: Result<Vec<R::List>, ClientError>) -> Result<&[R::List], ClientError> {
        match result {
            Ok(items) => {
                self.items = items;
                Ok(&self.items)
            }
            Err(e) => Err(self.report(e, &Self::load_failed())),
        }
    }

    fn absorb_optional(
        &mut self,
        result: Result<Option<Vec<R::List>>, ClientError>,
    ) -> Result<Option<&[R::List]>, ClientError> {
        match result {
            Ok(None) => Ok(None),
            Ok(Some(items)) => {
                self.items = items;
                Ok(Some(&self.items))
            }
            Err(e) => Err(self.report(e, &Self::load_failed())),
        }
    }

    /// Load the current page (or follow `cursor`) into `items`.
    pub async fn fetch(&mut self, cursor: Option<&str>) -> Result<&[R::List], ClientError> {
        let result = self.paginator.fetch_data(cursor).await;
        self.absorb(result)
    }

    /// Reload after a mutation. A failure here is already reported by `fetch`.
    pub(crate) async fn refetch(&mut self) {
        let _ = self.fetch(None).await;
    }

    pub async fn fetch_by_id(&mut self, id: &str) -> Result<&R::Detail, ClientError> {
        let result = async {
            let path = self.item_path(id)?;
            self.client.get::<R::Detail>(&path, &[]).await
        }
        .await;
        match result {
            Ok(detail) => Ok(&*self.selected.insert(detail)),
            Err(e) => {
                self.selected = None;
                Err(self.report(e, &format!("Failed to load {}.", R::SINGULAR.to_lowercase())))
            }
        }
    }

    pub async fn create<P: Payload + ?Sized>(&mut self, payload: &P) -> Result<R::Detail, ClientError> {
        let result = async {
            let path = self.collection_path()?;
            self.client.post::<R::Detail, P>(&path, payload).await
        }
        .await;
        let created = match result {
            Ok(created) => created,
            Err(e) => return Err(self.report(e, &format!("Failed to create {}.", R::SINGULAR.to_lowercase()))),
        };
        self.announce(done_message::<R>(&created, "created"));
        self.refetch().await;
        Ok(created)
    }

    /// Full replace (PUT).
    pub async fn update<P: Payload + ?Sized>(&mut self, id: &str, payload: &P) -> Result<R::Detail, ClientError> {
        let result = async {
            let path = self.item_path(id)?;
            self.client.put::<R::Detail, P>(&path, payload).await
        }
        .await;
        let updated = match result {
            Ok(updated) => updated,
            Err(e) => return Err(self.report(e, &format!("Failed to update {}.", R::SINGULAR.to_lowercase()))),
        };
        self.announce(done_message::<R>(&updated, "updated"));
        self.refetch().await;
        if self.selected.as_ref().is_some_and(|s| s.id() == id) {
            let _ = self.fetch_by_id(id).await;
        }
        Ok(updated)
    }

    /// Partial update (PATCH), followed by a refetch.
    pub async fn patch<P: Payload + ?Sized>(&mut self, id: &str, payload: &P) -> Result<R::Detail, ClientError> {
        let result = async {
            let path = self.item_path(id)?;
            self.client.patch::<R::Detail, P>(&path, payload).await
        }
        .await;
        let patched = match result {
            Ok(patched) => patched,
            Err(e) => return Err(self.report(e, &format!("Failed to update {}.", R::SINGULAR.to_lowercase()))),
        };
        self.announce(done_message::<R>(&patched, "updated"));
        self.refetch().await;
        Ok(patched)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        let result = async {
            let path = self.item_path(id)?;
            self.client.delete(&path).await
        }
        .await;
        if let Err(e) = result {
            return Err(self.report(e, &format!("Failed to delete {}.", R::SINGULAR.to_lowercase())));
        }
        self.announce(format!("{} deleted.", R::SINGULAR));
        self.refetch().await;
        if self.selected.as_ref().is_some_and(|s| s.id() == id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Concurrent DELETEs, all-or-nothing, then one refetch.
    pub async fn bulk_delete<S: AsRef<str> + Sync>(&mut self, ids: &[S]) -> Result<(), ClientError> {
        let result = async {
            let paths = self.item_paths(ids)?;
            let client = &self.client;
            try_join_all(paths.iter().map(|path| client.delete(path))).await
        }
        .await;
        if let Err(e) = result {
            return Err(self.report(e, &format!("Failed to delete {}.", R::PLURAL)));
        }
        self.announce(format!("Deleted {} {}.", ids.len(), R::PLURAL));
        self.refetch().await;
        if let Some(selected) = &self.selected {
            if ids.iter().any(|id| id.as_ref() == selected.id()) {
                self.selected = None;
            }
        }
        Ok(())
    }

    /// Concurrent PATCHes with the same payload, all-or-nothing, then one refetch.
    pub async fn bulk_patch<S, P>(&mut self, ids: &[S], payload: &P) -> Result<(), ClientError>
    where
        S: AsRef<str> + Sync,
        P: Payload + ?Sized,
    {
        if let Err(e) = self.send_patches(ids, payload).await {
            return Err(self.report(e, &format!("Failed to update {}.", R::PLURAL)));
        }
        self.announce(format!("Updated {} {}.", ids.len(), R::PLURAL));
        self.refetch().await;
        Ok(())
    }

    /// PATCH one record and, once the server accepts it, apply the same change
    /// to the cached row instead of refetching.
    pub async fn patch_local<P, F>(&mut self, id: &str, payload: &P, apply: F) -> Result<(), ClientError>
    where
        P: Payload + ?Sized,
        F: FnOnce(&mut R::List),
    {
        if let Err(e) = self.send_patches(&[id], payload).await {
            return Err(self.report(e, &format!("Failed to update {}.", R::SINGULAR.to_lowercase())));
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id() == id) {
            apply(item);
        }
        Ok(())
    }

    /// Bulk form of [`patch_local`](Self::patch_local). The cache is untouched unless every PATCH succeeds.
    pub async fn bulk_patch_local<S, P, F>(&mut self, ids: &[S], payload: &P, mut apply: F) -> Result<(), ClientError>
    where
        S: AsRef<str> + Sync,
        P: Payload + ?Sized,
        F: FnMut(&mut R::List),
    {
        if let Err(e) = self.send_patches(ids, payload).await {
            return Err(self.report(e, &format!("Failed to update {}.", R::PLURAL)));
        }
        for item in self.items.iter_mut() {
            if ids.iter().any(|id| id.as_ref() == item.id()) {
                apply(item);
            }
        }
        self.announce(format!("Updated {} {}.", ids.len(), R::PLURAL));
        Ok(())
    }

    async fn send_patches<S, P>(&self, ids: &[S], payload: &P) -> Result<(), ClientError>
    where
        S: AsRef<str> + Sync,
        P: Payload + ?Sized,
    {
        let paths = self.item_paths(ids)?;
        let client = &self.client;
        try_join_all(paths.iter().map(|path| client.patch::<IgnoredAny, P>(path, payload))).await?;
        Ok(())
    }

    fn item_paths<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<String>, ClientError> {
        ids.iter().map(|id| self.item_path(id.as_ref())).collect()
    }

    pub async fn search(&mut self, query: impl Into<String>) -> Result<&[R::List], ClientError> {
        self.paginator.set_search(query);
        self.fetch(None).await
    }

    pub async fn filter<I, K, V>(&mut self, filters: I) -> Result<&[R::List], ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        for (key, value) in filters {
            self.paginator.set_filter(key, value);
        }
        self.fetch(None).await
    }

    pub async fn clear_filters(&mut self) -> Result<&[R::List], ClientError> {
        self.paginator.clear_filters();
        self.fetch(None).await
    }

    pub async fn handle_table_request(&mut self, table: Option<&TablePagination>) -> Result<&[R::List], ClientError> {
        let result = self.paginator.handle_table_request(table).await;
        self.absorb(result)
    }

    pub async fn next_page(&mut self) -> Result<Option<&[R::List]>, ClientError> {
        let result = self.paginator.go_to_next_page().await;
        self.absorb_optional(result)
    }

    pub async fn previous_page(&mut self) -> Result<Option<&[R::List]>, ClientError> {
        let result = self.paginator.go_to_previous_page().await;
        self.absorb_optional(result)
    }

    pub async fn first_page(&mut self) -> Result<&[R::List], ClientError> {
        let result = self.paginator.go_to_first_page().await;
        self.absorb(result)
    }

    pub async fn last_page(&mut self) -> Result<&[R::List], ClientError> {
        let result = self.paginator.go_to_last_page().await;
        self.absorb(result)
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<Option<&[R::List]>, ClientError> {
        let result = self.paginator.go_to_page(page).await;
        self.absorb_optional(result)
    }
}

fn done_message<R: Resource>(record: &R::Detail, verb: &str) -> String {
    match record.title() {
        Some(title) => format!("{} \"{}\" {}.", R::SINGULAR, title, verb),
        None => format!("{} {}.", R::SINGULAR, verb),
    }
}
