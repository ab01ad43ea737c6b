//! Service categories: a tree flattened by the server into `parent`, `level`
//! and `has_children`, plus a whole-collection cache for autocomplete.

use crate::catalog::common::{Audit, Publishable};
use crate::error::ClientError;
use crate::http::{ApiClient, Payload};
use crate::pagination::{FilterValue, PageFetcher, PageRequest, PaginationOptions, Paginator, TablePagination};
use crate::resource::{CollectionFetcher, Identified, Resource};
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub struct ServiceCategories;

impl Resource for ServiceCategories {
    const SEGMENT: &'static str = "service-categories";
    const SINGULAR: &'static str = "Service category";
    const PLURAL: &'static str = "service categories";
    type List = ServiceCategory;
    type Detail = ServiceCategoryDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("order")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryParent {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_published: bool,
    pub order: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub brief: String,
    pub is_published: bool,
    #[serde(default)]
    pub parent: Option<CategoryParent>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub blurhash: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub has_children: bool,
}

identified!(ServiceCategory, title = name);

impl Publishable for ServiceCategory {
    fn is_published(&self) -> bool {
        self.is_published
    }

    fn set_published_flag(&mut self, published: bool) {
        self.is_published = published;
    }
}

impl ServiceCategory {
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceCategoryDetail {
    #[serde(flatten)]
    pub base: ServiceCategory,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(ServiceCategoryDetail, base);

/// Create/replace body. `parent: None` makes a root category.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ServiceCategoryPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ServiceCategoryPayload {
    pub fn new(name: impl Into<String>) -> Self {
        ServiceCategoryPayload {
            name: name.into(),
            ..ServiceCategoryPayload::default()
        }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(parent_id.into());
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = Some(brief.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }
}

impl Payload for ServiceCategoryPayload {}

/// Autocomplete entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brief: String,
    pub level: u32,
    pub has_children: bool,
    pub is_published: bool,
    pub display_name: String,
}

impl From<&ServiceCategory> for CategoryOption {
    fn from(category: &ServiceCategory) -> Self {
        CategoryOption {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            brief: category.brief.clone(),
            level: category.level,
            has_children: category.has_children,
            is_published: category.is_published,
            display_name: display_name(category),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyMeta {
    pub total_count: u64,
    pub max_level: u32,
}

impl HierarchyMeta {
    pub fn from_categories(categories: &[ServiceCategory]) -> Self {
        HierarchyMeta {
            total_count: categories.len() as u64,
            max_level: categories.iter().map(|c| c.level).max().unwrap_or(0),
        }
    }
}

/// Row of `service-categories/hierarchy/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyItem {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub brief: String,
    pub is_published: bool,
    pub order: i64,
    pub parent_id: Option<String>,
    pub level: u32,
    pub has_children: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct HierarchyResponse {
    categories: Vec<HierarchyItem>,
    meta: HierarchyMeta,
}

/// `"—" × level + " " + name`, then ` [+]` for branches and ` (hidden)` for unpublished.
pub fn display_name(category: &ServiceCategory) -> String {
    let mut label = format!("{} {}", "—".repeat(category.level as usize), category.name);
    if category.has_children {
        label.push_str(" [+]");
    }
    if !category.is_published {
        label.push_str(" (hidden)");
    }
    label
}

fn sibling_order(a: &ServiceCategory, b: &ServiceCategory) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Pre-order walk from the roots: each category followed by its subtree,
/// siblings ordered by `order` then name. Orphans (parent not in the input)
/// are dropped.
pub fn sort_by_hierarchy(categories: &[ServiceCategory]) -> Vec<ServiceCategory> {
    let mut children: HashMap<Option<&str>, Vec<&ServiceCategory>> = HashMap::new();
    for category in categories {
        children.entry(category.parent_id()).or_default().push(category);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| sibling_order(a, b));
    }

    let mut sorted = Vec::with_capacity(categories.len());
    let mut visited = HashSet::new();
    let mut stack: Vec<&ServiceCategory> = children
        .get(&None)
        .map(|roots| roots.iter().rev().copied().collect())
        .unwrap_or_default();
    while let Some(category) = stack.pop() {
        if !visited.insert(category.id.as_str()) {
            continue;
        }
        sorted.push(category.clone());
        if let Some(kids) = children.get(&Some(category.id.as_str())) {
            stack.extend(kids.iter().rev().copied());
        }
    }
    sorted
}

/// Case-insensitive match on name or brief; an empty query matches everything.
pub fn matches_query(category: &ServiceCategory, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    category.name.to_lowercase().contains(&query) || category.brief.to_lowercase().contains(&query)
}

pub struct ServiceCategoryStore {
    store: ResourceStore<ServiceCategories>,
    cache: Option<Vec<ServiceCategory>>,
    meta: HierarchyMeta,
    hierarchy: Vec<HierarchyItem>,
}

impl ServiceCategoryStore {
    pub fn new(client: ApiClient) -> Self {
        ServiceCategoryStore {
            store: ResourceStore::new(client),
            cache: None,
            meta: HierarchyMeta::default(),
            hierarchy: Vec::new(),
        }
    }

    /// Read-only view of the generic store. Writes and navigation go through
    /// the wrappers below so the tree order and the cache stay consistent.
    pub fn store(&self) -> &ResourceStore<ServiceCategories> {
        &self.store
    }

    /// Query state only; the next `fetch` applies it.
    pub fn paginator_mut(&mut self) -> &mut Paginator<CollectionFetcher<ServiceCategories>> {
        self.store.paginator_mut()
    }

    pub fn items(&self) -> &[ServiceCategory] {
        self.store.items()
    }

    pub fn hierarchy_meta(&self) -> HierarchyMeta {
        self.meta
    }

    pub fn hierarchy(&self) -> &[HierarchyItem] {
        &self.hierarchy
    }

    pub fn cached(&self) -> Option<&[ServiceCategory]> {
        self.cache.as_deref()
    }

    fn sort_items(&mut self) {
        let sorted = sort_by_hierarchy(self.store.items());
        *self.store.items_mut() = sorted;
    }

    /// Load a page and order it as a tree.
    pub async fn fetch(&mut self, cursor: Option<&str>) -> Result<&[ServiceCategory], ClientError> {
        self.store.fetch(cursor).await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn fetch_by_id(&mut self, id: &str) -> Result<&ServiceCategoryDetail, ClientError> {
        self.store.fetch_by_id(id).await
    }

    pub async fn search(&mut self, query: impl Into<String>) -> Result<&[ServiceCategory], ClientError> {
        self.store.search(query).await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn filter<I, K, V>(&mut self, filters: I) -> Result<&[ServiceCategory], ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        self.store.filter(filters).await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn clear_filters(&mut self) -> Result<&[ServiceCategory], ClientError> {
        self.store.clear_filters().await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn handle_table_request(
        &mut self,
        table: Option<&TablePagination>,
    ) -> Result<&[ServiceCategory], ClientError> {
        self.store.handle_table_request(table).await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn next_page(&mut self) -> Result<Option<&[ServiceCategory]>, ClientError> {
        let moved = self.store.next_page().await?.is_some();
        Ok(self.sorted_if(moved))
    }

    pub async fn previous_page(&mut self) -> Result<Option<&[ServiceCategory]>, ClientError> {
        let moved = self.store.previous_page().await?.is_some();
        Ok(self.sorted_if(moved))
    }

    pub async fn first_page(&mut self) -> Result<&[ServiceCategory], ClientError> {
        self.store.first_page().await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn last_page(&mut self) -> Result<&[ServiceCategory], ClientError> {
        self.store.last_page().await?;
        self.sort_items();
        Ok(self.store.items())
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<Option<&[ServiceCategory]>, ClientError> {
        let moved = self.store.go_to_page(page).await?.is_some();
        Ok(self.sorted_if(moved))
    }

    fn sorted_if(&mut self, moved: bool) -> Option<&[ServiceCategory]> {
        if !moved {
            return None;
        }
        self.sort_items();
        Some(self.store.items())
    }

    /// Record that the collection changed: drop the autocomplete cache and
    /// restore tree order on whatever the store reloaded.
    fn mutated(&mut self) {
        self.invalidate_cache();
        self.sort_items();
    }

    pub async fn create(&mut self, payload: &ServiceCategoryPayload) -> Result<ServiceCategoryDetail, ClientError> {
        let created = self.store.create(payload).await?;
        self.mutated();
        Ok(created)
    }

    pub async fn update(
        &mut self,
        id: &str,
        payload: &ServiceCategoryPayload,
    ) -> Result<ServiceCategoryDetail, ClientError> {
        let updated = self.store.update(id, payload).await?;
        self.mutated();
        Ok(updated)
    }

    pub async fn patch<P: Payload + ?Sized>(
        &mut self,
        id: &str,
        payload: &P,
    ) -> Result<ServiceCategoryDetail, ClientError> {
        let patched = self.store.patch(id, payload).await?;
        self.mutated();
        Ok(patched)
    }

    pub async fn bulk_patch<S, P>(&mut self, ids: &[S], payload: &P) -> Result<(), ClientError>
    where
        S: AsRef<str> + Sync,
        P: Payload + ?Sized,
    {
        self.store.bulk_patch(ids, payload).await?;
        self.mutated();
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        self.store.delete(id).await?;
        self.mutated();
        Ok(())
    }

    pub async fn bulk_delete<S: AsRef<str> + Sync>(&mut self, ids: &[S]) -> Result<(), ClientError> {
        self.store.bulk_delete(ids).await?;
        self.mutated();
        Ok(())
    }

    pub async fn set_published(&mut self, id: &str, published: bool) -> Result<(), ClientError> {
        self.store.set_published(id, published).await?;
        self.invalidate_cache();
        Ok(())
    }

    pub async fn bulk_set_published<S: AsRef<str> + Sync>(
        &mut self,
        ids: &[S],
        published: bool,
    ) -> Result<(), ClientError> {
        self.store.bulk_set_published(ids, published).await?;
        self.invalidate_cache();
        Ok(())
    }

    pub fn invalidate_cache(&mut self) {
        tracing::debug!("service category cache invalidated");
        self.cache = None;
    }

    /// Walk every cursor once and keep the deduplicated result until the next mutation.
    pub async fn load_all_into_cache(&mut self) -> Result<&[ServiceCategory], ClientError> {
        if self.cache.as_ref().is_some_and(|c| !c.is_empty()) {
            return Ok(self.cache.as_deref().unwrap_or_default());
        }
        let all = match self.walk_all().await {
            Ok(all) => all,
            Err(e) => return Err(self.store.report(e, "Failed to load service categories.")),
        };
        self.meta = HierarchyMeta::from_categories(&all);
        tracing::info!(count = all.len(), max_level = self.meta.max_level, "service categories cached");
        Ok(self.cache.insert(all).as_slice())
    }

    async fn walk_all(&self) -> Result<Vec<ServiceCategory>, ClientError> {
        let fetcher = self.store.paginator().fetcher();
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        let mut page = fetcher.fetch_page(PageRequest::Params(Vec::new())).await?;
        loop {
            let next = page.next.take();
            for category in page.results {
                if seen.insert(category.id.clone()) {
                    all.push(category);
                }
            }
            match next {
                Some(url) => page = fetcher.fetch_page(PageRequest::Cursor(url)).await?,
                None => break,
            }
        }
        Ok(all)
    }

    /// Options from the full cache when loaded, else from the current page.
    pub fn options_from_cache(&self, query: &str) -> Vec<CategoryOption> {
        let source = self.cache.as_deref().unwrap_or(self.store.items());
        source
            .iter()
            .filter(|c| matches_query(c, query))
            .map(CategoryOption::from)
            .collect()
    }

    pub async fn autocomplete(&mut self, query: &str) -> Result<Vec<CategoryOption>, ClientError> {
        self.load_all_into_cache().await?;
        Ok(self.options_from_cache(query))
    }

    /// `service-categories/hierarchy/`: the whole tree with server-side meta.
    pub async fn fetch_hierarchy(&mut self) -> Result<&[HierarchyItem], ClientError> {
        let result = async {
            let path = self.store.client().site_path("service-categories/hierarchy/")?;
            self.store.client().get::<HierarchyResponse>(&path, &[]).await
        }
        .await;
        match result {
            Ok(response) => {
                self.meta = response.meta;
                self.hierarchy = response.categories;
                Ok(&self.hierarchy)
            }
            Err(e) => Err(self.store.report(e, "Failed to load the category hierarchy.")),
        }
    }

    pub fn find(&self, id: &str) -> Option<&ServiceCategory> {
        self.cache
            .as_deref()
            .and_then(|c| c.iter().find(|cat| cat.id() == id))
            .or_else(|| self.store.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, name: &str, parent: Option<&str>, order: i64, level: u32) -> ServiceCategory {
        ServiceCategory {
            id: id.into(),
            name: name.into(),
            slug: id.into(),
            brief: String::new(),
            is_published: true,
            parent: parent.map(|p| CategoryParent {
                id: p.into(),
                name: p.into(),
                slug: p.into(),
                is_published: true,
                order: 0,
            }),
            order,
            file: None,
            blurhash: None,
            level,
            has_children: false,
        }
    }

    fn ids(categories: &[ServiceCategory]) -> Vec<&str> {
        categories.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn hierarchy_is_pre_order_with_sibling_ordering() {
        let input = vec![
            cat("b1", "Beta child", Some("b"), 0, 1),
            cat("a", "Alpha", None, 1, 0),
            cat("b", "Beta", None, 0, 0),
            cat("a2", "zeta", Some("a"), 5, 1),
            cat("a1", "Eta", Some("a"), 5, 1),
            cat("a1x", "Deep", Some("a1"), 0, 2),
        ];
        let sorted = sort_by_hierarchy(&input);
        assert_eq!(ids(&sorted), vec!["b", "b1", "a", "a1", "a1x", "a2"]);
    }

    #[test]
    fn orphans_are_dropped() {
        let input = vec![cat("root", "Root", None, 0, 0), cat("lost", "Lost", Some("gone"), 0, 1)];
        assert_eq!(ids(&sort_by_hierarchy(&input)), vec!["root"]);
    }

    #[test]
    fn empty_input_sorts_to_empty() {
        assert!(sort_by_hierarchy(&[]).is_empty());
    }

    #[test]
    fn display_name_marks_depth_children_and_visibility() {
        let mut c = cat("x", "Shoes", Some("p"), 0, 2);
        assert_eq!(display_name(&c), "—— Shoes");
        c.has_children = true;
        c.is_published = false;
        assert_eq!(display_name(&c), "—— Shoes [+] (hidden)");
        let root = cat("r", "Root", None, 0, 0);
        assert_eq!(display_name(&root), " Root");
    }

    #[test]
    fn query_matches_name_or_brief() {
        let mut c = cat("x", "Running Shoes", None, 0, 0);
        c.brief = "For trails".into();
        assert!(matches_query(&c, ""));
        assert!(matches_query(&c, "shoe"));
        assert!(matches_query(&c, "TRAIL"));
        assert!(!matches_query(&c, "boots"));
    }

    #[test]
    fn meta_counts_and_max_level() {
        let input = vec![cat("a", "A", None, 0, 0), cat("b", "B", Some("a"), 0, 3)];
        assert_eq!(
            HierarchyMeta::from_categories(&input),
            HierarchyMeta { total_count: 2, max_level: 3 }
        );
        assert_eq!(HierarchyMeta::from_categories(&[]), HierarchyMeta::default());
    }
}
