//! Shapes shared by several catalog records.

use crate::error::ClientError;
use crate::resource::Resource;
use crate::store::ResourceStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub email: String,
    pub role: String,
}

/// `{ id, name }` reference embedded in another record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Audit block present on detail records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default)]
    pub creator: Option<Creator>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Rows carrying an `is_published` flag.
pub trait Publishable {
    fn is_published(&self) -> bool;
    fn set_published_flag(&mut self, published: bool);
}

impl<R> ResourceStore<R>
where
    R: Resource,
    R::List: Publishable,
{
    /// PATCH `is_published` and update the cached row in place.
    pub async fn set_published(&mut self, id: &str, published: bool) -> Result<(), ClientError> {
        self.patch_local(id, &json!({ "is_published": published }), |row| {
            row.set_published_flag(published)
        })
        .await
    }

    pub async fn bulk_set_published<S: AsRef<str> + Sync>(
        &mut self,
        ids: &[S],
        published: bool,
    ) -> Result<(), ClientError> {
        self.bulk_patch_local(ids, &json!({ "is_published": published }), |row| {
            row.set_published_flag(published)
        })
        .await
    }
}
