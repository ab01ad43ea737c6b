use crate::catalog::common::Audit;
use crate::error::ClientError;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct MeasurementSystems;

impl Resource for MeasurementSystems {
    const SEGMENT: &'static str = "measurement-systems";
    const SINGULAR: &'static str = "Measurement system";
    const PLURAL: &'static str = "measurement systems";
    type List = MeasurementSystem;
    type Detail = MeasurementSystemDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type MeasurementSystemStore = ResourceStore<MeasurementSystems>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSystem {
    pub id: String,
    pub name: String,
    pub is_base_system: bool,
}

identified!(MeasurementSystem, title = name);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSystemDetail {
    #[serde(flatten)]
    pub base: MeasurementSystem,
    pub site: String,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(MeasurementSystemDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct MeasurementSystemPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_base_system: Option<bool>,
}

impl MeasurementSystemPayload {
    pub fn new(name: impl Into<String>) -> Self {
        MeasurementSystemPayload {
            name: Some(name.into()),
            is_base_system: None,
        }
    }

    pub fn base_system(mut self, base: bool) -> Self {
        self.is_base_system = Some(base);
        self
    }
}

impl Payload for MeasurementSystemPayload {}

impl ResourceStore<MeasurementSystems> {
    pub async fn set_base_system(&mut self, id: &str, is_base_system: bool) -> Result<(), ClientError> {
        self.patch_local(id, &json!({ "is_base_system": is_base_system }), |row| {
            row.is_base_system = is_base_system
        })
        .await
    }

    pub async fn bulk_set_base_system<S: AsRef<str> + Sync>(
        &mut self,
        ids: &[S],
        is_base_system: bool,
    ) -> Result<(), ClientError> {
        self.bulk_patch_local(ids, &json!({ "is_base_system": is_base_system }), |row| {
            row.is_base_system = is_base_system
        })
        .await
    }
}
