//! Sizes, nested under one size chart.

use crate::catalog::common::Audit;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};

pub struct Sizes;

impl Resource for Sizes {
    const SEGMENT: &'static str = "sizes";
    const PARENT: Option<&'static str> = Some("size-charts");
    const SINGULAR: &'static str = "Size";
    const PLURAL: &'static str = "sizes";
    type List = Size;
    type Detail = SizeDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("value")
    }
}

pub type SizeStore = ResourceStore<Sizes>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub id: String,
    pub value: String,
    /// Measurement system id.
    pub measurement_system: String,
    /// Same size expressed in the base measurement system.
    #[serde(default)]
    pub base_value: String,
}

identified!(Size, title = value);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeDetail {
    #[serde(flatten)]
    pub base: Size,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(SizeDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct SizePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<String>,
}

impl SizePayload {
    pub fn new(
        value: impl Into<String>,
        measurement_system: impl Into<String>,
        base_value: impl Into<String>,
    ) -> Self {
        SizePayload {
            value: Some(value.into()),
            measurement_system: Some(measurement_system.into()),
            base_value: Some(base_value.into()),
        }
    }
}

impl Payload for SizePayload {}

impl ResourceStore<Sizes> {
    pub fn set_size_chart(&mut self, size_chart_id: impl Into<String>) {
        self.set_parent(size_chart_id);
    }

    pub fn size_chart_id(&self) -> Option<&str> {
        self.parent_id()
    }

    /// Forget the chart, the cached sizes and the query state.
    pub fn clear_state(&mut self) {
        self.clear_parent();
    }
}
