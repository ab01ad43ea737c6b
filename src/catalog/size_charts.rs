use crate::catalog::common::Audit;
use crate::catalog::product_types::ProductType;
use crate::http::Payload;
use crate::pagination::PaginationOptions;
use crate::resource::Resource;
use crate::store::ResourceStore;
use serde::{Deserialize, Serialize};

pub struct SizeCharts;

impl Resource for SizeCharts {
    const SEGMENT: &'static str = "size-charts";
    const SINGULAR: &'static str = "Size chart";
    const PLURAL: &'static str = "size charts";
    type List = SizeChart;
    type Detail = SizeChartDetail;

    fn pagination() -> PaginationOptions {
        PaginationOptions::sorted_by("name")
    }
}

pub type SizeChartStore = ResourceStore<SizeCharts>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeChart {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Expanded by the server; `None` if the product type was removed.
    #[serde(default)]
    pub product_type: Option<ProductType>,
}

identified!(SizeChart, title = name);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeChartDetail {
    #[serde(flatten)]
    pub base: SizeChart,
    #[serde(flatten)]
    pub audit: Audit,
}

identified!(SizeChartDetail, base);

#[derive(Clone, Debug, Default, Serialize)]
pub struct SizeChartPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product type id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

impl SizeChartPayload {
    pub fn new(name: impl Into<String>, product_type: impl Into<String>) -> Self {
        SizeChartPayload {
            name: Some(name.into()),
            description: None,
            product_type: Some(product_type.into()),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Payload for SizeChartPayload {}
