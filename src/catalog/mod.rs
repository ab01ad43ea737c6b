//! Typed catalog collections.

/// `Identified` for a row with `id` (and optionally a title field), or for a
/// detail record that wraps its row in `base`.
macro_rules! identified {
    ($ty:ty) => {
        impl $crate::resource::Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
    ($ty:ty, title = $field:ident) => {
        impl $crate::resource::Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn title(&self) -> Option<&str> {
                Some(&self.$field)
            }
        }
    };
    ($ty:ty, base) => {
        impl $crate::resource::Identified for $ty {
            fn id(&self) -> &str {
                $crate::resource::Identified::id(&self.base)
            }

            fn title(&self) -> Option<&str> {
                $crate::resource::Identified::title(&self.base)
            }
        }
    };
}

pub mod brands;
pub mod common;
pub mod measurement_systems;
pub mod pages;
pub mod product_types;
pub mod service_attributes;
pub mod service_categories;
pub mod service_variants;
pub mod services;
pub mod size_charts;
pub mod sizes;

pub use brands::{Brand, BrandDetail, BrandPayload, BrandStore, Brands};
pub use common::{Audit, Creator, NamedRef, Publishable};
pub use measurement_systems::{
    MeasurementSystem, MeasurementSystemDetail, MeasurementSystemPayload, MeasurementSystemStore,
    MeasurementSystems,
};
pub use pages::{Page, PageDetail, PageMetaTag, PagePayload, PageStore, PageType, Pages};
pub use product_types::{ProductType, ProductTypeDetail, ProductTypePayload, ProductTypeStore, ProductTypes};
pub use service_attributes::{
    AttributeType, AttributeTypeDetail, AttributeTypePayload, AttributeTypeStore, AttributeTypes,
    AttributeValue, AttributeValueDetail, AttributeValuePayload, AttributeValueStore, AttributeValues,
    ServiceAttribute, ServiceAttributeStore, ServiceAttributes,
};
pub use service_categories::{
    CategoryOption, CategoryParent, HierarchyItem, HierarchyMeta, ServiceCategories, ServiceCategory,
    ServiceCategoryDetail, ServiceCategoryPayload, ServiceCategoryStore,
};
pub use service_variants::{ServiceVariant, ServiceVariantPayload, ServiceVariantStore, ServiceVariants};
pub use services::{
    AttachmentPayload, AttachmentRef, Service, ServiceAttachment, ServiceAttachmentStore, ServiceAttachments,
    ServiceDetail, ServicePayload, ServiceStore, Services,
};
pub use size_charts::{SizeChart, SizeChartDetail, SizeChartPayload, SizeChartStore, SizeCharts};
pub use sizes::{Size, SizeDetail, SizePayload, SizeStore, Sizes};

use crate::http::ApiClient;
use crate::store::ResourceStore;

/// One store per collection, all sharing a client.
pub struct Catalog {
    pub brands: BrandStore,
    pub product_types: ProductTypeStore,
    pub measurement_systems: MeasurementSystemStore,
    pub size_charts: SizeChartStore,
    pub sizes: SizeStore,
    pub service_categories: ServiceCategoryStore,
    pub attribute_types: AttributeTypeStore,
    pub attribute_values: AttributeValueStore,
    pub service_attributes: ServiceAttributeStore,
    pub services: ServiceStore,
    pub service_attachments: ServiceAttachmentStore,
    pub service_variants: ServiceVariantStore,
    pub pages: PageStore,
}

impl Catalog {
    pub fn new(client: &ApiClient) -> Self {
        Catalog {
            brands: ResourceStore::new(client.clone()),
            product_types: ResourceStore::new(client.clone()),
            measurement_systems: ResourceStore::new(client.clone()),
            size_charts: ResourceStore::new(client.clone()),
            sizes: ResourceStore::new(client.clone()),
            service_categories: ServiceCategoryStore::new(client.clone()),
            attribute_types: ResourceStore::new(client.clone()),
            attribute_values: ResourceStore::new(client.clone()),
            service_attributes: ResourceStore::new(client.clone()),
            services: ResourceStore::new(client.clone()),
            service_attachments: ResourceStore::new(client.clone()),
            service_variants: ResourceStore::new(client.clone()),
            pages: ResourceStore::new(client.clone()),
        }
    }
}
