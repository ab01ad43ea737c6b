//! Example consumer: a separate Rust project that uses catalog-admin-sdk as a dependency.
//!
//! Starts the in-process mock backend, signs in and walks a few catalog stores.
//! Run from repo root: `cargo run -p example-consumer`

use catalog_admin::catalog::{BrandPayload, Catalog, ServiceCategoryPayload, ServicePayload};
use catalog_admin::{ApiClient, Credentials, MockConfig, MockServer, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("catalog_admin=info")),
        )
        .init();

    let server = MockServer::start(MockConfig::default()).await?;
    let client = ApiClient::from_config(&server.client_config("demo-site"))?;
    let mut session = Session::new(client.clone());
    session.login(&Credentials::new("admin@example.com", "admin")).await?;

    let mut catalog = Catalog::new(&client);
    let brand = catalog.brands.create(&BrandPayload::new("Acme")).await?;
    let hair = catalog
        .service_categories
        .create(&ServiceCategoryPayload::new("Hair"))
        .await?;
    catalog
        .service_categories
        .create(&ServiceCategoryPayload::new("Colouring").under(&hair.base.id))
        .await?;
    catalog
        .services
        .create(
            &ServicePayload::new("Haircut", "<p>Short back and sides</p>")
                .price("25.00", None)
                .brand(&brand.base.id)
                .categories([hair.base.id.clone()]),
        )
        .await?;

    for option in catalog.service_categories.autocomplete("").await? {
        tracing::info!("{}", option.display_name);
    }
    for service in catalog.services.fetch(None).await? {
        tracing::info!(
            name = %service.name,
            brand = ?service.brand.as_ref().map(|b| b.name.as_str()),
            "service"
        );
    }
    tracing::info!(requests = server.state().requests().len(), "done");
    Ok(())
}
