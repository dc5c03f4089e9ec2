//! List the templates known to the registry, and the services implementing one of them.
//!
//! Reads the client credentials from `REGISTRY_CLIENT_ID`, `REGISTRY_CLIENT_SECRET`
//! and `REGISTRY_TOKEN_URL`.

use eyre::WrapErr as _;
use service_registry::{ServiceRegistry, ServiceRegistryClient};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let token_url = std::env::var("REGISTRY_TOKEN_URL")
        .wrap_err("REGISTRY_TOKEN_URL is set")?
        .parse()?;

    let client = ServiceRegistryClient::new(
        std::env::var("REGISTRY_CLIENT_ID").wrap_err("REGISTRY_CLIENT_ID is set")?,
        std::env::var("REGISTRY_CLIENT_SECRET").wrap_err("REGISTRY_CLIENT_SECRET is set")?,
        token_url,
    );

    let templates = client.get_service_templates().await?;
    println!("{}", serde_json::to_string_pretty(&templates)?);

    if let Some(template) = std::env::args().nth(1) {
        let services = client.get_services_implementing_template(&template).await?;
        println!("{}", serde_json::to_string_pretty(&services)?);
    }

    Ok(())
}
