use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Category, Credential, IntegrationCategory, IntegrationDescriptor, Integrations};
use crate::services::catalog::ProviderCatalog;

/// Groups credentials under the catalog. Credentials whose type is not in the
/// catalog are ignored; descriptor order follows the catalog.
pub fn aggregate(catalog: &ProviderCatalog, credentials: &[Credential]) -> Integrations {
    let mut by_type: HashMap<&str, Vec<i64>> = HashMap::new();
    for credential in credentials {
        by_type
            .entry(credential.provider_type.as_str())
            .or_default()
            .push(credential.id);
    }

    let build = |category: Category| {
        let items = catalog
            .in_category(category)
            .map(|entry| IntegrationDescriptor {
                title: entry.title.to_string(),
                provider_type: entry.provider_type.to_string(),
                description: entry.description.to_string(),
                image_src: entry.image_src.to_string(),
                credential_ids: by_type.get(entry.provider_type).cloned().unwrap_or_default(),
                installed: entry.installed,
            })
            .collect();
        IntegrationCategory::from_items(items)
    };

    Integrations {
        conferencing: build(Category::Conferencing),
        payment: build(Category::Payment),
        calendar: build(Category::Calendar),
    }
}

/// Loads the viewer's credentials and aggregates them. Any storage failure
/// fails the whole aggregation.
pub fn fetch_integrations(
    conn: &Connection,
    catalog: &ProviderCatalog,
    user_id: i64,
) -> anyhow::Result<Integrations> {
    let credentials = queries::list_credentials(conn, user_id)?;
    Ok(aggregate(catalog, &credentials))
}
