pub mod builtin;
pub mod remote;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::CatalogData;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<CatalogData>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOrigin {
    Remote,
    Builtin,
    BuiltinFallback,
}

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub data: CatalogData,
    pub origin: CatalogOrigin,
}

/// Reads reference data from `source`. A source that cannot be reached, or
/// that serves an empty decoration list, is replaced by the built-in list so
/// bookings keep flowing in degraded mode.
pub async fn load(source: &dyn CatalogSource) -> CatalogSnapshot {
    match source.fetch().await {
        Ok(data) if !data.decorations.is_empty() => CatalogSnapshot {
            data,
            origin: if source.name() == builtin::SOURCE_NAME {
                CatalogOrigin::Builtin
            } else {
                CatalogOrigin::Remote
            },
        },
        Ok(_) => {
            tracing::warn!(
                source = source.name(),
                catalog_source = "builtin_fallback",
                "catalog source returned no decorations, using built-in reference data"
            );
            fallback()
        }
        Err(e) => {
            tracing::warn!(
                source = source.name(),
                catalog_source = "builtin_fallback",
                error = %e,
                "catalog unavailable, using built-in reference data"
            );
            fallback()
        }
    }
}

fn fallback() -> CatalogSnapshot {
    CatalogSnapshot {
        data: builtin::reference_data(),
        origin: CatalogOrigin::BuiltinFallback,
    }
}
