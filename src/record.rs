//! Enriched account holder record

use crate::registry::Identifier;
use crate::upstream::{AccountHolder, LegalEntity};
use serde::{Deserialize, Serialize};

/// Account holder fields combined with legal entity data
///
/// Records are replaced wholesale on refetch and never mutated in place.
/// The enrichment fields stay `None` when the holder has no linked legal
/// entity or the enrichment call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    /// The identifier this record was fetched for
    pub id: Identifier,
    pub account_holder_id: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,

    pub legal_entity_id: Option<String>,
    pub legal_name: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub country: Option<String>,
}

impl EnrichedRecord {
    /// Record carrying only the primary fields
    pub fn from_account_holder(id: impl Into<Identifier>, holder: &AccountHolder) -> Self {
        Self {
            id: id.into(),
            account_holder_id: holder.id.clone(),
            reference: holder.reference.clone(),
            description: holder.description.clone(),
            status: holder.status.map(|s| s.as_str().to_string()),
            legal_entity_id: None,
            legal_name: None,
            entity_type: None,
            country: None,
        }
    }

    /// Fill the enrichment fields from a legal entity
    pub fn enriched_with(self, entity: &LegalEntity) -> Self {
        Self {
            legal_entity_id: Some(entity.id.clone()),
            legal_name: entity.display_name(),
            entity_type: entity.entity_type.map(|t| t.as_str().to_string()),
            country: entity.country(),
            ..self
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.legal_entity_id.is_some()
    }
}
