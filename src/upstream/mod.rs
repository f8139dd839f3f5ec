//! Contracts for the two upstream services
//!
//! The account holder service is the primary source of records. The legal
//! entity service enriches them. Both are remote and slow; this crate only
//! depends on the traits below and never on a concrete client.

pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle status reported for an account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountHolderStatus {
    Active,
    Inactive,
    Suspended,
    Closed,
}

impl AccountHolderStatus {
    /// Wire value of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountHolderStatus::Active => "active",
            AccountHolderStatus::Inactive => "inactive",
            AccountHolderStatus::Suspended => "suspended",
            AccountHolderStatus::Closed => "closed",
        }
    }
}

/// Account holder as returned by the primary service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolder {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub status: Option<AccountHolderStatus>,
    /// Linked legal entity, if any
    pub legal_entity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegalEntityType {
    Individual,
    Organization,
    SoleProprietorship,
    Trust,
    UnincorporatedPartnership,
}

impl LegalEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalEntityType::Individual => "individual",
            LegalEntityType::Organization => "organization",
            LegalEntityType::SoleProprietorship => "soleProprietorship",
            LegalEntityType::Trust => "trust",
            LegalEntityType::UnincorporatedPartnership => "unincorporatedPartnership",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    pub fn in_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    pub name: Name,
    pub residential_address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub legal_name: String,
    pub registered_address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoleProprietorship {
    pub name: String,
}

/// Legal entity as returned by the enrichment service
///
/// At most one of `individual`, `organization` and `sole_proprietorship`
/// is normally populated, but nothing here relies on that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: Option<LegalEntityType>,
    pub individual: Option<Individual>,
    pub organization: Option<Organization>,
    pub sole_proprietorship: Option<SoleProprietorship>,
}

impl LegalEntity {
    /// Display name: individual > organization > sole proprietorship
    pub fn display_name(&self) -> Option<String> {
        if let Some(individual) = &self.individual {
            return Some(format!(
                "{} {}",
                individual.name.first_name, individual.name.last_name
            ));
        }
        if let Some(organization) = &self.organization {
            return Some(organization.legal_name.clone());
        }
        self.sole_proprietorship.as_ref().map(|sp| sp.name.clone())
    }

    /// Country of the individual's residence, else of the organization's
    /// registered address
    pub fn country(&self) -> Option<String> {
        let residential = self
            .individual
            .as_ref()
            .and_then(|i| i.residential_address.as_ref());
        let registered = self
            .organization
            .as_ref()
            .and_then(|o| o.registered_address.as_ref());

        residential
            .or(registered)
            .and_then(|address| address.country.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstrument {
    pub id: String,
    pub balance_account_id: String,
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
    pub status: Option<String>,
    pub issuing_country_code: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// One page of payment instruments for a balance account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstrumentPage {
    pub payment_instruments: Vec<PaymentInstrument>,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Primary service: account holders and their balance instruments
#[async_trait]
pub trait AccountHolderService: Send + Sync {
    /// `Ok(None)` when the service has no such account holder
    async fn get_account_holder(&self, id: &str) -> Result<Option<AccountHolder>>;

    async fn get_payment_instruments(&self, balance_account_id: &str)
        -> Result<PaymentInstrumentPage>;
}

/// Secondary service used for enrichment
#[async_trait]
pub trait LegalEntityService: Send + Sync {
    /// Fails when the legal entity does not exist or the service is unreachable
    async fn get_legal_entity(&self, id: &str) -> Result<LegalEntity>;
}
