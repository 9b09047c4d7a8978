// 🏢 Entity Models - The seven relational shapes of a business record
//
// One ABN row owns up to one of each single-cardinality dependent
// (main_entity, legal_entity, asic_number, gst) and any number of
// dgr / other_entity rows. Every dependent carries the owning ABN.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// ENTITY KIND
// ============================================================================

/// The seven persisted entity kinds, in parent-before-children order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Abn,
    MainEntity,
    LegalEntity,
    AsicNumber,
    Gst,
    Dgr,
    OtherEntity,
}

impl EntityKind {
    /// All kinds, parent first. Inserts follow this order; purges reverse it.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Abn,
        EntityKind::MainEntity,
        EntityKind::LegalEntity,
        EntityKind::AsicNumber,
        EntityKind::Gst,
        EntityKind::Dgr,
        EntityKind::OtherEntity,
    ];

    /// Table name in the store
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Abn => "abn",
            EntityKind::MainEntity => "main_entity",
            EntityKind::LegalEntity => "legal_entity",
            EntityKind::AsicNumber => "asic_number",
            EntityKind::Gst => "gst",
            EntityKind::Dgr => "dgr",
            EntityKind::OtherEntity => "other_entity",
        }
    }
}

// ============================================================================
// BLANK CHECK
// ============================================================================

/// Degenerate-row detection: an entry whose every field is empty or zero
/// is parse residue and is dropped before persisting.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Top-level business record, keyed by the ABN itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Abn {
    pub abn: i64,
    pub status: String,
    pub status_from_date: NaiveDate,
    pub entity_type_indicator: String,
    pub entity_type_text: String,
}

impl Blank for Abn {
    fn is_blank(&self) -> bool {
        self.abn == 0
            && self.status.is_empty()
            && self.entity_type_indicator.is_empty()
            && self.entity_type_text.is_empty()
    }
}

/// Registered main (non-individual) entity, 0 or 1 per record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MainEntity {
    pub abn: i64,
    pub entity_type: String,
    pub name: String,
    pub state: String,
    pub postcode: i32,
}

impl Blank for MainEntity {
    fn is_blank(&self) -> bool {
        self.abn == 0
            && self.entity_type.is_empty()
            && self.name.is_empty()
            && self.state.is_empty()
            && self.postcode == 0
    }
}

/// Registered individual, 0 or 1 per record. The name is composed from
/// the given and family name parts at normalization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegalEntity {
    pub abn: i64,
    pub entity_type: String,
    pub name: String,
    pub state: String,
    pub postcode: i32,
}

impl Blank for LegalEntity {
    fn is_blank(&self) -> bool {
        self.abn == 0
            && self.entity_type.is_empty()
            && self.name.is_empty()
            && self.state.is_empty()
            && self.postcode == 0
    }
}

/// ASIC registration number, 0 or 1 per record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AsicNumber {
    pub abn: i64,
    pub number: String,
    pub asic_type: String,
}

impl Blank for AsicNumber {
    fn is_blank(&self) -> bool {
        self.abn == 0 && self.number.is_empty() && self.asic_type.is_empty()
    }
}

/// GST registration status, 0 or 1 per record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gst {
    pub abn: i64,
    pub status: String,
    pub status_from_date: Option<NaiveDate>,
}

impl Blank for Gst {
    fn is_blank(&self) -> bool {
        self.abn == 0 && self.status.is_empty() && self.status_from_date.is_none()
    }
}

/// Deductible gift recipient entry, 0..N per record.
/// Natural key: (abn, status_from_date, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dgr {
    pub abn: i64,
    pub status_from_date: Option<NaiveDate>,
    pub name: String,
}

impl Blank for Dgr {
    fn is_blank(&self) -> bool {
        self.abn == 0 && self.status_from_date.is_none() && self.name.is_empty()
    }
}

/// Other registered name (trading names etc.), 0..N per record.
/// Natural key: (abn, entity_type, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtherEntity {
    pub abn: i64,
    pub entity_type: String,
    pub name: String,
}

impl Blank for OtherEntity {
    fn is_blank(&self) -> bool {
        self.abn == 0 && self.entity_type.is_empty() && self.name.is_empty()
    }
}
