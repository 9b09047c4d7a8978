// 📦 Record Batch - Run-level accumulation of normalized entities
//
// Entities accumulate across every file of a run and are written in one
// bulk load at the end. Nothing here touches the store.

use std::mem;

use serde::Serialize;

use crate::dedup::dedupe;
use crate::entities::{Abn, AsicNumber, Dgr, Gst, LegalEntity, MainEntity, OtherEntity};
use crate::normalizer::RecordSet;

/// Per-kind vectors accumulated over one run.
#[derive(Debug, Default)]
pub struct RecordBatch {
    pub abns: Vec<Abn>,
    pub main_entities: Vec<MainEntity>,
    pub legal_entities: Vec<LegalEntity>,
    pub asic_numbers: Vec<AsicNumber>,
    pub gst_statuses: Vec<Gst>,
    pub dgr_entries: Vec<Dgr>,
    pub other_entities: Vec<OtherEntity>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment's record set into the batch.
    pub fn push(&mut self, set: RecordSet) {
        self.abns.push(set.abn);
        self.main_entities.extend(set.main_entity);
        self.legal_entities.extend(set.legal_entity);
        self.asic_numbers.extend(set.asic_number);
        self.gst_statuses.extend(set.gst);
        self.dgr_entries.extend(set.dgr);
        self.other_entities.extend(set.other_entities);
    }

    /// Collapse exact repeats and drop all-blank rows, across every kind.
    /// Safe to call repeatedly as files are folded in.
    pub fn dedupe(&mut self) {
        self.abns = dedupe(mem::take(&mut self.abns));
        self.main_entities = dedupe(mem::take(&mut self.main_entities));
        self.legal_entities = dedupe(mem::take(&mut self.legal_entities));
        self.asic_numbers = dedupe(mem::take(&mut self.asic_numbers));
        self.gst_statuses = dedupe(mem::take(&mut self.gst_statuses));
        self.dgr_entries = dedupe(mem::take(&mut self.dgr_entries));
        self.other_entities = dedupe(mem::take(&mut self.other_entities));
    }

    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            abns: self.abns.len(),
            main_entities: self.main_entities.len(),
            legal_entities: self.legal_entities.len(),
            asic_numbers: self.asic_numbers.len(),
            gst_statuses: self.gst_statuses.len(),
            dgr_entries: self.dgr_entries.len(),
            other_entities: self.other_entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }
}

/// Per-kind row tallies, reported after a load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub abns: usize,
    pub main_entities: usize,
    pub legal_entities: usize,
    pub asic_numbers: usize,
    pub gst_statuses: usize,
    pub dgr_entries: usize,
    pub other_entities: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.abns
            + self.main_entities
            + self.legal_entities
            + self.asic_numbers
            + self.gst_statuses
            + self.dgr_entries
            + self.other_entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    const FRAGMENT: &str = r#"<ABR><ABN status="ACT" ABNStatusFromDate="20000224">123</ABN><EntityType><EntityTypeInd>PUB</EntityTypeInd><EntityTypeText>Company</EntityTypeText></EntityType><GST status="ACT" GSTStatusFromDate="20000701"/><OtherEntity><NonIndividualName type="TRD"><NonIndividualNameText>NAME</NonIndividualNameText></NonIndividualName></OtherEntity></ABR>"#;

    #[test]
    fn test_push_distributes_entities_by_kind() {
        let mut batch = RecordBatch::new();
        batch.push(normalize(FRAGMENT).unwrap());

        let counts = batch.counts();
        assert_eq!(counts.abns, 1);
        assert_eq!(counts.main_entities, 0);
        assert_eq!(counts.gst_statuses, 1);
        assert_eq!(counts.other_entities, 1);
        assert_eq!(counts.total(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_dedupe_collapses_repeated_fragments() {
        let mut batch = RecordBatch::new();
        batch.push(normalize(FRAGMENT).unwrap());
        batch.push(normalize(FRAGMENT).unwrap());
        assert_eq!(batch.counts().total(), 6);

        batch.dedupe();
        assert_eq!(batch.counts().total(), 3, "full repeat collapses entirely");
    }

    #[test]
    fn test_empty_batch() {
        let batch = RecordBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.counts().total(), 0);
    }
}
