// 💾 Batch Loader - Purge-then-reload of the accumulated run batch
//
// One call per run: delete all prior rows, then one bulk insert per entity
// kind, parent before children, all inside the caller's transaction. The
// caller commits; any failure here propagates and the dropped transaction
// rolls the store back to its pre-run state.

use rusqlite::Transaction;

use crate::batch::{EntityCounts, RecordBatch};
use crate::store;

/// Replace the store's entire content with `batch`.
///
/// Returns the per-kind row counts that were written. Does not commit.
pub fn load(tx: &Transaction, batch: &RecordBatch) -> rusqlite::Result<EntityCounts> {
    store::purge_all(tx)?;

    Ok(EntityCounts {
        abns: store::insert_abns(tx, &batch.abns)?,
        main_entities: store::insert_main_entities(tx, &batch.main_entities)?,
        legal_entities: store::insert_legal_entities(tx, &batch.legal_entities)?,
        asic_numbers: store::insert_asic_numbers(tx, &batch.asic_numbers)?,
        gst_statuses: store::insert_gst_statuses(tx, &batch.gst_statuses)?,
        dgr_entries: store::insert_dgr_entries(tx, &batch.dgr_entries)?,
        other_entities: store::insert_other_entities(tx, &batch.other_entities)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use crate::normalizer::normalize;
    use crate::store::Store;

    const FRAGMENT: &str = r#"<ABR><ABN status="ACT" ABNStatusFromDate="20000224">11000016722</ABN><EntityType><EntityTypeInd>PUB</EntityTypeInd><EntityTypeText>Company</EntityTypeText></EntityType><MainEntity><NonIndividualName type="MN"><NonIndividualNameText>EXAMPLE LTD</NonIndividualNameText></NonIndividualName><BusinessAddress><AddressDetails><State>NSW</State><Postcode>2000</Postcode></AddressDetails></BusinessAddress></MainEntity></ABR>"#;

    fn batch_of(fragments: &[&str]) -> RecordBatch {
        let mut batch = RecordBatch::new();
        for fragment in fragments {
            batch.push(normalize(fragment).unwrap());
        }
        batch.dedupe();
        batch
    }

    #[test]
    fn test_load_reports_per_kind_counts() {
        let mut store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        let batch = batch_of(&[FRAGMENT]);
        let tx = store.transaction().unwrap();
        let counts = load(&tx, &batch).unwrap();
        tx.commit().unwrap();

        assert_eq!(counts.abns, 1);
        assert_eq!(counts.main_entities, 1);
        assert_eq!(counts.total(), 2);
        assert_eq!(store.count(EntityKind::Abn).unwrap(), 1);
        assert_eq!(store.count(EntityKind::MainEntity).unwrap(), 1);
    }

    #[test]
    fn test_load_replaces_prior_content() {
        let mut store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        let tx = store.transaction().unwrap();
        load(&tx, &batch_of(&[FRAGMENT])).unwrap();
        tx.commit().unwrap();

        // Second run with a different record: old rows must be gone.
        let other = FRAGMENT.replace("11000016722", "51824753556");
        let tx = store.transaction().unwrap();
        load(&tx, &batch_of(&[other.as_str()])).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.count(EntityKind::Abn).unwrap(), 1);
        assert_eq!(store.count(EntityKind::MainEntity).unwrap(), 1);
    }

    #[test]
    fn test_failed_load_leaves_prior_content_untouched() {
        let mut store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        let tx = store.transaction().unwrap();
        load(&tx, &batch_of(&[FRAGMENT])).unwrap();
        tx.commit().unwrap();

        // Two distinct fragments sharing one ABN: primary key violation
        // partway through the insert sequence.
        let conflicting = FRAGMENT.replace("EXAMPLE LTD", "CHANGED LTD");
        let mut batch = batch_of(&[FRAGMENT]);
        batch.push(normalize(&conflicting).unwrap());

        {
            let tx = store.transaction().unwrap();
            assert!(load(&tx, &batch).is_err());
            // dropped without commit -> rollback
        }

        assert_eq!(store.count(EntityKind::Abn).unwrap(), 1, "prior row survives");
        assert_eq!(store.count(EntityKind::MainEntity).unwrap(), 1);
    }
}
