// 🚚 Pipeline Driver - scan, normalize, dedupe, load, one run at a time
//
// A run walks every file in the input directory, folds surviving fragments
// into one run-level batch, deletes each consumed file, and finishes with a
// single purge-then-reload transaction. Fragment and file problems are
// contained and logged; only store failures abort the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::batch::{EntityCounts, RecordBatch};
use crate::error_log::ErrorLog;
use crate::loader;
use crate::normalizer::normalize;
use crate::scanner::FragmentScanner;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read input directory {}: {source}", .dir.display())]
    InputDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fatal store failure. The transaction has rolled back; `remaining`
    /// lists the source files still on disk for the next attempt.
    #[error("store write failed: {source}")]
    StoreWrite {
        #[source]
        source: rusqlite::Error,
        remaining: Vec<PathBuf>,
    },
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub counts: EntityCounts,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub fragments_normalized: usize,
    pub fragments_rejected: usize,
}

/// Run the full pipeline over `input_dir`, replacing the store's content.
///
/// Consumed files are deleted whether or not they yielded records; files
/// that cannot be read are logged, skipped, and left in place.
pub fn process(
    store: &mut Store,
    input_dir: &Path,
    error_log: &mut ErrorLog,
) -> Result<RunReport, PipelineError> {
    let files = list_files(input_dir).map_err(|source| PipelineError::InputDir {
        dir: input_dir.to_path_buf(),
        source,
    })?;
    info!(files = files.len(), dir = %input_dir.display(), "starting run");

    let tx = store
        .transaction()
        .map_err(|source| PipelineError::StoreWrite {
            source,
            remaining: files.clone(),
        })?;

    let mut batch = RecordBatch::new();
    let mut report = RunReport {
        counts: EntityCounts::default(),
        files_processed: 0,
        files_skipped: 0,
        fragments_normalized: 0,
        fragments_rejected: 0,
    };

    for path in &files {
        let scanner = match FragmentScanner::open(path) {
            Ok(scanner) => scanner,
            Err(err) => {
                warn!(file = %path.display(), %err, "skipping unreadable file");
                sink(error_log, &path.display().to_string(), &err.to_string());
                report.files_skipped += 1;
                continue;
            }
        };

        let mut file_fragments = 0usize;
        for fragment in scanner {
            match normalize(&fragment.xml) {
                Ok(set) => {
                    batch.push(set);
                    file_fragments += 1;
                }
                Err(err) => {
                    report.fragments_rejected += 1;
                    let context = format!("{}:{}", path.display(), fragment.line_number);
                    debug!(%context, %err, "fragment rejected");
                    sink(error_log, &context, &err.to_string());
                }
            }
        }
        report.fragments_normalized += file_fragments;
        batch.dedupe();

        // A file with zero records is still a legitimate, consumed input.
        if let Err(err) = fs::remove_file(path) {
            warn!(file = %path.display(), %err, "could not delete consumed file");
        }
        report.files_processed += 1;
        debug!(file = %path.display(), fragments = file_fragments, "file consumed");
    }

    report.counts =
        loader::load(&tx, &batch).map_err(|source| PipelineError::StoreWrite {
            source,
            remaining: list_files(input_dir).unwrap_or_default(),
        })?;
    tx.commit().map_err(|source| PipelineError::StoreWrite {
        source,
        remaining: list_files(input_dir).unwrap_or_default(),
    })?;

    info!(
        entities = report.counts.total(),
        files = report.files_processed,
        rejected = report.fragments_rejected,
        "run complete"
    );
    Ok(report)
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Sink failures must not take the run down with them.
fn sink(error_log: &mut ErrorLog, context: &str, detail: &str) {
    if let Err(err) = error_log.record(context, detail) {
        warn!(%err, "error sink write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use std::io::Write;

    const FULL_FRAGMENT: &str = r#"<ABR><ABN status="ACT" ABNStatusFromDate="20000224">11000016722</ABN><EntityType><EntityTypeInd>PUB</EntityTypeInd><EntityTypeText>Australian Public Company</EntityTypeText></EntityType><MainEntity><NonIndividualName type="MN"><NonIndividualNameText>EXAMPLE HOLDINGS LIMITED</NonIndividualNameText></NonIndividualName><BusinessAddress><AddressDetails><State>QLD</State><Postcode>4000</Postcode></AddressDetails></BusinessAddress></MainEntity><ASICNumber ASICNumberType="undetermined">000016722</ASICNumber><GST status="ACT" GSTStatusFromDate="20000701"/><OtherEntity><NonIndividualName type="TRD"><NonIndividualNameText>EXAMPLE TRADING</NonIndividualNameText></NonIndividualName></OtherEntity><OtherEntity><NonIndividualName type="TRD"><NonIndividualNameText>EXAMPLE TRADING</NonIndividualNameText></NonIndividualName></OtherEntity><OtherEntity><NonIndividualName type="OTN"><NonIndividualNameText>EXAMPLE OTHER</NonIndividualNameText></NonIndividualName></OtherEntity></ABR>"#;

    struct Fixture {
        store: Store,
        input: tempfile::TempDir,
        // held so the log's tempdir outlives the fixture
        _log_dir: tempfile::TempDir,
        log_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Store::open_in_memory().unwrap();
            store.setup().unwrap();
            let log_dir = tempfile::tempdir().unwrap();
            let log_path = log_dir.path().join("errors.log");
            Fixture {
                store,
                input: tempfile::tempdir().unwrap(),
                _log_dir: log_dir,
                log_path,
            }
        }

        fn write_file(&self, name: &str, lines: &[&str]) -> PathBuf {
            let path = self.input.path().join(name);
            let mut file = fs::File::create(&path).unwrap();
            for line in lines {
                writeln!(file, "{}", line).unwrap();
            }
            path
        }

        fn run(&mut self) -> Result<RunReport, PipelineError> {
            let mut log = ErrorLog::open(&self.log_path).unwrap();
            process(&mut self.store, self.input.path(), &mut log)
        }
    }

    #[test]
    fn test_end_to_end_single_fragment() {
        let mut fx = Fixture::new();
        let path = fx.write_file("extract_1.xml", &["<Transmission>", FULL_FRAGMENT, "noise"]);

        let report = fx.run().unwrap();

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.fragments_normalized, 1);
        assert_eq!(report.fragments_rejected, 0);
        assert_eq!(report.counts.abns, 1);
        assert_eq!(report.counts.main_entities, 1);
        assert_eq!(report.counts.legal_entities, 0);
        assert_eq!(report.counts.asic_numbers, 1);
        assert_eq!(report.counts.gst_statuses, 1);
        assert_eq!(report.counts.dgr_entries, 0);
        // Three other-name blocks, two identical: two distinct rows survive.
        assert_eq!(report.counts.other_entities, 2);
        assert!(!path.exists(), "consumed file is deleted");
    }

    #[test]
    fn test_file_with_no_valid_fragments_is_still_consumed() {
        let mut fx = Fixture::new();
        let path = fx.write_file("empty.xml", &["<Transmission>", "garbage", ""]);

        let report = fx.run().unwrap();

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.counts.total(), 0);
        assert!(!path.exists(), "empty result still consumes the file");
    }

    #[test]
    fn test_rejected_fragment_is_logged_and_contained() {
        let mut fx = Fixture::new();
        // Scanner passes this line (well-formed <ABR>), normalizer rejects it.
        let missing_id = r#"<ABR><EntityType><EntityTypeInd>IND</EntityTypeInd><EntityTypeText>Individual</EntityTypeText></EntityType></ABR>"#;
        fx.write_file("mixed.xml", &[missing_id, FULL_FRAGMENT]);

        let report = fx.run().unwrap();

        assert_eq!(report.fragments_rejected, 1);
        assert_eq!(report.fragments_normalized, 1);
        assert_eq!(report.counts.abns, 1, "rejection does not stop the file");

        let log = fs::read_to_string(&fx.log_path).unwrap();
        assert!(log.contains("mixed.xml:1"));
        assert!(log.contains("required field missing"));
    }

    #[test]
    fn test_duplicate_fragments_across_files_collapse() {
        let mut fx = Fixture::new();
        fx.write_file("part_a.xml", &[FULL_FRAGMENT]);
        fx.write_file("part_b.xml", &[FULL_FRAGMENT]);

        let report = fx.run().unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.fragments_normalized, 2);
        assert_eq!(report.counts.abns, 1, "same record in both files loads once");
        assert_eq!(report.counts.other_entities, 2);
    }

    #[test]
    fn test_rerun_over_same_input_converges() {
        let mut fx = Fixture::new();
        fx.write_file("extract.xml", &[FULL_FRAGMENT]);
        let first = fx.run().unwrap();

        // The first run consumed the input; republish it and run again.
        fx.write_file("extract.xml", &[FULL_FRAGMENT]);
        let second = fx.run().unwrap();

        assert_eq!(first.counts, second.counts);
        assert_eq!(fx.store.count(EntityKind::Abn).unwrap(), 1);
        assert_eq!(fx.store.count(EntityKind::OtherEntity).unwrap(), 2);
    }

    #[test]
    fn test_missing_input_directory_fails() {
        let mut fx = Fixture::new();
        let gone = fx.input.path().join("does-not-exist");
        let mut log = ErrorLog::open(&fx.log_path).unwrap();

        let err = process(&mut fx.store, &gone, &mut log).unwrap_err();
        assert!(matches!(err, PipelineError::InputDir { .. }));
    }

    #[test]
    fn test_empty_directory_yields_empty_store() {
        let mut fx = Fixture::new();

        // Seed the store, then run over an empty directory: purge-then-reload
        // with nothing to reload leaves it empty.
        fx.write_file("seed.xml", &[FULL_FRAGMENT]);
        fx.run().unwrap();
        assert_eq!(fx.store.count(EntityKind::Abn).unwrap(), 1);

        let report = fx.run().unwrap();
        assert_eq!(report.files_processed, 0);
        assert_eq!(fx.store.count(EntityKind::Abn).unwrap(), 0);
    }
}
