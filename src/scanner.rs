// 📄 Record Scanner - Line-oriented fragment filter
//
// Extract files carry one candidate record per line. Only lines that hold a
// well-formed <ABR> element survive; everything else (transmission headers,
// trailers, truncated lines) is expected noise and is skipped without being
// counted or reported.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Record-root marker checked before attempting a structural parse.
const RECORD_ROOT: &str = "ABR";

/// One surviving candidate fragment, with the 1-indexed line it came from.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub line_number: usize,
    pub xml: String,
}

/// Streams candidate record fragments out of one extract file.
///
/// Bounded by file length, restartable by re-opening the file.
pub struct FragmentScanner<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
}

impl FragmentScanner<BufReader<File>> {
    /// Open an extract file for scanning.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> FragmentScanner<R> {
    pub fn new(reader: R) -> Self {
        FragmentScanner {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Cheap containment check, then a full structural parse. Both must pass
    /// for a line to count as a record fragment.
    fn is_record_fragment(line: &str) -> bool {
        if !line.contains("<ABR") {
            return false;
        }
        match roxmltree::Document::parse(line) {
            Ok(doc) => doc.root_element().has_tag_name(RECORD_ROOT),
            Err(_) => false,
        }
    }
}

impl<R: BufRead> Iterator for FragmentScanner<R> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        loop {
            // Unreadable lines (bad encoding mid-file) end the scan; partial
            // yield is fine since the file is reprocessed from scratch on retry.
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(_) => return None,
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if Self::is_record_fragment(trimmed) {
                return Some(Fragment {
                    line_number: self.line_number,
                    xml: trimmed.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(input: &str) -> Vec<Fragment> {
        FragmentScanner::new(Cursor::new(input.to_string())).collect()
    }

    #[test]
    fn test_yields_only_well_formed_records() {
        let input = "\
<Transmission>\n\
<ABR><ABN status=\"ACT\" ABNStatusFromDate=\"20000224\">11000016722</ABN></ABR>\n\
not xml at all\n\
<ABR><ABN>truncated\n\
<Other><ABN>99</ABN></Other>\n\
<ABR><ABN status=\"CAN\" ABNStatusFromDate=\"20100101\">51824753556</ABN></ABR>\n";

        let fragments = scan(input);
        assert_eq!(fragments.len(), 2, "only parseable <ABR> lines survive");
        assert_eq!(fragments[0].line_number, 2);
        assert_eq!(fragments[1].line_number, 6);
        assert!(fragments[0].xml.contains("11000016722"));
    }

    #[test]
    fn test_marker_without_valid_xml_is_skipped() {
        let fragments = scan("<ABR><ABN>unclosed\n<ABRupt>also no</ABRupt>\n");
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_leading_whitespace_is_tolerated() {
        let fragments = scan("   <ABR><ABN status=\"ACT\" ABNStatusFromDate=\"20000224\">1</ABN></ABR>\n");
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].xml.starts_with("<ABR"));
    }
}
