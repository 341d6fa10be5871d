//! ADIF decoder for exported reception reports.
//!
//! ADIF is a tag-delimited text format: every field is written as
//! `<NAME:LEN[:TYPE]>value`, an optional header ends with `<EOH>` and each
//! record ends with `<EOR>`. Exports from spotting networks are not always
//! well-formed, so the decoder is forgiving: tag names are case-insensitive,
//! fields may appear in any order or not at all, and a length that overruns
//! the content or the end of the record falls back to reading up to the next
//! tag.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::DecodeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One logged contact as a loosely typed map of upper-cased field names to
/// trimmed, non-empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    /// Looks up a field by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Inserts a field unless one with the same name is already present.
    fn insert_first(&mut self, name: String, value: String) {
        self.fields.entry(name).or_insert(value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::default();
        for (k, v) in iter {
            record.insert_first(k.into().to_ascii_uppercase(), v.into());
        }
        record
    }
}

/// A decoded ADIF file. Holds the (possibly inflated) content and hands out
/// fresh record iterators on demand, so iteration can be restarted.
#[derive(Debug)]
pub struct AdifDocument<'a> {
    content: Cow<'a, [u8]>,
}

impl AdifDocument<'_> {
    /// Iterates over the records in file order, skipping the header.
    pub fn records(&self) -> Records<'_> {
        Records {
            content: &self.content,
            pos: 0,
        }
    }

    /// Fields declared before `<EOH>`, empty when the file has no header.
    pub fn header(&self) -> RawRecord {
        let mut header = RawRecord::default();
        let mut pos = 0;
        while let Some(tag) = scan_tag(&self.content, pos) {
            match tag.name.as_str() {
                "EOH" => return header,
                "EOR" => return RawRecord::default(),
                _ => {
                    let (value, next) = read_value(&self.content, tag.value_start, tag.length);
                    if let Some(value) = clean_value(value) {
                        header.insert_first(tag.name, value);
                    }
                    pos = next;
                }
            }
        }
        RawRecord::default()
    }
}

/// Decodes raw ADIF bytes, inflating gzip content first.
///
/// # Errors
///
/// Returns [`DecodeError::NoRecordDelimiter`] if the content has no `<EOR>`
/// or `<EOH>` tag at all, and [`DecodeError::Gzip`] if gzip content is
/// corrupt. A well-formed file without records is not an error.
pub fn parse_adif(bytes: &[u8]) -> Result<AdifDocument<'_>, DecodeError> {
    let content = if bytes.starts_with(&GZIP_MAGIC) {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut inflated)?;
        debug!(
            compressed = bytes.len(),
            inflated = inflated.len(),
            "Inflated gzip ADIF content"
        );
        Cow::Owned(inflated)
    } else {
        Cow::Borrowed(bytes)
    };

    if !has_record_delimiter(&content) {
        return Err(DecodeError::NoRecordDelimiter);
    }

    Ok(AdifDocument { content })
}

/// Lazy iterator over the records of an [`AdifDocument`].
pub struct Records<'a> {
    content: &'a [u8],
    pos: usize,
}

impl Iterator for Records<'_> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        let mut record = RawRecord::default();

        loop {
            let Some(tag) = scan_tag(self.content, self.pos) else {
                // Fields after the last <EOR> still form a record.
                self.pos = self.content.len();
                return (!record.is_empty()).then_some(record);
            };

            match tag.name.as_str() {
                "EOR" => {
                    self.pos = tag.value_start;
                    if !record.is_empty() {
                        return Some(record);
                    }
                }
                "EOH" => {
                    // Everything so far was header.
                    self.pos = tag.value_start;
                    record = RawRecord::default();
                }
                _ => {
                    let (value, next) = read_value(self.content, tag.value_start, tag.length);
                    self.pos = next;
                    if let Some(value) = clean_value(value) {
                        record.insert_first(tag.name, value);
                    }
                }
            }
        }
    }
}

struct Tag {
    name: String,
    length: Option<usize>,
    /// Offset just past the closing `>`.
    value_start: usize,
}

/// Finds the next `<...>` tag at or after `from`.
fn scan_tag(content: &[u8], from: usize) -> Option<Tag> {
    let mut pos = from;
    loop {
        let open = pos + content.get(pos..)?.iter().position(|&b| b == b'<')?;
        let close = open + 1 + content[open + 1..].iter().position(|&b| b == b'>')?;
        let inner = String::from_utf8_lossy(&content[open + 1..close]);

        let mut parts = inner.split(':');
        let name = parts.next().unwrap_or_default().trim().to_ascii_uppercase();

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            pos = open + 1;
            continue;
        }

        let length = parts.next().and_then(|l| l.trim().parse::<usize>().ok());

        return Some(Tag {
            name,
            length,
            value_start: close + 1,
        });
    }
}

/// Reads a field value, honouring the declared length when it fits and does
/// not swallow a record or header delimiter; otherwise reads up to the next
/// `<`. A `<` inside a correctly sized value is kept.
fn read_value(content: &[u8], start: usize, length: Option<usize>) -> (&[u8], usize) {
    if let Some(end) = length.and_then(|len| start.checked_add(len)) {
        if let Some(value) = content.get(start..end) {
            if !starts_delimiter(content, start, end) {
                return (value, end);
            }
        }
    }

    let end = content[start..]
        .iter()
        .position(|&b| b == b'<')
        .map_or(content.len(), |p| start + p);
    (&content[start..end], end)
}

/// Whether an `<EOR>` or `<EOH>` tag begins anywhere in `start..end`, even
/// if it runs past `end`.
fn starts_delimiter(content: &[u8], start: usize, end: usize) -> bool {
    let window_end = end.saturating_add(4).min(content.len());
    content[start..window_end].windows(5).any(|w| {
        w.eq_ignore_ascii_case(b"<EOR>") || w.eq_ignore_ascii_case(b"<EOH>")
    })
}

fn clean_value(value: &[u8]) -> Option<String> {
    let value = String::from_utf8_lossy(value);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn has_record_delimiter(content: &[u8]) -> bool {
    let mut pos = 0;
    while let Some(tag) = scan_tag(content, pos) {
        if tag.name == "EOR" || tag.name == "EOH" {
            return true;
        }
        pos = tag.value_start;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "PSK Reporter export\n\
        <ADIF_VER:5>3.1.0\n<PROGRAMID:12>PSKReporter\n<EOH>\n\
        <CALL:5>K1ABC <GRIDSQUARE:4>FN42 <FREQ:9>14.074123 <APP_PSKREP_SNR:3>-12 <eor>\n\
        <call:5>DL1XY <freq:8>7.074000 <app_pskrep_snr:2>-3 <EOR>\n";

    #[test]
    fn test_parse_sample_records() {
        let doc = parse_adif(SAMPLE.as_bytes()).unwrap();
        let records: Vec<_> = doc.records().collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("CALL"), Some("K1ABC"));
        assert_eq!(records[0].get("gridsquare"), Some("FN42"));
        assert_eq!(records[0].get("APP_PSKREP_SNR"), Some("-12"));
        assert_eq!(records[1].get("CALL"), Some("DL1XY"));
        assert_eq!(records[1].get("GRIDSQUARE"), None);
    }

    #[test]
    fn test_header_is_not_a_record() {
        let doc = parse_adif(SAMPLE.as_bytes()).unwrap();
        let header = doc.header();

        assert_eq!(header.get("PROGRAMID"), Some("PSKReporter"));
        assert_eq!(
            header.iter().collect::<Vec<_>>(),
            vec![("ADIF_VER", "3.1.0"), ("PROGRAMID", "PSKReporter")]
        );
        assert!(doc.records().all(|r| r.get("ADIF_VER").is_none()));
    }

    #[test]
    fn test_records_are_restartable() {
        let doc = parse_adif(SAMPLE.as_bytes()).unwrap();
        let first: Vec<_> = doc.records().collect();
        let second: Vec<_> = doc.records().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_delimiter_is_an_error() {
        let result = parse_adif(b"<CALL:5>K1ABC <FREQ:6>14.074");
        assert!(matches!(result, Err(DecodeError::NoRecordDelimiter)));
    }

    #[test]
    fn test_empty_content_is_an_error() {
        assert!(parse_adif(b"").is_err());
        assert!(parse_adif(b"just some text").is_err());
    }

    #[test]
    fn test_header_only_yields_zero_records() {
        let doc = parse_adif(b"export\n<PROGRAMID:4>test<EOH>\n").unwrap();
        assert_eq!(doc.records().count(), 0);
    }

    #[test]
    fn test_empty_records_are_skipped() {
        let doc = parse_adif(b"<EOR><eor>\n<CALL:4>W1AW<EOR>").unwrap();
        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("CALL"), Some("W1AW"));
    }

    #[test]
    fn test_trailing_fields_form_a_record() {
        let doc = parse_adif(b"<CALL:4>W1AW<EOR><CALL:5>K1ABC").unwrap();
        assert_eq!(doc.records().count(), 2);
    }

    #[test]
    fn test_declared_length_is_honoured() {
        let doc = parse_adif(b"<COMMENT:9>a b c d e<CALL:4>W1AW<EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("COMMENT"), Some("a b c d e"));
    }

    #[test]
    fn test_angle_bracket_inside_sized_value_is_kept() {
        let doc = parse_adif(b"<COMMENT:10>SNR <-10dB<CALL:4>W1AW<EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("COMMENT"), Some("SNR <-10dB"));
        assert_eq!(record.get("CALL"), Some("W1AW"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_length_running_into_end_of_record_falls_back() {
        let doc = parse_adif(b"<CALL:9>K1ABC<eor><CALL:4>W1AW<EOR>").unwrap();
        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("CALL"), Some("K1ABC"));
        assert_eq!(records[1].get("CALL"), Some("W1AW"));
    }

    #[test]
    fn test_overlong_length_falls_back_to_next_tag() {
        let doc = parse_adif(b"<CALL:40>K1ABC<FREQ:6>14.074<EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("CALL"), Some("K1ABC"));
        assert_eq!(record.get("FREQ"), Some("14.074"));
    }

    #[test]
    fn test_missing_length_reads_to_next_tag() {
        let doc = parse_adif(b"<CALL>K1ABC <FREQ:x>14.074 <EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("CALL"), Some("K1ABC"));
        assert_eq!(record.get("FREQ"), Some("14.074"));
    }

    #[test]
    fn test_type_indicator_is_accepted() {
        let doc = parse_adif(b"<APP_PSKREP_SNR:3:N>-15<EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("APP_PSKREP_SNR"), Some("-15"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let doc = parse_adif(b"<CALL:3>   <GRIDSQUARE:0><EOR>").unwrap();
        let records: Vec<_> = doc.records().collect();
        assert!(records.is_empty());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let doc = parse_adif(b"<CALL:4>W1AW<CALL:5>K1ABC<EOR>").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.get("CALL"), Some("W1AW"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_gzip_content_is_inflated() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let doc = parse_adif(&compressed).unwrap();
        assert_eq!(doc.records().count(), 2);
    }

    #[test]
    fn test_corrupt_gzip_is_an_error() {
        let result = parse_adif(&[0x1f, 0x8b, 0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(DecodeError::Gzip(_))));
    }

    #[test]
    fn test_raw_record_from_iter_uppercases_names() {
        let record: RawRecord = [("call", "W1AW"), ("Freq", "14.074")].into_iter().collect();
        assert_eq!(record.get("CALL"), Some("W1AW"));
        assert_eq!(record.get("freq"), Some("14.074"));
    }
}
