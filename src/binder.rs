//! Binds uploaded files to antenna configurations.
//!
//! The configuration identifier is always supplied by the caller alongside
//! the file; it is never inferred from the callsign suffix inside the log.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{CompareError, CompareResult};
use crate::parser::parse_adif;
use crate::record::{ConfigurationId, ReceptionRecord, ReporterField};

/// Fewest configurations a comparison accepts.
pub const MIN_FILES: usize = 2;
/// Most configurations a comparison accepts, one per suffix `/0`..`/9`.
pub const MAX_FILES: usize = 10;

/// One uploaded log with the configuration it was recorded under.
#[derive(Debug, Clone)]
pub struct Upload {
    pub configuration_id: u8,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(configuration_id: u8, file_name: &str, content: impl Into<Vec<u8>>) -> Self {
        Self {
            configuration_id,
            file_name: file_name.to_string(),
            content: content.into(),
        }
    }
}

/// All records of one uploaded file, stamped with its configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationDataset {
    pub configuration_id: ConfigurationId,
    pub file_name: String,
    pub records: Vec<ReceptionRecord>,
}

/// Checks the request shape before any decoding work is done.
///
/// # Errors
///
/// [`CompareError::InputSize`] for fewer than 2 or more than 10 uploads,
/// [`CompareError::InvalidConfigurationId`] for an identifier above 9 and
/// [`CompareError::ConfigurationConflict`] when an identifier is reused.
pub fn validate_uploads(uploads: &[Upload]) -> CompareResult<Vec<ConfigurationId>> {
    if !(MIN_FILES..=MAX_FILES).contains(&uploads.len()) {
        return Err(CompareError::InputSize {
            count: uploads.len(),
            min: MIN_FILES,
            max: MAX_FILES,
        });
    }

    let mut seen: BTreeMap<ConfigurationId, &str> = BTreeMap::new();
    let mut ids = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let id = ConfigurationId::try_from(upload.configuration_id)?;
        if let Some(first_file) = seen.insert(id, &upload.file_name) {
            return Err(CompareError::ConfigurationConflict {
                configuration_id: id.value(),
                first_file: first_file.to_string(),
                second_file: upload.file_name.clone(),
            });
        }
        ids.push(id);
    }

    Ok(ids)
}

/// Decodes one upload and stamps every record with `configuration_id`.
///
/// # Errors
///
/// Returns [`CompareError::Decode`] naming the file if it is not ADIF.
pub fn bind_upload(
    upload: &Upload,
    configuration_id: ConfigurationId,
    reporter_field: ReporterField,
) -> CompareResult<ConfigurationDataset> {
    let document = parse_adif(&upload.content).map_err(|source| CompareError::Decode {
        configuration_id: configuration_id.value(),
        file_name: upload.file_name.clone(),
        source,
    })?;

    let records: Vec<ReceptionRecord> = document
        .records()
        .map(|raw| ReceptionRecord::from_raw(&raw, configuration_id, reporter_field))
        .collect();

    debug!(
        configuration_id = configuration_id.value(),
        file_name = %upload.file_name,
        records = records.len(),
        "Bound file to configuration"
    );

    Ok(ConfigurationDataset {
        configuration_id,
        file_name: upload.file_name.clone(),
        records,
    })
}

/// Validates and binds every upload sequentially.
pub fn bind_all(
    uploads: &[Upload],
    reporter_field: ReporterField,
) -> CompareResult<Vec<ConfigurationDataset>> {
    let ids = validate_uploads(uploads)?;
    uploads
        .iter()
        .zip(ids)
        .map(|(upload, id)| bind_upload(upload, id, reporter_field))
        .collect()
}

/// Merges datasets into one record sequence ordered by configuration, each
/// file's records kept in their original order.
pub fn merge(mut datasets: Vec<ConfigurationDataset>) -> Vec<ReceptionRecord> {
    datasets.sort_by_key(|d| d.configuration_id);
    let total: usize = datasets.iter().map(|d| d.records.len()).sum();
    info!(
        configurations = datasets.len(),
        records = total,
        "Merged configuration datasets"
    );
    datasets.into_iter().flat_map(|d| d.records).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "<CALL:4>W1AW<APP_PSKREP_SNR:3>-10<EOR><CALL:5>K1ABC<EOR>";

    fn uploads(ids: &[u8]) -> Vec<Upload> {
        ids.iter()
            .map(|id| Upload::new(*id, &format!("ant{id}.adi"), LOG))
            .collect()
    }

    #[test]
    fn test_single_file_is_rejected() {
        let result = validate_uploads(&uploads(&[0]));
        assert!(matches!(
            result,
            Err(CompareError::InputSize { count: 1, .. })
        ));
    }

    #[test]
    fn test_ten_files_are_accepted() {
        let ids: Vec<u8> = (0..=9).collect();
        assert_eq!(validate_uploads(&uploads(&ids)).unwrap().len(), 10);
    }

    #[test]
    fn test_eleven_files_are_rejected() {
        let mut all = uploads(&(0..=9).collect::<Vec<_>>());
        all.push(Upload::new(0, "extra.adi", LOG));
        assert!(matches!(
            validate_uploads(&all),
            Err(CompareError::InputSize { count: 11, .. })
        ));
    }

    #[test]
    fn test_duplicate_id_is_a_conflict() {
        let mut all = uploads(&[0, 1]);
        all.push(Upload::new(1, "again.adi", LOG));
        match validate_uploads(&all) {
            Err(CompareError::ConfigurationConflict {
                configuration_id,
                first_file,
                second_file,
            }) => {
                assert_eq!(configuration_id, 1);
                assert_eq!(first_file, "ant1.adi");
                assert_eq!(second_file, "again.adi");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_id_is_rejected() {
        assert!(matches!(
            validate_uploads(&uploads(&[0, 12])),
            Err(CompareError::InvalidConfigurationId(12))
        ));
    }

    #[test]
    fn test_conflict_is_reported_before_decoding() {
        let all = vec![
            Upload::new(3, "bad.adi", "not adif at all"),
            Upload::new(3, "dup.adi", LOG),
        ];
        assert!(matches!(
            bind_all(&all, ReporterField::Reception),
            Err(CompareError::ConfigurationConflict { .. })
        ));
    }

    #[test]
    fn test_every_record_is_stamped() {
        let datasets = bind_all(&uploads(&[4, 7]), ReporterField::Reception).unwrap();
        assert_eq!(datasets.len(), 2);
        for dataset in &datasets {
            assert_eq!(dataset.records.len(), 2);
            assert!(
                dataset
                    .records
                    .iter()
                    .all(|r| r.configuration_id == dataset.configuration_id)
            );
        }
    }

    #[test]
    fn test_decode_failure_names_the_file() {
        let all = vec![
            Upload::new(0, "good.adi", LOG),
            Upload::new(5, "garbage.txt", "no tags here"),
        ];
        match bind_all(&all, ReporterField::Reception) {
            Err(CompareError::Decode {
                configuration_id,
                file_name,
                ..
            }) => {
                assert_eq!(configuration_id, 5);
                assert_eq!(file_name, "garbage.txt");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_orders_by_configuration() {
        let datasets = bind_all(&uploads(&[6, 2]), ReporterField::Reception).unwrap();
        let merged = merge(datasets);
        let ids: Vec<u8> = merged.iter().map(|r| r.configuration_id.value()).collect();
        assert_eq!(ids, vec![2, 2, 6, 6]);
        assert_eq!(merged[0].reporter_callsign.as_deref(), Some("W1AW"));
        assert_eq!(merged[1].reporter_callsign.as_deref(), Some("K1ABC"));
    }
}
