//! End-to-end comparison: validate, decode, bind, normalize, analyze.
//!
//! Files are decoded on a bounded pool of blocking tasks since decoding one
//! file does not depend on any other. Everything after the merge is a single
//! synchronous pass. Dropping the returned future aborts outstanding decode
//! tasks and discards their results.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, info};

use crate::analyzers::analyzer::analyze;
use crate::analyzers::types::{ComparisonReport, ConfigurationSource};
use crate::binder::{ConfigurationDataset, Upload, bind_all, bind_upload, merge, validate_uploads};
use crate::config::CompareSettings;
use crate::error::{CompareError, CompareResult};
use crate::normalize::normalize;
use crate::record::{ConfigurationId, ReporterField};

/// Runs a full comparison, decoding files concurrently.
///
/// # Errors
///
/// Request-shape errors are returned before any file is decoded; otherwise
/// the first failing file in upload order is reported.
#[tracing::instrument(skip_all, fields(files = uploads.len()))]
pub async fn compare(
    uploads: Vec<Upload>,
    settings: &CompareSettings,
) -> CompareResult<ComparisonReport> {
    let ids = validate_uploads(&uploads)?;
    let datasets = decode_all(
        uploads,
        ids,
        settings.reporter_field,
        settings.decode_concurrency,
    )
    .await?;
    Ok(compare_datasets(datasets, settings))
}

/// Runs a full comparison on the current thread.
pub fn compare_blocking(
    uploads: &[Upload],
    settings: &CompareSettings,
) -> CompareResult<ComparisonReport> {
    let datasets = bind_all(uploads, settings.reporter_field)?;
    Ok(compare_datasets(datasets, settings))
}

/// Normalizes and analyzes already bound datasets.
pub fn compare_datasets(
    datasets: Vec<ConfigurationDataset>,
    settings: &CompareSettings,
) -> ComparisonReport {
    let sources: Vec<ConfigurationSource> = datasets
        .iter()
        .map(|d| ConfigurationSource {
            configuration_id: d.configuration_id,
            file_name: d.file_name.clone(),
        })
        .collect();

    let records = merge(datasets);
    let operator = settings.operator();
    let normalized = normalize(&records, operator.as_ref());

    analyze(
        &sources,
        &normalized,
        operator.as_ref(),
        settings.histogram_bins,
    )
}

async fn decode_all(
    uploads: Vec<Upload>,
    ids: Vec<ConfigurationId>,
    reporter_field: ReporterField,
    concurrency: usize,
) -> CompareResult<Vec<ConfigurationDataset>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, (upload, id)) in uploads.into_iter().zip(ids).enumerate() {
        let sem = semaphore.clone();
        let span = tracing::info_span!(
            "decode_file",
            configuration_id = id.value(),
            file_name = %upload.file_name,
            bytes = upload.content.len(),
        );

        tasks.spawn(
            async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => tokio::task::spawn_blocking(move || {
                        bind_upload(&upload, id, reporter_field)
                    })
                    .await
                    .unwrap_or_else(|e| Err(CompareError::Worker(e.to_string()))),
                    Err(e) => Err(CompareError::Worker(e.to_string())),
                };
                (index, result)
            }
            .instrument(span),
        );
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.map_err(|e| CompareError::Worker(e.to_string()))?);
    }
    results.sort_by_key(|(index, _)| *index);

    let datasets = results
        .into_iter()
        .map(|(_, result)| result)
        .collect::<CompareResult<Vec<_>>>()?;

    info!(files = datasets.len(), "All files decoded");
    Ok(datasets)
}
