//! One ingestion run: a kernel image in, one `instances` row and its
//! symbols and cross references out

use std::sync::Arc;

use anyhow::{Context, Result};
use kxref_common::{ConfigRow, IndexTable, TagRow};
use log::info;

use crate::cli::Config;
use crate::domain::InstanceId;
use crate::pipeline::{Pipeline, WorkerStats};
use crate::preflight::run_preflight_checks;
use crate::scanner::{ScanStats, Scanner};
use crate::sink::{Sink, SinkHandle, SqliteSink};
use crate::symbolization::Resolver;

/// What a finished run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub instance: InstanceId,
    pub scan: ScanStats,
    pub worker: WorkerStats,
}

/// Ingest the image described by `config`
///
/// # Errors
/// Returns an error if a pre-flight check fails, the database or the debug
/// binary cannot be opened, the scan fails, or a statement is rejected
pub fn ingest(config: &Config, quiet: bool) -> Result<IngestSummary> {
    run_preflight_checks(config, quiet)?;
    let version = config.kernel_version()?;
    let scanner = Scanner::open(config.scan_target())?;
    // Everything that can reject the inputs runs before the database is opened
    let resolver = if config.xrefs {
        Resolver::open(&config.vmlinux)?
    } else {
        Resolver::without_debug_info()
    };

    let sink: SinkHandle = Arc::new(SqliteSink::open(&config.db)?);
    let instance = record_instance(&*sink, config, &version.instance_row(&config.note).to_sql())?;
    info!("Created {instance} for Linux {version} ({})", config.note);

    let pipeline = Pipeline::start(resolver)?;

    let scan = scanner.run(pipeline.dispatcher(), &sink, instance, config.mode());
    // The worker's error explains a failed scan, so drain before reporting
    let worker = pipeline.finish().context("Resolution pipeline failed")?;
    let scan = scan.context("Scan failed")?;

    Ok(IngestSummary { instance, scan, worker })
}

/// Insert the instance row and everything keyed by it that is known up
/// front
fn record_instance(sink: &dyn Sink, config: &Config, instance_sql: &str) -> Result<InstanceId> {
    let instance = InstanceId(sink.execute_returning_id(instance_sql)?);

    for (key, value) in &config.configs {
        let row = ConfigRow { key: key.clone(), value: value.clone(), instance_id: instance.0 };
        sink.execute(&row.to_sql())?;
    }
    for table in IndexTable::ALL {
        sink.execute(&table.to_sql(instance.0))?;
    }
    if let Some(prefix) = &config.addr2line_prefix {
        sink.execute(&TagRow { addr2line_prefix: prefix.clone() }.to_sql())?;
    }

    Ok(instance)
}
