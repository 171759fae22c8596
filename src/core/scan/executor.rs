//! Scan executor
//!
//! Drives one job through the five-phase pipeline: metadata → sampling →
//! detection → quasi-identifier analysis → report. Between phases the job
//! manager transitions status (emitting progress) and the executor checks
//! for cancellation. Any phase error ends the job as FAILED with a
//! `"<phase>: <cause>"` message; the database connection is released on
//! every exit path.

use super::context::ScanContext;
use crate::adapters::database::{Connector, MetadataExtractor, Sampler};
use crate::adapters::ner::NerClient;
use crate::core::detection::{DetectionCache, DetectionEngine};
use crate::core::jobs::JobManager;
use crate::core::qi::QuasiIdentifierAnalyzer;
use crate::core::report::ReportBuilder;
use crate::domain::{
    ArgusError, ColumnInfo, DatabaseError, JobId, JobStatus, Result,
};
use std::sync::Arc;

enum Outcome {
    Completed,
    Cancelled,
}

/// Executes scan jobs end-to-end
pub struct ScanExecutor {
    connector: Arc<dyn Connector>,
    metadata_extractor: Arc<dyn MetadataExtractor>,
    sampler: Arc<dyn Sampler>,
    job_manager: Arc<JobManager>,
    cache: Arc<DetectionCache>,
    ner_client: Option<Arc<NerClient>>,
}

impl ScanExecutor {
    /// Creates an executor over the collaborator set
    pub fn new(
        connector: Arc<dyn Connector>,
        metadata_extractor: Arc<dyn MetadataExtractor>,
        sampler: Arc<dyn Sampler>,
        job_manager: Arc<JobManager>,
        cache: Arc<DetectionCache>,
        ner_client: Option<Arc<NerClient>>,
    ) -> Self {
        Self {
            connector,
            metadata_extractor,
            sampler,
            job_manager,
            cache,
            ner_client,
        }
    }

    /// Runs one job to a terminal state and returns that state
    ///
    /// # Errors
    ///
    /// Returns an error only when the job itself cannot be loaded or its
    /// terminal transition cannot be persisted; phase failures are absorbed
    /// into the FAILED state.
    pub async fn execute(&self, job_id: &JobId) -> Result<JobStatus> {
        let job = self.job_manager.get_job(job_id).await?;
        tracing::info!(job_id = %job.id, connection = %job.connection_id, "Scan starting");

        let mut ctx = ScanContext::new(job);
        let outcome = self.run_pipeline(&mut ctx).await;

        // Release the connection on every exit path
        if let Some(connection) = ctx.connection.take() {
            if let Err(e) = connection.close().await {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to close database connection");
            }
        }

        match outcome {
            Ok(Outcome::Completed) => {
                let job = self.job_manager.complete_job(job_id).await?;
                tracing::info!(job_id = %job_id, "Scan completed");
                Ok(job.status)
            }
            Ok(Outcome::Cancelled) => {
                tracing::info!(job_id = %job_id, "Scan aborted after cancellation");
                Ok(JobStatus::Cancelled)
            }
            Err(e) => {
                let message = failure_message(&e);
                tracing::error!(job_id = %job_id, error = %e, "Scan failed");
                match self.job_manager.fail_job(job_id, &message).await {
                    Ok(job) => Ok(job.status),
                    // A concurrent cancel can win the race to the terminal state
                    Err(ArgusError::IllegalStateTransition { from, .. }) => Ok(from),
                    Err(inner) => Err(inner),
                }
            }
        }
    }

    async fn run_pipeline(&self, ctx: &mut ScanContext) -> Result<Outcome> {
        if !self.advance(ctx, JobStatus::ExtractingMetadata).await? {
            return Ok(Outcome::Cancelled);
        }
        self.extract_metadata(ctx).await?;

        if !self.advance(ctx, JobStatus::Sampling).await? {
            return Ok(Outcome::Cancelled);
        }
        self.sample(ctx).await?;

        if !self.advance(ctx, JobStatus::DetectingPii).await? {
            return Ok(Outcome::Cancelled);
        }
        self.detect(ctx).await?;

        if !self.advance(ctx, JobStatus::AnalyzingQi).await? {
            return Ok(Outcome::Cancelled);
        }
        self.analyze_qi(ctx).await;

        if !self.advance(ctx, JobStatus::GeneratingReport).await? {
            return Ok(Outcome::Cancelled);
        }
        // Free database resources before assembling the report
        if let Some(connection) = ctx.connection.take() {
            if let Err(e) = connection.close().await {
                tracing::warn!(job_id = %ctx.job.id, error = %e, "Failed to close database connection");
            }
        }
        self.generate_report(ctx).await?;

        Ok(Outcome::Completed)
    }

    /// Transitions to the next phase unless the job was cancelled
    ///
    /// Returns `false` when the cancellation signal was observed; the caller
    /// aborts before starting the next phase.
    async fn advance(&self, ctx: &mut ScanContext, next: JobStatus) -> Result<bool> {
        let current = self.job_manager.get_job(&ctx.job.id).await?;
        if current.status == JobStatus::Cancelled {
            return Ok(false);
        }

        match self.job_manager.update_status(&ctx.job.id, next).await {
            Ok(job) => {
                ctx.job = job;
                Ok(true)
            }
            // Cancel won the race between the check above and the update
            Err(ArgusError::IllegalStateTransition {
                from: JobStatus::Cancelled,
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Phase 1: open the connection and extract schema metadata
    async fn extract_metadata(&self, ctx: &mut ScanContext) -> Result<()> {
        let connection = self.connector.open(&ctx.job.connection_id).await?;

        let schema = if ctx.job.target_tables.is_empty() {
            self.metadata_extractor.extract(connection.as_ref()).await?
        } else {
            self.metadata_extractor
                .extract_for_tables(connection.as_ref(), &ctx.job.target_tables)
                .await?
        };

        let database_name = connection.catalog().to_string();
        let product_name = connection.product_name().to_string();
        let product_version = connection.product_version().to_string();
        let column_count = schema.column_count();
        ctx.host = connection.host().to_string();

        ctx.job = self
            .job_manager
            .update_job_fields(&ctx.job.id, move |job| {
                job.database_name = Some(database_name);
                job.database_product_name = Some(product_name);
                job.database_product_version = Some(product_version);
                job.record_columns_scanned(column_count);
            })
            .await?;

        ctx.connection = Some(connection);
        ctx.schema = Some(schema);
        Ok(())
    }

    /// Phase 2: sample every column
    async fn sample(&self, ctx: &mut ScanContext) -> Result<()> {
        let connection = ctx
            .connection
            .as_deref()
            .ok_or_else(|| DatabaseError::ConnectionFailed("connection not open".to_string()))?;
        let columns = ctx
            .schema
            .as_ref()
            .map(columns_of)
            .unwrap_or_default();

        ctx.samples = self
            .sampler
            .extract_samples(connection, &columns, &ctx.job.sampling)
            .await?;
        Ok(())
    }

    /// Phase 3: run the detection engine and persist per-column results
    async fn detect(&self, ctx: &mut ScanContext) -> Result<()> {
        let engine = DetectionEngine::new(
            ctx.job.detection.clone(),
            self.ner_client.clone(),
            self.cache.clone(),
        )?;
        let columns = ctx
            .schema
            .as_ref()
            .map(columns_of)
            .unwrap_or_default();

        ctx.results = engine.detect(&columns, &ctx.samples).await;

        self.job_manager
            .repository()
            .save_detection_results(&ctx.job.id, &ctx.results)
            .await
            .map_err(|e| {
                ArgusError::Detection(format!("failed to persist detection results: {e}"))
            })?;

        let pii_columns = ctx.results.iter().filter(|r| r.has_pii).count();
        ctx.job = self
            .job_manager
            .update_job_fields(&ctx.job.id, move |job| {
                job.record_pii_columns_found(pii_columns);
            })
            .await?;
        Ok(())
    }

    /// Phase 4: quasi-identifier analysis
    ///
    /// Never fails the job: the PII results already produced are kept, and
    /// persistence problems are logged only.
    async fn analyze_qi(&self, ctx: &mut ScanContext) {
        let qi_config = &ctx.job.detection.quasi_identifier;
        if !qi_config.enabled || !qi_config.correlation_analysis_enabled {
            tracing::debug!(job_id = %ctx.job.id, "Quasi-identifier analysis disabled");
            return;
        }
        let Some(schema) = ctx.schema.as_ref() else {
            return;
        };

        let columns = columns_of(schema);
        let analyzer = QuasiIdentifierAnalyzer::new(qi_config.clone());
        let groups = analyzer.analyze(&ctx.job.id, &columns, &ctx.samples, &mut ctx.results);

        for group in &groups {
            if let Err(e) = self.job_manager.repository().save_qi_group(group).await {
                tracing::error!(
                    job_id = %ctx.job.id,
                    group = %group.name,
                    error = %e,
                    "Failed to persist quasi-identifier group; PII results are kept"
                );
            }
        }

        // Results gained QI annotations; refresh the stored copies
        if let Err(e) = self
            .job_manager
            .repository()
            .save_detection_results(&ctx.job.id, &ctx.results)
            .await
        {
            tracing::error!(job_id = %ctx.job.id, error = %e, "Failed to refresh annotated results");
        }

        let qi_columns = ctx.results.iter().filter(|r| r.is_quasi_identifier).count();
        match self
            .job_manager
            .update_job_fields(&ctx.job.id, move |job| {
                job.record_qi_columns_found(qi_columns);
            })
            .await
        {
            Ok(job) => ctx.job = job,
            Err(e) => {
                tracing::error!(job_id = %ctx.job.id, error = %e, "Failed to update QI counters");
            }
        }

        ctx.qi_groups = groups;
    }

    /// Phase 5: assemble and persist the compliance report
    async fn generate_report(&self, ctx: &mut ScanContext) -> Result<()> {
        let job = self
            .job_manager
            .get_job(&ctx.job.id)
            .await
            .map_err(|e| ArgusError::Report(e.to_string()))?;

        let report = ReportBuilder::new().build(&job, &ctx.host, &ctx.results, &ctx.qi_groups);
        self.job_manager
            .repository()
            .save_report(&report)
            .await
            .map_err(|e| ArgusError::Report(format!("failed to persist report: {e}")))?;

        report.log_summary();
        Ok(())
    }
}

fn columns_of(schema: &crate::domain::SchemaInfo) -> Vec<ColumnInfo> {
    schema.all_columns().into_iter().cloned().collect()
}

/// Formats a phase failure as `"<phase>: <cause>"`
///
/// Recognized failure categories: database connection, metadata extraction,
/// sampling, PII detection, SQL, invalid input, report generation; anything
/// else is an unexpected error.
fn failure_message(error: &ArgusError) -> String {
    match error {
        ArgusError::Database(DatabaseError::ConnectionFailed(msg))
        | ArgusError::Database(DatabaseError::UnknownConnection(msg))
        | ArgusError::Database(DatabaseError::Pool(msg)) => {
            format!("database connection: {msg}")
        }
        ArgusError::Database(DatabaseError::MetadataExtraction(msg)) => {
            format!("metadata extraction: {msg}")
        }
        ArgusError::Database(DatabaseError::Sampling(msg)) => format!("sampling: {msg}"),
        ArgusError::Database(DatabaseError::Sql(msg)) => format!("sql: {msg}"),
        ArgusError::Detection(msg) => format!("PII detection: {msg}"),
        ArgusError::InvalidInput(msg) => format!("invalid input: {msg}"),
        ArgusError::Report(msg) => format!("report generation: {msg}"),
        other => format!("unexpected error: {other}"),
    }
}
