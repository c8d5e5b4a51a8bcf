//! Wiring of the two stages from settings

use std::sync::Arc;

use tracing::info;

use crate::config::IngestSettings;
use crate::error::IngestResult;
use crate::ledger::{DynamoDbLedger, DynamoDbTileIndex, IngestLedger, MemoryLedger, TileIndex};
use crate::poll::StatusReconciler;
use crate::sds::job::job_type_for;
use crate::sds::{JobSpec, JobSubmitter, MozartClient};
use crate::submit::SubmissionCoordinator;

/// Where ledger entries and availability keys are kept
pub enum LedgerBackend {
    DynamoDb(aws_sdk_dynamodb::Client),
    Memory(Arc<MemoryLedger>),
}

/// The submission and polling stages sharing one set of collaborators
#[derive(Clone)]
pub struct IngestServices {
    pub coordinator: Arc<SubmissionCoordinator>,
    pub reconciler: Arc<StatusReconciler>,
}

impl IngestServices {
    /// Connect to the SDS and the chosen ledger backend.
    ///
    /// When no queue is configured the SDS is asked for the recommended
    /// queue of the ingest job type.
    pub async fn connect(settings: &IngestSettings, backend: LedgerBackend) -> IngestResult<Self> {
        let client = Arc::new(MozartClient::new(&settings.sds)?);

        let queue = match &settings.sds.queue {
            Some(queue) => queue.clone(),
            None => {
                client
                    .recommended_queue(&job_type_for(&settings.sds.release_tag))
                    .await?
            },
        };
        let job_spec = JobSpec::new(&settings.sds.release_tag, queue);

        let (ledger, tiles): (Arc<dyn IngestLedger>, Arc<dyn TileIndex>) = match backend {
            LedgerBackend::DynamoDb(dynamo) => (
                Arc::new(DynamoDbLedger::new(dynamo.clone(), &settings.ingest_table_name)),
                Arc::new(DynamoDbTileIndex::new(dynamo, &settings.available_tiles_table_name)),
            ),
            LedgerBackend::Memory(memory) => (memory.clone(), memory),
        };

        info!(
            job_type = %job_spec.job_type,
            queue = %job_spec.queue,
            "Ingest services ready"
        );

        Ok(Self::from_parts(settings, ledger, tiles, client, job_spec))
    }

    pub fn from_parts(
        settings: &IngestSettings,
        ledger: Arc<dyn IngestLedger>,
        tiles: Arc<dyn TileIndex>,
        submitter: Arc<dyn JobSubmitter>,
        job_spec: JobSpec,
    ) -> Self {
        let coordinator = SubmissionCoordinator::new(
            settings.parser.clone(),
            ledger.clone(),
            submitter.clone(),
            job_spec,
        )
        .with_max_concurrency(settings.max_concurrency);

        let reconciler =
            StatusReconciler::new(ledger, tiles, submitter).with_max_concurrency(settings.max_concurrency);

        Self {
            coordinator: Arc::new(coordinator),
            reconciler: Arc::new(reconciler),
        }
    }
}
