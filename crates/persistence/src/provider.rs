//! Consumed-only persistence interface (§6): Vocalis writes rows into an
//! externally-owned store and never reads them back. Implementations may
//! talk to the real store, a mock, or any other backend a deployment wires
//! in.

use async_trait::async_trait;
use vc_domain::error::Result;

use crate::types::{ActionPlanRow, CallRow, DialerJobRow, RecordingRow, TranscriptRow};

#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn upsert_dialer_job(&self, row: DialerJobRow) -> Result<()>;
    async fn upsert_call(&self, row: CallRow) -> Result<()>;
    async fn upsert_transcript(&self, row: TranscriptRow) -> Result<()>;
    async fn upsert_recording(&self, row: RecordingRow) -> Result<()>;
    async fn upsert_action_plan(&self, row: ActionPlanRow) -> Result<()>;

    /// Liveness check against the store, used by the control surface's
    /// readiness endpoint.
    async fn health(&self) -> Result<()>;
}
