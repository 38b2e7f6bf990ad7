//! Persistence client: writes `dialer_jobs`/`calls`/`transcripts`/
//! `recordings`/`action_plans` rows into an externally-owned, tenant-isolated
//! store (§6 — consumed, not implemented).

pub mod mock;
pub mod provider;
pub mod rest;
pub mod types;

pub use mock::MockPersistenceClient;
pub use provider::PersistenceClient;
pub use rest::RestPersistenceClient;
pub use types::{ActionPlanRow, CallRow, DialerJobRow, RecordingRow, TranscriptRow};
