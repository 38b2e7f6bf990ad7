//! Dialer Worker: dequeues jobs, places outbound calls, runs the Voice
//! Pipeline, and applies the retry policy (§4.7, §4.8).

pub mod pending;
pub mod retry;
pub mod worker;

pub use pending::PendingCallRegistry;
pub use worker::DialerWorker;
