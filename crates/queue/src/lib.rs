//! Queue Service: Redis-backed priority/tenant/retry job queues (§4.6).

pub mod backend;
pub mod mock;
pub mod redis_backend;
pub mod service;

pub use backend::QueueBackend;
pub use mock::MockQueueBackend;
pub use redis_backend::RedisQueueBackend;
pub use service::QueueService;
