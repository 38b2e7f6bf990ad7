//! Redis-backed [`QueueBackend`] (§4.6).
//!
//! Uses `redis::Script` for the two operations that must be atomic
//! (pop-and-mark-processing, promote-and-remove) rather than app-level
//! locks, per §5's locking discipline ("the Queue Service uses Redis
//! atomic ops only").

use std::collections::HashMap;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use vc_domain::error::{Error, Result};
use vc_domain::types::DialerJob;

use crate::backend::QueueBackend;

const PRIORITY_QUEUE_KEY: &str = "dialer:priority:queue";
const PROCESSING_KEY: &str = "dialer:processing";
const SCHEDULED_KEY: &str = "dialer:scheduled";
const STATS_KEY: &str = "dialer:stats";

fn tenant_queue_key(tenant_id: &str) -> String {
    format!("dialer:tenant:{tenant_id}:queue")
}

/// `LPOP` the queue, then `SADD` the decoded job's `job_id` into the
/// processing set, as one atomic script invocation.
const POP_AND_MARK_SCRIPT: &str = r#"
local v = redis.call('LPOP', KEYS[1])
if v then
    local job = cjson.decode(v)
    redis.call('SADD', KEYS[2], job.job_id)
end
return v
"#;

/// `ZRANGEBYSCORE` everything due, `ZREM` each atomically, return the
/// removed members.
const PROMOTE_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
for _, member in ipairs(due) do
    redis.call('ZREM', KEYS[1], member)
end
return due
"#;

pub struct RedisQueueBackend {
    manager: ConnectionManager,
}

impl RedisQueueBackend {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::QueueBackendUnavailable(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::QueueBackendUnavailable(e.to_string()))?;
        Ok(Self { manager })
    }
}

fn encode(job: &DialerJob) -> Result<String> {
    serde_json::to_string(job).map_err(Error::Json)
}

fn decode(raw: &str) -> Result<DialerJob> {
    serde_json::from_str(raw).map_err(Error::Json)
}

#[async_trait::async_trait]
impl QueueBackend for RedisQueueBackend {
    async fn push_priority(&self, job: &DialerJob) -> Result<()> {
        let mut conn = self.manager.clone();
        let payload = encode(job)?;
        conn.lpush::<_, _, ()>(PRIORITY_QUEUE_KEY, payload).await.map_err(|e| Error::Redis(e.to_string()))
    }

    async fn push_tenant(&self, tenant_id: &str, job: &DialerJob) -> Result<()> {
        let mut conn = self.manager.clone();
        let payload = encode(job)?;
        conn.rpush::<_, _, ()>(tenant_queue_key(tenant_id), payload).await.map_err(|e| Error::Redis(e.to_string()))
    }

    async fn pop_priority(&self) -> Result<Option<DialerJob>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::Script::new(POP_AND_MARK_SCRIPT)
            .key(PRIORITY_QUEUE_KEY)
            .key(PROCESSING_KEY)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::Redis(e.to_string()))?;
        raw.map(|r| decode(&r)).transpose()
    }

    async fn pop_tenant(&self, tenant_id: &str) -> Result<Option<DialerJob>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::Script::new(POP_AND_MARK_SCRIPT)
            .key(tenant_queue_key(tenant_id))
            .key(PROCESSING_KEY)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::Redis(e.to_string()))?;
        raw.map(|r| decode(&r)).transpose()
    }

    async fn unmark_processing(&self, job_id: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.srem::<_, _, ()>(PROCESSING_KEY, job_id).await.map_err(|e| Error::Redis(e.to_string()))
    }

    async fn schedule_retry(&self, job: &DialerJob, execute_at_unix: i64) -> Result<()> {
        let mut conn = self.manager.clone();
        let payload = encode(job)?;
        conn.zadd::<_, _, _, ()>(SCHEDULED_KEY, payload, execute_at_unix).await.map_err(|e| Error::Redis(e.to_string()))
    }

    async fn promote_scheduled(&self, now_unix: i64) -> Result<Vec<DialerJob>> {
        let mut conn = self.manager.clone();
        let raw: Vec<String> = redis::Script::new(PROMOTE_SCRIPT)
            .key(SCHEDULED_KEY)
            .arg(now_unix)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::Redis(e.to_string()))?;
        raw.iter().map(|r| decode(r)).collect()
    }

    async fn incr_stat(&self, field: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.hincr::<_, _, _, ()>(STATS_KEY, field, 1i64).await.map_err(|e| Error::Redis(e.to_string()))
    }

    async fn stats(&self) -> Result<HashMap<String, i64>> {
        let mut conn = self.manager.clone();
        conn.hgetall(STATS_KEY).await.map_err(|e| Error::Redis(e.to_string()))
    }
}
