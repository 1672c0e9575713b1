//! Redis-backed subscription store for multi-instance deployments.
//!
//! Each subscriber is a hash with two fields: `record` (JSON) and `version`.
//! Conditional writes run as a Lua script so the version check and the
//! overwrite happen atomically on the server.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{
    PutOutcome, RecordVersion, StoreError, StoredSubscription, SubscriptionStore,
};

/// Writes ARGV[2]/ARGV[3] only if the stored version equals ARGV[1]
/// (empty ARGV[1] means the hash must not exist yet).
const COMPARE_AND_SET: &str = r#"
local current = redis.call('HGET', KEYS[1], 'version')
if (current == false and ARGV[1] == '') or current == ARGV[1] then
  redis.call('HSET', KEYS[1], 'record', ARGV[2], 'version', ARGV[3])
  return 1
end
return 0
"#;

const FIELD_RECORD: &str = "record";
const FIELD_VERSION: &str = "version";

/// Redis-backed subscription store.
#[derive(Clone)]
pub struct RedisSubscriptionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    compare_and_set: Script,
}

impl RedisSubscriptionStore {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            compare_and_set: Script::new(COMPARE_AND_SET),
        }
    }

    fn key_for(&self, scope: &SubscriberId) -> String {
        subscription_key(&self.key_prefix, scope)
    }
}

fn subscription_key(prefix: &str, scope: &SubscriberId) -> String {
    format!("{}:{}", prefix, scope.as_str())
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn decode(record: String, version: String) -> Result<StoredSubscription, StoreError> {
    let version: u64 = version
        .parse()
        .map_err(|_| StoreError::Deserialization(format!("Invalid version value: {}", version)))?;
    let record: SubscriptionRecord = serde_json::from_str(&record)
        .map_err(|e| StoreError::Deserialization(e.to_string()))?;

    Ok(StoredSubscription {
        record,
        version: RecordVersion::new(version),
    })
}

#[async_trait]
impl SubscriptionStore for RedisSubscriptionStore {
    async fn get(&self, scope: &SubscriberId) -> Result<Option<StoredSubscription>, StoreError> {
        let mut conn = self.conn.clone();

        let (record, version): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(self.key_for(scope))
            .arg(FIELD_RECORD)
            .arg(FIELD_VERSION)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        match (record, version) {
            (None, None) => Ok(None),
            (Some(record), Some(version)) => decode(record, version).map(Some),
            _ => Err(StoreError::Deserialization(
                "subscription hash is missing a field".to_string(),
            )),
        }
    }

    async fn put(
        &self,
        scope: &SubscriberId,
        record: &SubscriptionRecord,
        expected: Option<RecordVersion>,
    ) -> Result<PutOutcome, StoreError> {
        let json =
            serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let next = RecordVersion::after(expected);
        let expected_arg = expected.map(|v| v.to_string()).unwrap_or_default();

        let mut conn = self.conn.clone();
        let written: i64 = self
            .compare_and_set
            .key(self.key_for(scope))
            .arg(expected_arg)
            .arg(json)
            .arg(next.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        if written == 1 {
            Ok(PutOutcome::Written(next))
        } else {
            Ok(PutOutcome::Conflict)
        }
    }

    async fn remove(&self, scope: &SubscriberId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key_for(scope))
            .await
            .map_err(unavailable)
    }
}
