//! Redis Backend Module
//!
//! Keyspace held by a Redis server, reached through a multiplexed
//! connection manager that reconnects on its own.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::info;

use super::{KvBackend, Op, Transaction, TxOutcome};
use crate::error::Result;

/// Runs a transaction server-side. ARGV[1] is the guard key (empty for none),
/// followed by opcode/argument groups. Scripts execute atomically in Redis.
///
/// Redis keeps writes made before a script errors, so every command that can
/// fail is checked in a first pass; the second pass only writes once the whole
/// batch is known to apply. `planned` tracks the type each key will have at
/// that point in the batch.
const EXEC_SCRIPT: &str = r#"
if ARGV[1] ~= '' and redis.call('EXISTS', ARGV[1]) == 1 then
    return 0
end

local planned = {}
local i = 2
while i <= #ARGV do
    local op, key = ARGV[i], ARGV[i + 1]
    if op == 'SET' then
        planned[key] = 'string'
        i = i + 3
    elseif op == 'EXPIRE' then
        i = i + 3
    elseif op == 'LREM' or op == 'LPUSH' or op == 'LTRIM' then
        local kind = planned[key] or redis.call('TYPE', key).ok
        if kind ~= 'list' and kind ~= 'none' then
            return redis.error_reply('WRONGTYPE operation against key ' .. key .. ' holding the wrong kind of value')
        end
        if op == 'LPUSH' then
            planned[key] = 'list'
        end
        if op == 'LTRIM' then i = i + 4 else i = i + 3 end
    else
        return redis.error_reply('unknown transaction op ' .. op)
    end
end

i = 2
while i <= #ARGV do
    local op = ARGV[i]
    if op == 'SET' then
        redis.call('SET', ARGV[i + 1], ARGV[i + 2])
        i = i + 3
    elseif op == 'EXPIRE' then
        redis.call('EXPIRE', ARGV[i + 1], ARGV[i + 2])
        i = i + 3
    elseif op == 'LREM' then
        redis.call('LREM', ARGV[i + 1], 0, ARGV[i + 2])
        i = i + 3
    elseif op == 'LPUSH' then
        redis.call('LPUSH', ARGV[i + 1], ARGV[i + 2])
        i = i + 3
    else
        redis.call('LTRIM', ARGV[i + 1], ARGV[i + 2], ARGV[i + 3])
        i = i + 4
    end
end
return 1
"#;

// == Redis Backend ==
/// Backend talking to an external Redis server.
pub struct RedisBackend {
    conn: ConnectionManager,
    script: Script,
}

impl RedisBackend {
    /// Opens a managed connection to `url`, e.g. `redis://127.0.0.1:6379/2`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to redis at {}", url);
        Ok(Self {
            conn,
            script: Script::new(EXEC_SCRIPT),
        })
    }
}

/// Flattens a transaction into the script's ARGV layout.
fn script_args(tx: &Transaction) -> Vec<String> {
    let mut args = vec![tx.guard().unwrap_or_default().to_string()];
    for op in tx.ops() {
        match op {
            Op::Set { key, value } => {
                args.extend(["SET".to_string(), key.clone(), value.clone()]);
            }
            Op::Expire { key, seconds } => {
                args.extend(["EXPIRE".to_string(), key.clone(), seconds.to_string()]);
            }
            Op::LRem { key, value } => {
                args.extend(["LREM".to_string(), key.clone(), value.clone()]);
            }
            Op::LPush { key, value } => {
                args.extend(["LPUSH".to_string(), key.clone(), value.clone()]);
            }
            Op::LTrim { key, start, stop } => {
                args.extend([
                    "LTRIM".to_string(),
                    key.clone(),
                    start.to_string(),
                    stop.to_string(),
                ]);
            }
        }
    }
    args
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn exec(&self, tx: Transaction) -> Result<TxOutcome> {
        let mut conn = self.conn.clone();
        let mut invocation = self.script.prepare_invoke();
        for arg in script_args(&tx) {
            invocation.arg(arg);
        }
        let applied: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(if applied == 1 {
            TxOutcome::Committed
        } else {
            TxOutcome::Aborted
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_args_layout() {
        let tx = Transaction::new()
            .set("info.k", "{}")
            .expire("info.k", 30)
            .lrem("recent", "k")
            .lpush("recent", "k")
            .ltrim("recent", 0, 19);

        let args = script_args(&tx);
        assert_eq!(args[0], "");
        assert_eq!(
            &args[1..],
            &[
                "SET", "info.k", "{}", "EXPIRE", "info.k", "30", "LREM", "recent", "k", "LPUSH",
                "recent", "k", "LTRIM", "recent", "0", "19",
            ]
        );
    }

    #[test]
    fn test_script_checks_types_before_writing() {
        let first_type_check = EXEC_SCRIPT.find("redis.call('TYPE'").unwrap();
        let first_write = ["'SET'", "'EXPIRE'", "'LREM'", "'LPUSH'", "'LTRIM'"]
            .iter()
            .filter_map(|cmd| EXEC_SCRIPT.find(&format!("redis.call({}", cmd)))
            .min()
            .unwrap();
        assert!(first_type_check < first_write);

        let guard_check = EXEC_SCRIPT.find("redis.call('EXISTS'").unwrap();
        assert!(guard_check < first_type_check);
        assert_eq!(EXEC_SCRIPT.matches("redis.error_reply").count(), 2);
    }

    #[test]
    fn test_script_args_guard() {
        let tx = Transaction::new().unless_exists("info.k").set("info.k", "{}");
        assert_eq!(script_args(&tx)[0], "info.k");
    }
}
