//! Redis-backed lease client.

use super::{LeaseClient, SENTINEL, ttl_millis};
use crate::error::Result;
use ::redis::{ConnectionAddr, IntoConnectionInfo};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// A [`LeaseClient`] speaking to a Redis-compatible server.
///
/// Uses `SET key 1 NX PX ms`, `PEXPIRE key ms` and `DEL key`. A single
/// synchronous connection is opened on first use and shared between the caller
/// and the renewal thread; it is discarded after an I/O error so the next
/// command reconnects.
pub struct RedisLeaseClient {
    client: ::redis::Client,
    timeout: Duration,
    conn: Mutex<Option<::redis::Connection>>,
}

impl RedisLeaseClient {
    /// Build a client for `host:port`, authenticating with `password` if set.
    ///
    /// No connection is made until the first command.
    pub fn new(host: &str, port: u16, password: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = ::redis::Client::open(connection_info(host, port, password)?)?;
        Ok(Self {
            client,
            timeout,
            conn: Mutex::new(None),
        })
    }

    fn connect(&self) -> ::redis::RedisResult<::redis::Connection> {
        let conn = self.client.get_connection_with_timeout(self.timeout)?;
        conn.set_read_timeout(Some(self.timeout))?;
        conn.set_write_timeout(Some(self.timeout))?;
        debug!("connected to lease store");
        Ok(conn)
    }

    fn with_connection<T>(
        &self,
        command: impl FnOnce(&mut ::redis::Connection) -> ::redis::RedisResult<T>,
    ) -> Result<T> {
        let mut slot = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };

        let result = command(&mut conn);
        match &result {
            Err(e) if e.is_io_error() || e.is_connection_dropped() => {
                debug!(error = %e, "dropping broken lease store connection");
            }
            _ => *slot = Some(conn),
        }
        Ok(result?)
    }
}

impl std::fmt::Debug for RedisLeaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLeaseClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LeaseClient for RedisLeaseClient {
    fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool> {
        let reply: Option<String> = self.with_connection(|conn| {
            ::redis::cmd("SET")
                .arg(key)
                .arg(SENTINEL)
                .arg("NX")
                .arg("PX")
                .arg(ttl_millis(ttl))
                .query(conn)
        })?;
        Ok(reply.is_some())
    }

    fn refresh(&self, key: &str, ttl: Duration) -> Result<bool> {
        let updated: i64 = self.with_connection(|conn| {
            ::redis::cmd("PEXPIRE")
                .arg(key)
                .arg(ttl_millis(ttl))
                .query(conn)
        })?;
        Ok(updated == 1)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let removed: i64 = self.with_connection(|conn| ::redis::cmd("DEL").arg(key).query(conn))?;
        Ok(removed > 0)
    }
}

/// TCP address plus optional `AUTH` password. No URL is involved, so IPv6
/// hosts and passwords with reserved characters need no escaping.
fn connection_info(
    host: &str,
    port: u16,
    password: Option<&str>,
) -> ::redis::RedisResult<::redis::ConnectionInfo> {
    let info = ConnectionAddr::Tcp(host.to_string(), port).into_connection_info()?;
    Ok(match password {
        Some(password) if !password.is_empty() => {
            let settings = info.redis_settings().clone().set_password(password);
            info.set_redis_settings(settings)
        }
        _ => info,
    })
}
