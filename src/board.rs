//! Client helper for the `org.manuel.BulletinBoard` service.
//!
//! The service stores byte values under `(app_id, key)` pairs. This module
//! offers the string-level `put`/`get` pair (UTF-8 on the wire) and the
//! byte-level calls underneath it.

use serde_json::{Value, json};

use crate::client::BusConnection;
use crate::error::Result;
use crate::rpc::ObjectAddress;

pub const SERVICE_NAME: &str = "org.manuel.BulletinBoard";
pub const OBJECT_PATH: &str = "/";
pub const INTERFACE: &str = "org.manuel.BulletinBoard";

/// Application identifier scoping every key this client touches.
pub const APP_ID: &str = "mytestapp";

/// Address of the bulletin-board object on the bus.
pub fn target() -> ObjectAddress {
    ObjectAddress::new(SERVICE_NAME, OBJECT_PATH, INTERFACE)
}

pub fn encode(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode one stored value. Invalid UTF-8 is an error, never replaced.
pub fn decode(bytes: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(bytes)?)
}

/// Bulletin-board client bound to one bus connection.
///
/// # Example
/// ```ignore
/// let conn = ClientHandle::connect_session().await?;
/// let board = BulletinBoard::new(conn);
///
/// board.put("what is love?", "Baby don't hurt me").await?;
/// let values = board.get("what is love?").await?;
/// ```
pub struct BulletinBoard<C> {
    conn: C,
    app_id: String,
}

impl<C: BusConnection> BulletinBoard<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            app_id: APP_ID.to_string(),
        }
    }

    /// Use another application namespace instead of [`APP_ID`].
    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Store `value` under `key`, both UTF-8 encoded.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_bytes(&encode(key), &encode(value)).await
    }

    /// Fetch every value stored under `key`, in the order the service returns them.
    pub async fn get(&self, key: &str) -> Result<Vec<String>> {
        self.get_bytes(&encode(key))
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn put_bytes(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let args = json!([self.app_id, key, value]);
        self.conn.call_method(&target(), "Put", args).await?;
        Ok(())
    }

    pub async fn get_bytes(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        let args = json!([self.app_id, key]);
        let reply: Value = self.conn.call_method(&target(), "Get", args).await?;

        let values: Vec<Vec<u8>> = serde_json::from_value(reply)?;
        log::debug!("Get returned {} value(s)", values.len());
        Ok(values)
    }

    /// Whether the service name currently has an owner on the bus.
    pub async fn is_available(&self) -> Result<bool> {
        self.conn.has_object(SERVICE_NAME).await
    }
}
