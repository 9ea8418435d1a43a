//! Synchronous wrappers for callers without an async runtime.
//!
//! [`put`] and [`get`] open a fresh session connection for every call and tear
//! it down on return; [`put_at`] and [`get_at`] do the same for a given bus.
//! [`BlockingBoard`] keeps one explicit connection instead.

use tokio::runtime::{Builder, Runtime};

use crate::board::BulletinBoard;
use crate::client::ClientHandle;
use crate::config::BusAddress;
use crate::error::Result;

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Store `value` under `key` on the session bus's bulletin board.
pub fn put(key: &str, value: &str) -> Result<()> {
    put_at(&BusAddress::session(), key, value)
}

/// Fetch the values stored under `key` on the session bus's bulletin board.
pub fn get(key: &str) -> Result<Vec<String>> {
    get_at(&BusAddress::session(), key)
}

/// Like [`put`], against the bus at `address`.
pub fn put_at(address: &BusAddress, key: &str, value: &str) -> Result<()> {
    runtime()?.block_on(async {
        let conn = ClientHandle::connect(address).await?;
        BulletinBoard::new(conn).put(key, value).await
    })
}

/// Like [`get`], against the bus at `address`.
pub fn get_at(address: &BusAddress, key: &str) -> Result<Vec<String>> {
    runtime()?.block_on(async {
        let conn = ClientHandle::connect(address).await?;
        BulletinBoard::new(conn).get(key).await
    })
}

/// Blocking bulletin-board client over one explicitly chosen bus.
pub struct BlockingBoard {
    rt: Runtime,
    board: BulletinBoard<ClientHandle>,
}

impl BlockingBoard {
    pub fn connect(address: &BusAddress) -> Result<Self> {
        let rt = runtime()?;
        let conn = rt.block_on(ClientHandle::connect(address))?;
        Ok(Self {
            rt,
            board: BulletinBoard::new(conn),
        })
    }

    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.board = self.board.with_app_id(app_id);
        self
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.rt.block_on(self.board.put(key, value))
    }

    pub fn get(&self, key: &str) -> Result<Vec<String>> {
        self.rt.block_on(self.board.get(key))
    }

    pub fn is_available(&self) -> Result<bool> {
        self.rt.block_on(self.board.is_available())
    }
}
