use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame body.
pub const MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

/// Well-known name, object path and interface of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAddress {
    pub destination: String,
    pub path: String,
    pub interface: String,
}

impl ObjectAddress {
    pub fn new(destination: &str, path: &str, interface: &str) -> Self {
        Self {
            destination: destination.into(),
            path: path.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.destination, self.path, self.interface)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RpcRequest {
    Call {
        call_id: CallId,
        target: ObjectAddress,
        method: String,
        args: Value,
    },
    HasObject {
        object_name: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Result {
        call_id: CallId,
        value: Value,
    },
    Error {
        call_id: Option<CallId>,
        message: String,
    },
    HasObjectResult {
        object_name: String,
        exists: bool,
    },
}

/// Write one frame: big-endian `u32` length, then the body.
pub async fn write_packet<W>(writer: &mut W, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if data.len() > MAX_PACKET_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("packet of {} bytes exceeds limit", data.len()),
        ));
    }
    writer.write_u32(data.len() as u32).await?;
    writer.write_all(data).await?;
    writer.flush().await
}

/// Read one frame written by [`write_packet`].
pub async fn read_packet<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_PACKET_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("packet of {len} bytes exceeds limit"),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn frames_survive_partial_streams() {
        let (mut a, mut b) = tokio::io::duplex(8);

        let req = RpcRequest::Call {
            call_id: CallId("1".into()),
            target: ObjectAddress::new("org.example.Obj", "/", "org.example.Obj"),
            method: "Get".into(),
            args: json!(["app", [104, 105]]),
        };
        let data = serde_json::to_vec(&req).unwrap();

        let writer = tokio::spawn(async move {
            write_packet(&mut a, &data).await.unwrap();
            write_packet(&mut a, b"{}").await.unwrap();
        });

        let first = read_packet(&mut b).await.unwrap();
        let decoded: RpcRequest = serde_json::from_slice(&first).unwrap();
        assert_eq!(decoded, req);
        assert_eq!(read_packet(&mut b).await.unwrap(), b"{}".to_vec());
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(MAX_PACKET_SIZE as u32 + 1).await.unwrap();

        let err = read_packet(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn truncated_frame_is_eof() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(10).await.unwrap();
        a.write_all(b"abc").await.unwrap();
        drop(a);

        let err = read_packet(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
