use async_trait::async_trait;
use serde_json::Value;
#[cfg(unix)]
use tokio::net::UnixStream;
#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::{mpsc, oneshot},
};
use uuid::Uuid;

use crate::config::BusAddress;
use crate::error::{Error, Result};
use crate::rpc::{CallId, ObjectAddress, RpcRequest, RpcResponse, read_packet, write_packet};

pub trait AsyncStream: AsyncRead + AsyncWrite {}
impl<T: AsyncRead + AsyncWrite + Unpin> AsyncStream for T {}

type BoxedStream = Box<dyn AsyncStream + Send + Unpin>;

/// A connection to a message bus able to invoke methods on remote objects.
///
/// [`BulletinBoard`](crate::board::BulletinBoard) only talks to the bus
/// through this trait, so callers decide which connection it uses.
#[async_trait]
pub trait BusConnection: Send + Sync {
    /// Invoke `method` on `target` and return the reply value.
    ///
    /// An error reply from the remote side becomes [`Error::Remote`].
    async fn call_method(&self, target: &ObjectAddress, method: &str, args: Value)
    -> Result<Value>;

    /// Ask the bus whether `object_name` currently has an owner.
    async fn has_object(&self, object_name: &str) -> Result<bool>;
}

/// Request from a handle to the client actor
struct ClientMsg {
    req: RpcRequest,
    resp_tx: oneshot::Sender<std::io::Result<RpcResponse>>,
}

/// Handle to a bus connection owned by a background actor task.
///
/// Clones share the same connection; requests are sent one at a time.
#[derive(Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<ClientMsg>,
}

impl ClientHandle {
    /// Connect to the session bus resolved by [`BusAddress::session`].
    pub async fn connect_session() -> Result<Self> {
        Self::connect(&BusAddress::session()).await
    }

    pub async fn connect(address: &BusAddress) -> Result<Self> {
        let stream = open_stream(address)
            .await
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })?;
        log::debug!("Client connected to bus at {address}");

        // channel for handles -> actor
        let (tx, rx) = mpsc::channel::<ClientMsg>(32);
        tokio::spawn(run_actor(stream, rx));

        Ok(Self { tx })
    }

    async fn request(&self, req: RpcRequest) -> Result<RpcResponse> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let msg = ClientMsg { req, resp_tx };

        self.tx.send(msg).await.map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Actor dropped")
        })?;

        let resp = resp_rx.await.unwrap_or_else(|_| {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "Actor task ended",
            ))
        })?;
        Ok(resp)
    }
}

#[async_trait]
impl BusConnection for ClientHandle {
    async fn call_method(
        &self,
        target: &ObjectAddress,
        method: &str,
        args: Value,
    ) -> Result<Value> {
        let call_id = CallId(Uuid::new_v4().to_string());
        log::debug!("Calling {target} {method} as {call_id:?}");

        let req = RpcRequest::Call {
            call_id: call_id.clone(),
            target: target.clone(),
            method: method.into(),
            args,
        };

        match self.request(req).await? {
            RpcResponse::Result { call_id: id, value } if id == call_id => Ok(value),
            RpcResponse::Error {
                call_id: id,
                message,
            } if id.as_ref().map_or(true, |id| *id == call_id) => {
                log::debug!("{method} on {target} failed: {message}");
                Err(Error::remote(message))
            }
            other => Err(Error::protocol(format!(
                "unexpected reply to {method}: {other:?}"
            ))),
        }
    }

    async fn has_object(&self, object_name: &str) -> Result<bool> {
        let req = RpcRequest::HasObject {
            object_name: object_name.into(),
        };

        match self.request(req).await? {
            RpcResponse::HasObjectResult {
                object_name: name,
                exists,
            } if name == object_name => Ok(exists),
            RpcResponse::Error {
                call_id: None,
                message,
            } => Err(Error::remote(message)),
            other => Err(Error::protocol(format!(
                "unexpected reply to HasObject: {other:?}"
            ))),
        }
    }
}

async fn open_stream(address: &BusAddress) -> std::io::Result<BoxedStream> {
    match address {
        BusAddress::Tcp(ip) => {
            let tcp = TcpStream::connect(ip.as_str()).await?;
            Ok(Box::new(tcp))
        }
        #[cfg(unix)]
        BusAddress::Unix(path) => {
            let unix = UnixStream::connect(path).await?;
            Ok(Box::new(unix))
        }
        #[cfg(windows)]
        BusAddress::NamedPipe(name) => {
            let pipe = ClientOptions::new().open(name)?;
            Ok(Box::new(pipe))
        }
    }
}

/// Owns the stream; answers each queued request with exactly one reply frame.
async fn run_actor(mut stream: BoxedStream, mut rx: mpsc::Receiver<ClientMsg>) {
    while let Some(ClientMsg { req, resp_tx }) = rx.recv().await {
        let (result, intact) = exchange(&mut stream, &req).await;

        if let Err(e) = &result {
            log::warn!("Bus request failed: {e}");
        }
        let _ = resp_tx.send(result);

        if !intact {
            break;
        }
    }
    log::debug!("Client actor ended");
}

/// One request/reply round trip. The flag is false once the stream can no
/// longer be trusted to sit on a frame boundary.
async fn exchange(
    stream: &mut BoxedStream,
    req: &RpcRequest,
) -> (std::io::Result<RpcResponse>, bool) {
    let data = match serde_json::to_vec(req) {
        Ok(d) => d,
        Err(e) => return (Err(invalid_data(e)), true),
    };

    // An oversized request is refused before anything is written.
    if let Err(e) = write_packet(stream, &data).await {
        let intact = e.kind() == std::io::ErrorKind::InvalidInput;
        return (Err(e), intact);
    }

    // Any read failure, including an oversized length prefix, leaves unread
    // bytes on the stream.
    let buf = match read_packet(stream).await {
        Ok(buf) => buf,
        Err(e) => return (Err(e), false),
    };

    (serde_json::from_slice(&buf).map_err(invalid_data), true)
}

fn invalid_data(e: serde_json::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::rpc::MAX_PACKET_SIZE;

    /// Bus that answers the first request with `reply(request)` as raw bytes,
    /// then stays connected without answering again.
    async fn answer_once<F>(reply: F) -> BusAddress
    where
        F: FnOnce(RpcRequest) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let buf = read_packet(&mut stream).await.unwrap();
            let req: RpcRequest = serde_json::from_slice(&buf).unwrap();
            stream.write_all(&reply(req)).await.unwrap();
            while read_packet(&mut stream).await.is_ok() {}
        });

        BusAddress::Tcp(addr.to_string())
    }

    fn frame(resp: &RpcResponse) -> Vec<u8> {
        let body = serde_json::to_vec(resp).unwrap();
        let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(&body);
        bytes
    }

    #[tokio::test]
    async fn oversized_reply_ends_the_connection() {
        let address = answer_once(|_| {
            // The announced body starts with what looks like a valid reply.
            let mut bytes = (MAX_PACKET_SIZE as u32 + 1).to_be_bytes().to_vec();
            bytes.extend(frame(&RpcResponse::HasObjectResult {
                object_name: "org.manuel.BulletinBoard".into(),
                exists: true,
            }));
            bytes
        })
        .await;
        let conn = ClientHandle::connect(&address).await.unwrap();

        let first = conn.has_object("org.manuel.BulletinBoard").await;
        assert!(matches!(first, Err(Error::Io { .. })));

        let second = conn.has_object("org.manuel.BulletinBoard").await;
        assert!(matches!(second, Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn error_for_another_call_is_rejected() {
        let address = answer_once(|_| {
            frame(&RpcResponse::Error {
                call_id: Some(CallId("someone else".into())),
                message: "Put failed".into(),
            })
        })
        .await;
        let conn = ClientHandle::connect(&address).await.unwrap();

        let target = ObjectAddress::new("org.example.Obj", "/", "org.example.Obj");
        let err = conn.call_method(&target, "Put", Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[tokio::test]
    async fn error_for_this_call_is_remote() {
        let address = answer_once(|req| match req {
            RpcRequest::Call { call_id, .. } => frame(&RpcResponse::Error {
                call_id: Some(call_id),
                message: "Put failed".into(),
            }),
            other => panic!("unexpected request {other:?}"),
        })
        .await;
        let conn = ClientHandle::connect(&address).await.unwrap();

        let target = ObjectAddress::new("org.example.Obj", "/", "org.example.Obj");
        let err = conn.call_method(&target, "Put", Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Remote { ref message } if message == "Put failed"));
    }

    #[tokio::test]
    async fn has_object_rejects_error_with_call_id() {
        let address = answer_once(|_| {
            frame(&RpcResponse::Error {
                call_id: Some(CallId("stale".into())),
                message: "No such object".into(),
            })
        })
        .await;
        let conn = ClientHandle::connect(&address).await.unwrap();

        let err = conn.has_object("org.example.Obj").await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
