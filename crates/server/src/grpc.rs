//! gRPC transport for the navigation language.

use std::future::Future;
use std::sync::Arc;

use cosmos_common::ObjectCode;
use cosmos_kernel::Universe;
use cosmos_nav::{NavError, Navigator, Reply};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::{Request, Status, Streaming};
use tracing::{debug, info};

use crate::server::ServerError;
use crate::session::run_line;

/// Generated gRPC bindings for the navigation service.
#[allow(clippy::all)]
pub mod generated {
    tonic::include_proto!("cosmos.navigation");
}

pub use generated::navigation_client::NavigationClient;
pub use generated::navigation_server::{Navigation, NavigationServer};
pub use generated::{CommandReply, CommandRequest};

/// Replies buffered per session before the stream applies backpressure.
const SESSION_BUFFER: usize = 16;

/// Navigation service over a shared, read-only universe.
pub struct NavigationService {
    universe: Arc<Universe>,
}

impl NavigationService {
    pub fn new(universe: Arc<Universe>) -> Self {
        Self { universe }
    }
}

impl CommandReply {
    fn from_result(
        result: Result<Reply, NavError>,
        location: Option<ObjectCode>,
    ) -> Result<Self, Status> {
        let location = location.map(|c| c.to_string());
        match result {
            Ok(reply) => Ok(Self {
                ok: true,
                location,
                reply_json: serde_json::to_string(&reply)
                    .map_err(|e| Status::internal(format!("encode reply: {e}")))?,
                text: reply.to_string(),
                error: String::new(),
            }),
            Err(e) => Ok(Self {
                ok: false,
                location,
                reply_json: String::new(),
                text: String::new(),
                error: e.to_string(),
            }),
        }
    }
}

#[tonic::async_trait]
impl Navigation for NavigationService {
    type SessionStream = ReceiverStream<Result<CommandReply, Status>>;

    async fn session(
        &self,
        request: Request<Streaming<CommandRequest>>,
    ) -> Result<tonic::Response<Self::SessionStream>, Status> {
        let mut inbound = request.into_inner();
        let mut navigator = Navigator::new(Arc::clone(&self.universe));
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);

        tokio::spawn(async move {
            loop {
                let req = match inbound.message().await {
                    Ok(Some(req)) => req,
                    Ok(None) => break,
                    Err(status) => {
                        debug!(%status, "session stream failed");
                        break;
                    }
                };
                let (nav, result) = match run_line(navigator, req.line).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let _ = tx.send(Err(Status::internal(e.to_string()))).await;
                        break;
                    }
                };
                navigator = nav;
                let quit = matches!(result, Ok(Reply::Bye));
                let reply = CommandReply::from_result(result, navigator.location());
                if tx.send(reply).await.is_err() || quit {
                    break;
                }
            }
            debug!("session closed");
        });

        Ok(tonic::Response::new(ReceiverStream::new(rx)))
    }

    async fn execute(
        &self,
        request: Request<CommandRequest>,
    ) -> Result<tonic::Response<CommandReply>, Status> {
        let navigator = Navigator::new(Arc::clone(&self.universe));
        let (navigator, result) = run_line(navigator, request.into_inner().line)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;
        CommandReply::from_result(result, navigator.location()).map(tonic::Response::new)
    }
}

/// Serve the gRPC service on `listener` until `shutdown` resolves.
pub async fn serve_grpc<F>(
    listener: tokio::net::TcpListener,
    universe: Arc<Universe>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(format!("local address: {e}")))?;
    info!(%addr, galaxies = universe.galaxies().len(), "grpc server listening");

    tonic::transport::Server::builder()
        .add_service(NavigationServer::new(NavigationService::new(universe)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("grpc: {e}")))?;

    info!("grpc server shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reply_has_no_payload() {
        let reply = CommandReply::from_result(Err(NavError::AlreadyAtRoot), None).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.location, None);
        assert!(reply.reply_json.is_empty());
        assert_eq!(reply.error, "already at the root");
    }

    #[test]
    fn ok_reply_carries_json_and_text() {
        let loc: ObjectCode = "G3-S1".parse().unwrap();
        let reply = CommandReply::from_result(
            Ok(Reply::Moved {
                location: Some(loc),
            }),
            Some(loc),
        )
        .unwrap();
        assert!(reply.ok);
        assert_eq!(reply.location.as_deref(), Some("G3-S1"));
        let v: serde_json::Value = serde_json::from_str(&reply.reply_json).unwrap();
        assert_eq!(v["type"], "moved");
        assert!(!reply.text.is_empty());
        assert!(reply.error.is_empty());
    }
}
