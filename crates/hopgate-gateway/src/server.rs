//! Accept loop.
//!
//! One listener, one spawned task per accepted connection. A session task
//! lives exactly as long as its connection; shutdown only stops accepting.

use std::sync::Arc;
use std::time::Instant;

use hopgate_config::GatewaySettings;
use hopgate_metrics::{ERROR_TRANSPORT, record_error, record_session_accepted, record_session_closed};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::session::next_session_id;
use crate::transport::{Connect, Resolve};

/// Bind `settings.listen` and serve until `shutdown` is cancelled.
pub async fn run(settings: GatewaySettings, shutdown: CancellationToken) -> Result<(), GatewayError> {
    let gateway = Arc::new(Gateway::from_settings(&settings).await?);
    let listener = TcpListener::bind(settings.listen).await?;
    info!(listen = %listener.local_addr()?, "hopgate listening");
    serve(listener, gateway, shutdown).await
}

/// Serve connections from an already bound listener.
pub async fn serve<R, C>(
    listener: TcpListener,
    gateway: Arc<Gateway<R, C>>,
    shutdown: CancellationToken,
) -> Result<(), GatewayError>
where
    R: Resolve,
    C: Connect,
{
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("accept loop shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        record_error(ERROR_TRANSPORT);
                        continue;
                    }
                };
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(error = %e, "failed to set TCP_NODELAY");
                }

                let gateway = gateway.clone();
                let id = next_session_id();
                tokio::spawn(
                    async move {
                        record_session_accepted();
                        let started = Instant::now();
                        let state = gateway.handle(id, stream).await;
                        record_session_closed(started.elapsed().as_secs_f64());
                        debug!(?state, "session finished");
                    }
                    .instrument(info_span!("session", id, peer = %peer)),
                );
            }
        }
    }
}
