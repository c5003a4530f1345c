use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{pin, task};

use hyper_util::rt::TokioIo;
use tonic::transport::{Channel, Endpoint};

#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("failed to connect to socket `{path}`: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("timed out after {timeout:?} connecting to socket `{path}`")]
    Timeout { path: PathBuf, timeout: Duration },
}

#[derive(Debug, Clone)]
struct UnixConnector {
    path: PathBuf,
    timeout: Duration,
}

impl tower::Service<hyper::Uri> for UnixConnector {
    type Response = TokioIo<tokio::net::UnixStream>;

    type Error = std::io::Error;

    type Future = pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut task::Context<'_>,
    ) -> task::Poll<Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: hyper::Uri) -> Self::Future {
        let path = self.path.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            let stream = tokio::time::timeout(timeout, tokio::net::UnixStream::connect(path))
                .await
                .map_err(|_| std::io::Error::from(std::io::ErrorKind::TimedOut))??;

            Ok(TokioIo::new(stream))
        })
    }
}

/// Opens a gRPC channel over the Unix socket at `path`.
///
/// Both the dial and every request made on the returned channel are bounded by `timeout`, so an
/// unresponsive runtime cannot stall the caller.
pub async fn channel_for_unix_socket(
    path: impl AsRef<Path>,
    timeout: Duration,
) -> Result<Channel, DialError> {
    let path = path.as_ref();
    log::debug!("Dialing runtime socket {}", path.display());
    let connector = UnixConnector {
        path: path.to_path_buf(),
        timeout,
    };
    let endpoint = Endpoint::from_static("http://[::]:50051")
        .connect_timeout(timeout)
        .timeout(timeout);
    let channel = tokio::time::timeout(timeout, endpoint.connect_with_connector(connector))
        .await
        .map_err(|_| DialError::Timeout {
            path: path.to_path_buf(),
            timeout,
        })?
        .map_err(|source| DialError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
    log::trace!("Connected to {}", path.display());

    Ok(channel)
}
