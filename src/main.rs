/// Entry point of the container scope OCI hook.
///
/// Invoked by the container runtime with the container state on stdin. A non-zero exit status
/// reports a failed hook to the runtime.
///
/// # Examples
///
/// ```bash
/// echo '{"id":"abc","pid":1234}' | RUST_LOG=debug container-scope start
/// CONTAINERD_SOCKET_PATH=/run/containerd/containerd.sock container-scope pid containerd://abc
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    container_scope::run().await
}
