//! Background agent control over a Unix domain socket

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    interaction::AgentControl,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default socket file name inside the config directory
pub const DEFAULT_AGENT_SOCKET: &str = "agent.sock";

const AGENT_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Talks to the local agent through its control socket.
///
/// The agent protocol is line oriented: the client writes a command, the
/// agent answers with `ok` or an error line. `invalidate` sends `kill`,
/// which makes the agent exit and drop every cached token.
pub struct SocketAgentControl {
    socket_path: PathBuf,
}

impl SocketAgentControl {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    #[cfg(unix)]
    async fn send_command(&self, command: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::UnixStream;

        let mut stream = UnixStream::connect(&self.socket_path).await?;
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.shutdown().await?;

        let mut reply = String::new();
        stream.read_to_string(&mut reply).await?;
        Ok(reply.trim().to_string())
    }

    #[cfg(not(unix))]
    async fn send_command(&self, _command: &str) -> Result<String> {
        Err(BridgeError::NotAvailable(
            "Agent control sockets are only supported on Unix".to_string(),
        ))
    }
}

#[async_trait]
impl AgentControl for SocketAgentControl {
    async fn invalidate(&self) -> Result<()> {
        let reply = tokio::time::timeout(AGENT_IO_TIMEOUT, self.send_command("kill"))
            .await
            .map_err(|_| BridgeError::OperationFailed("Agent did not respond".to_string()))??;

        debug!(socket = %self.socket_path.display(), reply = %reply, "Agent invalidated");

        if reply.is_empty() || reply.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(BridgeError::OperationFailed(format!(
                "Agent rejected kill: {}",
                reply
            )))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;
    use uuid::Uuid;

    fn temp_socket_path() -> PathBuf {
        std::env::temp_dir().join(format!("agent-{}.sock", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_missing_socket_is_error() {
        let agent = SocketAgentControl::new(temp_socket_path());
        assert!(agent.invalidate().await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_sends_kill() {
        let path = temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut command = String::new();
            stream.read_to_string(&mut command).await.unwrap();
            stream.write_all(b"ok\n").await.unwrap();
            command
        });

        let agent = SocketAgentControl::new(&path);
        agent.invalidate().await.unwrap();

        assert_eq!(server.await.unwrap(), "kill\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_agent_error_reply() {
        let path = temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut command = String::new();
            stream.read_to_string(&mut command).await.unwrap();
            stream.write_all(b"err busy\n").await.unwrap();
        });

        let agent = SocketAgentControl::new(&path);
        assert!(matches!(
            agent.invalidate().await,
            Err(BridgeError::OperationFailed(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
