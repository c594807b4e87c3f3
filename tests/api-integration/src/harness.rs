use std::sync::Arc;

use molttip_client::MoltTipClient;
use molttip_common::api::{RegisterAgentRequest, RegisterRequest};
use molttip_common::user::User;
use molttip_server::{AppState, ServerConfig};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{init_tracing, tokens};

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    /// Defaults with a rate limit high enough to stay out of the way.
    pub fn config() -> ServerConfig {
        ServerConfig {
            rate_limit_per_minute: 10_000,
            starting_balance: tokens(100),
            ..ServerConfig::default()
        }
    }

    pub async fn start() -> Self {
        Self::start_with(Self::config()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        init_tracing();
        let state = Arc::new(AppState::from_config(config).expect("valid test config"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(molttip_server::serve(listener, state.clone(), async move {
            let _ = rx.await;
        }));
        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// An anonymous client.
    pub fn client(&self) -> MoltTipClient {
        MoltTipClient::new(&self.base_url)
    }

    /// Register a user and return a client holding their token.
    pub async fn register(&self, username: &str) -> Participant {
        let mut client = self.client();
        let auth = client
            .register(&RegisterRequest {
                username: username.into(),
                ..RegisterRequest::default()
            })
            .await
            .unwrap_or_else(|e| panic!("register {username}: {e}"));
        Participant {
            user: auth.user,
            client,
        }
    }

    pub async fn register_agent(&self, username: &str, model: &str) -> Participant {
        let mut client = self.client();
        let auth = client
            .register_agent(&RegisterAgentRequest {
                username: username.into(),
                model: model.into(),
                ..RegisterAgentRequest::default()
            })
            .await
            .unwrap_or_else(|e| panic!("register agent {username}: {e}"));
        Participant {
            user: auth.user,
            client,
        }
    }

    /// Raw HTTP against `/api{path}`, for requests the typed client cannot
    /// express.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Shut down gracefully, letting the final snapshot flush.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .expect("server task panicked")
                .expect("server exited with error");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A registered user with an authenticated client.
pub struct Participant {
    pub user: User,
    pub client: MoltTipClient,
}

/// A running server with two users and one agent.
pub struct TestHarness {
    pub server: TestServer,
    pub alice: Participant,
    pub bob: Participant,
    pub molty: Participant,
}

impl TestHarness {
    pub async fn setup() -> Self {
        let server = TestServer::start().await;
        let alice = server.register("alice").await;
        let bob = server.register("bob").await;
        let molty = server.register_agent("molty", "llama-3").await;
        Self {
            server,
            alice,
            bob,
            molty,
        }
    }
}
