use crate::database::api::{DatabaseError, DatabaseProcess, DatabaseTarget};
use crate::database::documents::{ReplicationGroupConfig, StatusDocument};
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;
use std::fmt;
use tokio::sync::Mutex;
use tokio::time::Duration;

const LOCAL_HOST: &str = "localhost";
const APP_NAME: &str = "replset-sidecar";

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DatabaseTimeouts {
    /// Establishing a connection and selecting the server.
    pub connect: Duration,
    /// The ping that proves a connected client can talk to the server.
    pub liveness: Duration,
    /// Any single administrative command.
    pub command: Duration,
}

impl DatabaseTimeouts {
    /// Bound on the first ping of a new client. The driver connects lazily, so that ping carries
    /// the connection handshake as well.
    pub fn handshake(&self) -> Duration {
        self.connect + self.liveness
    }
}

#[derive(Clone, PartialEq)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// MongoDatabase talks to mongod processes over direct (non-topology-discovering) connections.
///
/// The connection to the local process is created once and reused for every cycle. Remote
/// replicas are only queried during bootstrap, over short-lived connections.
pub struct MongoDatabase {
    logger: slog::Logger,
    port: u16,
    credentials: Option<DatabaseCredentials>,
    timeouts: DatabaseTimeouts,
    // Guards creation of the local client so that it is never connected twice.
    local_client: Mutex<Option<Client>>,
}

impl MongoDatabase {
    pub fn new(
        logger: slog::Logger,
        port: u16,
        credentials: Option<DatabaseCredentials>,
        timeouts: DatabaseTimeouts,
    ) -> Self {
        MongoDatabase {
            logger,
            port,
            credentials,
            timeouts,
            local_client: Mutex::new(None),
        }
    }

    async fn local_client(&self) -> Result<Client, DatabaseError> {
        let mut local_client = self.local_client.lock().await;
        if let Some(client) = local_client.as_ref() {
            return Ok(client.clone());
        }

        let client = self.direct_connect(LOCAL_HOST).await?;
        slog::info!(self.logger, "Connected to local database on port {}", self.port);
        local_client.replace(client.clone());

        Ok(client)
    }

    async fn direct_connect(&self, host: &str) -> Result<Client, DatabaseError> {
        let credential = self.credentials.as_ref().map(|c| {
            Credential::builder()
                .username(c.username.clone())
                .password(c.password.clone())
                .source("admin".to_string())
                .build()
        });

        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: host.to_string(),
                port: Some(self.port),
            }])
            .direct_connection(true)
            .connect_timeout(self.timeouts.connect)
            .server_selection_timeout(self.timeouts.connect)
            .app_name(APP_NAME.to_string())
            .credential(credential)
            .build();

        let client = Client::with_options(options).map_err(|e| DatabaseError::Unreachable {
            address: host.to_string(),
            reason: e.to_string(),
        })?;

        if let Err(e) = self
            .run_command(&client, host, "ping", doc! { "ping": 1 }, self.timeouts.handshake())
            .await
        {
            client.shutdown().await;
            return Err(e);
        }

        Ok(client)
    }

    async fn run_command(
        &self,
        client: &Client,
        address: &str,
        operation: &'static str,
        command: Document,
        timeout: Duration,
    ) -> Result<Document, DatabaseError> {
        slog::debug!(self.logger, "Running '{}' against '{}'", operation, address);

        let admin = client.database("admin");
        match tokio::time::timeout(timeout, admin.run_command(command, None)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(convert_driver_error(address, e)),
            Err(_) => Err(DatabaseError::Timeout {
                operation,
                address: address.to_string(),
                timeout,
            }),
        }
    }

    async fn run_local_command(&self, operation: &'static str, command: Document) -> Result<Document, DatabaseError> {
        let client = self.local_client().await?;
        self.run_command(&client, LOCAL_HOST, operation, command, self.timeouts.command)
            .await
    }
}

#[async_trait::async_trait]
impl DatabaseProcess for MongoDatabase {
    async fn replication_status(&self, target: &DatabaseTarget) -> Result<StatusDocument, DatabaseError> {
        slog::debug!(self.logger, "Querying replication status of {}", target);
        let command = doc! { "replSetGetStatus": 1 };

        let reply = match target {
            DatabaseTarget::Local => self.run_local_command("replSetGetStatus", command).await,
            DatabaseTarget::Remote(address) => {
                // Remote clients are used once and closed here rather than on drop.
                let client = self.direct_connect(address).await?;
                let reply = self
                    .run_command(&client, address, "replSetGetStatus", command, self.timeouts.command)
                    .await;
                client.shutdown().await;
                reply
            }
        };

        let status = StatusDocument::from_document(reply?)?;
        slog::debug!(
            self.logger,
            "{} reports group '{}' with {} members",
            target,
            status.group_id,
            status.members.len()
        );
        Ok(status)
    }

    async fn replication_config(&self) -> Result<ReplicationGroupConfig, DatabaseError> {
        let reply = self
            .run_local_command("replSetGetConfig", doc! { "replSetGetConfig": 1 })
            .await?;

        ReplicationGroupConfig::from_get_config_reply(reply)
    }

    async fn reconfigure(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError> {
        let command = doc! { "replSetReconfig": config.to_document()? };
        self.run_local_command("replSetReconfig", command).await?;
        Ok(())
    }

    async fn initiate(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError> {
        let command = doc! { "replSetInitiate": config.to_document()? };
        self.run_local_command("replSetInitiate", command).await?;
        Ok(())
    }
}

fn convert_driver_error(address: &str, e: mongodb::error::Error) -> DatabaseError {
    match e.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            DatabaseError::from_command_failure(command_error.code, &command_error.code_name, &command_error.message)
        }
        _ => DatabaseError::Unreachable {
            address: address.to_string(),
            reason: e.to_string(),
        },
    }
}
