use mongodb::{
    Client, ClientSession, Collection, Database,
    options::{ReadPreference, SessionOptions},
};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::config::StoreConfig;
use crate::driver::{ConnectOptions, Driver, MongoDriver};
use crate::error::{StoreError, StoreResult};

/// Live client plus the handle of the configured database
struct Connection {
    client: Client,
    database: Database,
}

/// Owns the lifecycle of one MongoDB connection
///
/// A store starts idle. [`start`](MongoStore::start) connects and pings the primary within
/// the configured `conn_timeout`; [`shutdown`](MongoStore::shutdown) always brings it back to idle.
/// Lifecycle methods take `&mut self`, so one owner drives the transitions while shared
/// references can use the capability methods once the store is running.
///
/// # Example
/// ```ignore
/// use mongo_store::{MongoStore, StoreConfig};
///
/// let mut store = MongoStore::new(config);
/// store.start().await?;
/// let users = store.collection::<Document>("users")?;
/// // ...
/// store.shutdown().await;
/// ```
pub struct MongoStore<D: Driver = MongoDriver> {
    config: StoreConfig,
    options: ConnectOptions,
    driver: D,
    connection: Option<Connection>,
}

impl MongoStore<MongoDriver> {
    /// Create an idle store using the official driver. No I/O happens here.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_driver(config, MongoDriver)
    }

    /// Validate `config`, then create and start a store
    ///
    /// # Example
    /// ```ignore
    /// use core_config::FromEnv;
    /// use mongo_store::{MongoStore, StoreConfig};
    ///
    /// let store = MongoStore::connect(StoreConfig::from_env()?).await?;
    /// ```
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        config.check()?;
        let mut store = Self::new(config);
        store.start().await?;
        Ok(store)
    }
}

impl<D: Driver> MongoStore<D> {
    /// Create an idle store on top of a custom [`Driver`]
    pub fn with_driver(config: StoreConfig, driver: D) -> Self {
        let options = ConnectOptions::from_config(&config);
        Self {
            config,
            options,
            driver,
            connection: None,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Connect and verify the primary answers, bounded by `conn_timeout`
    ///
    /// On any failure the store stays idle and can be started again.
    /// Starting a running store fails with [`StoreError::AlreadyRunning`] and leaves the
    /// existing connection in place.
    #[instrument(
        skip(self),
        fields(host = %self.config.host, port = %self.config.port, db = %self.config.db)
    )]
    pub async fn start(&mut self) -> StoreResult<()> {
        if self.connection.is_some() {
            warn!("Start requested while the store is already running");
            return Err(StoreError::AlreadyRunning);
        }

        let deadline = self.config.conn_timeout;
        info!(timeout_ms = deadline.as_millis() as u64, "Connecting to MongoDB");

        let started = Instant::now();
        let result = tokio::time::timeout(deadline, self.open()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let client = match result {
            Ok(Ok(client)) => client,
            Ok(Err(err)) => {
                warn!(error = %err, elapsed_ms, "Failed to connect to MongoDB");
                return Err(err.into());
            }
            Err(_) => {
                warn!(elapsed_ms, "Timed out connecting to MongoDB");
                return Err(StoreError::DeadlineExceeded(deadline));
            }
        };

        let database = client.database(&self.config.db);
        self.connection = Some(Connection { client, database });

        info!(elapsed_ms, "Connected to MongoDB");
        Ok(())
    }

    /// Create a client and ping it; a client whose ping fails is shut down before returning
    async fn open(&self) -> mongodb::error::Result<Client> {
        let client = self.driver.connect(&self.options).await?;

        if let Err(err) = self.driver.ping(&client, ReadPreference::Primary).await {
            if let Err(disconnect_err) = self.driver.disconnect(client).await {
                debug!(error = %disconnect_err, "Failed to discard unverified client");
            }
            return Err(err);
        }

        Ok(client)
    }

    pub fn is_running(&self) -> bool {
        self.connection.is_some()
    }

    /// Disconnect if connected and return to idle
    ///
    /// Never fails: disconnect errors are logged and the store is idle afterwards either way.
    #[instrument(skip(self), fields(host = %self.config.host, port = %self.config.port))]
    pub async fn shutdown(&mut self) {
        let Some(connection) = self.connection.take() else {
            debug!("Shutdown requested on an idle store");
            return;
        };

        match self.driver.disconnect(connection.client).await {
            Ok(()) => info!("Disconnected from MongoDB"),
            Err(err) => error!(error = %err, "Failed to disconnect from MongoDB"),
        }
    }

    fn connection(&self) -> StoreResult<&Connection> {
        self.connection.as_ref().ok_or(StoreError::NotRunning)
    }

    /// The underlying client
    pub fn client(&self) -> StoreResult<&Client> {
        Ok(&self.connection()?.client)
    }

    /// Handle for the configured database
    pub fn database(&self) -> StoreResult<&Database> {
        Ok(&self.connection()?.database)
    }

    /// Collection `name` in the configured database
    pub fn collection<T: Send + Sync>(&self, name: &str) -> StoreResult<Collection<T>> {
        Ok(self.connection()?.database.collection::<T>(name))
    }

    /// Start a client session, e.g. for a transaction
    pub async fn start_session(
        &self,
        options: Option<SessionOptions>,
    ) -> StoreResult<ClientSession> {
        let session = self
            .connection()?
            .client
            .start_session()
            .with_options(options)
            .await?;
        Ok(session)
    }

    /// Ping the server selected by `read_preference`
    pub async fn ping(&self, read_preference: ReadPreference) -> StoreResult<()> {
        let connection = self.connection()?;
        self.driver.ping(&connection.client, read_preference).await?;
        Ok(())
    }
}
