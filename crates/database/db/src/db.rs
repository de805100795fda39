use super::{DatabaseConnectionProvider, DatabaseError, TXMut};

use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The [`Database`] struct is responsible for interacting with the database.
///
/// Reads go straight to the connection. Writes that span several records go through a [`TXMut`],
/// which is serialized by the write lock.
#[derive(Debug)]
pub struct Database {
    /// The underlying database connection.
    connection: DatabaseConnection,
    /// Serializes write transactions.
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Creates a new [`Database`] instance associated with the provided database URL.
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let connection = sea_orm::Database::connect(database_url).await?;
        Ok(Self::from(connection))
    }

    /// Creates a new [`TXMut`] which can be used for atomic write operations.
    pub async fn tx_mut(&self) -> Result<TXMut, DatabaseError> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.connection.begin().await?;
        Ok(TXMut::new(tx, guard))
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<(), DatabaseError> {
        tracing::info!(target: "scroll::db", "Closing database connection");
        self.connection.close().await?;
        Ok(())
    }
}

impl DatabaseConnectionProvider for Database {
    type Connection = DatabaseConnection;

    fn get_connection(&self) -> &Self::Connection {
        &self.connection
    }
}

impl From<DatabaseConnection> for Database {
    fn from(connection: DatabaseConnection) -> Self {
        Self { connection, write_lock: Arc::new(Mutex::new(())) }
    }
}
