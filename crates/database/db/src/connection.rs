/// The [`DatabaseConnectionProvider`] trait provides a way to get a connection to the database.
/// This is implemented by the [`crate::Database`] and [`crate::TXMut`] types.
pub trait DatabaseConnectionProvider {
    /// The type of the underlying connection.
    type Connection: sea_orm::ConnectionTrait + sea_orm::StreamTrait + Sync;

    /// Returns a reference to the database connection that implements the `ConnectionTrait` and
    /// `StreamTrait` traits.
    fn get_connection(&self) -> &Self::Connection;
}
