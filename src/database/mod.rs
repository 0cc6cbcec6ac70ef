pub mod connection;
pub mod operations;

pub use connection::connect;
pub use operations::PostgresStore;
