pub mod applications;
pub mod connection;
pub mod dispatches;
pub mod store;
