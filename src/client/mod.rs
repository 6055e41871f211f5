pub mod execution_client;

pub use execution_client::ExecutionClient;
