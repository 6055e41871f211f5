pub mod controller;
pub mod error;

pub use controller::{FetchFuture, LoadingPolicy, Outcome, Phase, RequestController, RequestState};
pub use error::{FetchError, NETWORK_ERROR_MESSAGE, UNKNOWN_ERROR_MESSAGE};
