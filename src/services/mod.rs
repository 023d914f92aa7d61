pub mod path_client;
pub mod path_provider;

pub use path_client::{HttpPathClient, PathClient};
pub use path_provider::{PathProvider, StraightLineProvider};
