pub mod batch;
pub mod client;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod paths;
pub mod project;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod services;
pub mod settings;
pub mod state;
pub mod store;
pub mod transport;
