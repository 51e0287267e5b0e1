pub mod config;
pub mod event;
pub mod extract;
pub mod http_client;
pub mod logging;
pub mod match_key;
pub mod normalize;
pub mod pipeline;
pub mod rte_source;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod sqlite_sink;
pub mod timeline;
