mod host_config;
mod host_contexts;

pub use host_config::HostConfig;
pub use host_contexts::HostContexts;
