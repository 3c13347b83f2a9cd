use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to spawn context worker thread '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("context worker thread '{name}' panicked")]
    WorkerPanicked { name: String },

    #[error("host '{hostname}' does not share the context worker's running flag")]
    ForeignRunningFlag { hostname: String },
}
