use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[cfg(feature = "cli")]
    #[error("Error reading {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "cli")]
    #[error("Invalid JSON in {origin}: {source}")]
    InvalidJson {
        origin: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "cli")]
    #[error("Could not serialize output to JSON: {source}")]
    SerializeOutput {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dissociation constant {name}: {value} (must be finite and > 0)")]
    InvalidConstant { name: &'static str, value: f64 },

    #[cfg(feature = "cli")]
    #[error("Missing input data: provide --input or --stream-json")]
    MissingInputData,
}
