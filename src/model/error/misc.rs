use macros::traceable;

traceable! {
    MiscError {
        #[error("Failed to serialize value: {err}")]
        SerializeError => tracing::Level::ERROR,

        #[error("Failed to deserialize value: {err}")]
        DeserializeError => tracing::Level::ERROR,
    }
}
