use thiserror::Error;

/// An error that can occur when reading the raw routes dump.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not exist
    #[error("could not find file {0}")]
    MissingFile(String),
    /// Generic Input/Output error while reading a file
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    /// Impossible to parse a JSON file
    #[error("impossible to read json file '{file_name}'")]
    JsonError {
        /// File name that could not be parsed as JSON
        file_name: String,
        /// The initial error by the serde_json library
        #[source]
        source: serde_json::Error,
    },
}
