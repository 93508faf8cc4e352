use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),
}
