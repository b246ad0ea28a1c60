use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IoError {
    Eof,
    Format(String),
    Annotation(String),
}
impl Error for IoError {}
impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IoError::Eof => write!(f, "unexpected end of input while reading tree"),
            IoError::Format(message) => write!(f, "badly formatted tree: {}", message),
            IoError::Annotation(message) => write!(f, "could not parse annotation: {}", message),
        }
    }
}
