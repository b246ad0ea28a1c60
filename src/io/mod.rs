use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod parser;
pub mod writer;

/// How the label following a closing parenthesis is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalLabels {
    /// Internal node names
    Names,
    /// Support values of the branch above the node
    Support,
    /// Read and discarded
    Ignore,
}

impl Default for InternalLabels {
    fn default() -> Self {
        InternalLabels::Names
    }
}

impl FromStr for InternalLabels {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "names" => Ok(InternalLabels::Names),
            "support" => Ok(InternalLabels::Support),
            "ignore" => Ok(InternalLabels::Ignore),
            _ => Err(format!("unknown internal label convention: {}", s)),
        }
    }
}

impl fmt::Display for InternalLabels {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InternalLabels::Names => write!(f, "names"),
            InternalLabels::Support => write!(f, "support"),
            InternalLabels::Ignore => write!(f, "ignore"),
        }
    }
}
