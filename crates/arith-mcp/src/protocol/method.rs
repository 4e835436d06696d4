//! The closed set of methods the dispatcher understands.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Shutdown,
    ListTools,
    Execute,
    Unknown(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Initialize => "initialize",
            Method::Shutdown => "shutdown",
            Method::ListTools => "list_tools",
            Method::Execute => "execute",
            Method::Unknown(name) => name,
        }
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "shutdown" => Method::Shutdown,
            "list_tools" => Method::ListTools,
            "execute" => Method::Execute,
            other => Method::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
