use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for PolicyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyOperation::Create => "create",
            PolicyOperation::Update => "update",
            PolicyOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Validation(String),
    Upstream {
        operation: PolicyOperation,
        policy_id: Option<String>,
        status: u16,
    },
    Timeout(PolicyOperation),
    Transport(String),
    MissingLocation,
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout(_))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            SessionError::Upstream {
                operation,
                policy_id: Some(policy_id),
                status,
            } => write!(
                f,
                "PCF rejected SM policy {} for policy {} with status {}",
                operation, policy_id, status
            ),
            SessionError::Upstream {
                operation,
                policy_id: None,
                status,
            } => write!(f, "PCF rejected SM policy {} with status {}", operation, status),
            SessionError::Timeout(operation) => {
                write!(f, "Timed out waiting for PCF SM policy {}", operation)
            }
            SessionError::Transport(msg) => write!(f, "PCF transport error: {}", msg),
            SessionError::MissingLocation => {
                write!(f, "PCF created SM policy without a Location header")
            }
        }
    }
}

impl std::error::Error for SessionError {}
