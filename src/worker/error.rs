use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerErrorCode {
    InvalidConfig,
    Network,
    CacheStorage,
    Notification,
    Clients,
    Internal,
}

impl WorkerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerErrorCode::InvalidConfig => "sw/invalid-config",
            WorkerErrorCode::Network => "sw/network",
            WorkerErrorCode::CacheStorage => "sw/cache-storage",
            WorkerErrorCode::Notification => "sw/notification",
            WorkerErrorCode::Clients => "sw/clients",
            WorkerErrorCode::Internal => "sw/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerError {
    pub code: WorkerErrorCode,
    message: String,
}

impl WorkerError {
    pub fn new(code: WorkerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for WorkerError {}

pub type WorkerResult<T> = Result<T, WorkerError>;

pub fn invalid_config(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidConfig, message)
}

pub fn network_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Network, message)
}

pub fn cache_storage_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::CacheStorage, message)
}

pub fn notification_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Notification, message)
}

pub fn clients_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Clients, message)
}

pub fn internal_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Internal, message)
}
