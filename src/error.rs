use thiserror::Error;

use crate::validation::ValidationErrors;

/// 서버 메시지가 없을 때 사용자에게 보여줄 기본 문구
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl AppError {
    /// reqwest 에러를 분류 (타임아웃은 별도 variant)
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else {
            AppError::Network(err)
        }
    }

    /// 서버가 에러 본문에 담아 보낸 메시지
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AppError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// 화면에 표시할 메시지 (서버 메시지 우선, 없으면 기본 문구)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            _ => self
                .server_message()
                .unwrap_or(GENERIC_ERROR_MESSAGE)
                .to_string(),
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type AppResult<T> = Result<T, AppError>;
