//! Error types for the MyTarot application
//!
//! Every fallible operation in the library returns [`TarotError`]. The UI never
//! shows the raw error text; it shows [`TarotError::user_message`] instead.

use thiserror::Error;

/// MyTarot application errors
#[derive(Error, Debug, Clone)]
pub enum TarotError {
    /// Invalid or missing configuration (including a missing API key)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The interpretation request could not be sent or timed out
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The interpretation service answered with a non-success status
    #[error("API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// The interpretation service answered with a body we cannot use
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// Speech recognition failed or produced nothing
    #[error("Speech recognition error: {0}")]
    SpeechError(String),

    /// Audio device initialization or operation error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Channel communication error between the UI and a worker
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for TarotError {
    fn from(e: std::io::Error) -> Self {
        TarotError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for TarotError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TarotError::HttpError(format!("request timed out: {}", e))
        } else if e.is_decode() {
            TarotError::MalformedResponse(e.to_string())
        } else {
            TarotError::HttpError(e.to_string())
        }
    }
}

impl TarotError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors are worth a retry from the UI; the others need the
    /// user to fix something (configuration, devices) first.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TarotError::ConfigError(_) => false,
            // Transport errors are typically transient
            TarotError::HttpError(_) => true,
            // 5xx and 429 are worth retrying, auth and request errors are not
            TarotError::ApiStatus { status, .. } => *status == 429 || *status >= 500,
            TarotError::MalformedResponse(_) => true,
            TarotError::SpeechError(_) => true,
            TarotError::AudioDeviceError(_) => false,
            TarotError::ChannelError(_) => false,
            TarotError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    ///
    /// Returns a message suitable for display in the UI.
    pub fn user_message(&self) -> String {
        match self {
            TarotError::ConfigError(_) => {
                "설정이 올바르지 않습니다. API 키와 설정 파일을 확인해주세요.".to_string()
            }
            TarotError::HttpError(_) => {
                "타로 마스터와 연결하지 못했습니다. 네트워크를 확인하고 다시 시도해주세요.".to_string()
            }
            TarotError::ApiStatus { status, .. } if *status == 401 || *status == 403 => {
                "API 인증에 실패했습니다. API 키를 확인해주세요.".to_string()
            }
            TarotError::ApiStatus { status, .. } if *status == 429 => {
                "요청이 너무 많습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            TarotError::ApiStatus { .. } | TarotError::MalformedResponse(_) => {
                "해석을 받아오지 못했습니다. 다시 시도해주세요.".to_string()
            }
            TarotError::SpeechError(_) => {
                "음성을 인식하지 못했습니다. 다시 말씀하시거나 직접 입력해주세요.".to_string()
            }
            TarotError::AudioDeviceError(_) => {
                "마이크를 사용할 수 없습니다. 질문을 직접 입력해주세요.".to_string()
            }
            TarotError::ChannelError(_) => {
                "내부 통신 오류가 발생했습니다. 앱을 다시 시작해주세요.".to_string()
            }
            TarotError::IOError(_) => "파일을 읽는 중 오류가 발생했습니다.".to_string(),
        }
    }
}

/// Result type alias for MyTarot operations
pub type Result<T> = std::result::Result<T, TarotError>;
