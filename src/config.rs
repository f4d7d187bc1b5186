//! 포털 설정
//!
//! API 기본 주소, 요청 타임아웃, 세션 파일 위치를 관리합니다.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// 버전이 포함된 API 기본 주소 (예: https://api.example.com/api/v1)
    pub api_base_url: String,
    /// 요청별 최대 대기 시간
    pub request_timeout: Duration,
    /// None 이면 세션을 메모리에만 보관
    pub session_file: Option<PathBuf>,
}

impl PortalConfig {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: default_session_path(),
        }
    }

    /// .env 및 환경 변수에서 설정 로드
    ///
    /// - `PORTAL_API_BASE_URL` (필수)
    /// - `PORTAL_REQUEST_TIMEOUT_SECS` (선택, 양의 정수)
    /// - `PORTAL_SESSION_FILE` (선택, `none` 이면 저장 안 함)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let base_url = lookup("PORTAL_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Custom("PORTAL_API_BASE_URL is not set".to_string()))?;

        let mut config = Self::new(base_url.trim());

        if let Some(raw) = lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AppError::Custom(format!("Invalid PORTAL_REQUEST_TIMEOUT_SECS: {}", raw))
            })?;
            if secs == 0 {
                return Err(AppError::Custom(
                    "PORTAL_REQUEST_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        match lookup("PORTAL_SESSION_FILE").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("none") => config.session_file = None,
            Some(v) if !v.is_empty() => config.session_file = Some(PathBuf::from(v)),
            _ => {}
        }

        log::debug!(
            "[Config] api={} timeout={:?} session_file={:?}",
            config.api_base_url,
            config.request_timeout,
            config.session_file
        );
        Ok(config)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    pub fn without_session_file(mut self) -> Self {
        self.session_file = None;
        self
    }

    /// 기본 주소 + 경로
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

/// 기본 세션 파일 경로
fn default_session_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("telehealth-portal").join("session.json"))
}
