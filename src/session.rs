//! 세션 컨텍스트
//!
//! 로그인 시 설정, 로그아웃 시 해제, 그 외에는 읽기 전용으로 사용하는 명시적 세션 객체입니다.
//! 토큰은 불투명 값으로 취급하며 만료 시각만 로컬에서 확인합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppError, AppResult};

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Doctor,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Doctor => "doctor",
            Role::Unknown => "unknown",
        }
    }
}

/// 클라이언트가 보관하는 인증 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }
}

/// 세션 파일 (로컬에 저장하는 유일한 데이터)
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 컴포넌트 간에 공유하는 세션 핸들 (clone 가능)
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
    file: Option<SessionFile>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(file: SessionFile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            file: Some(file),
        }
    }

    /// 앱 시작 시 저장된 세션 복원 (만료된 세션은 폐기)
    pub fn restore(file: SessionFile, now: DateTime<Utc>) -> AppResult<Self> {
        let context = Self::with_file(file);
        let stored = match context.file.as_ref().map(SessionFile::load).transpose() {
            Ok(stored) => stored.flatten(),
            Err(e) => {
                log::warn!("[Session] Stored session unreadable, ignoring: {}", e);
                None
            }
        };

        match stored {
            Some(session) if session.is_valid_at(now) => {
                log::info!("[Session] Restored session ({})", session.role.as_str());
                *context.write()? = Some(session);
            }
            Some(_) => {
                log::info!("[Session] Stored session expired, discarding");
                if let Some(ref file) = context.file {
                    file.clear()?;
                }
            }
            None => {}
        }

        Ok(context)
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Option<Session>>> {
        self.inner
            .read()
            .map_err(|_| AppError::Custom("Session lock error".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Option<Session>>> {
        self.inner
            .write()
            .map_err(|_| AppError::Custom("Session lock error".to_string()))
    }

    /// 로그인 성공 시 호출
    pub fn set(&self, session: Session) -> AppResult<()> {
        if let Some(ref file) = self.file {
            file.save(&session)?;
        }
        *self.write()? = Some(session);
        Ok(())
    }

    /// 로그아웃
    pub fn clear(&self) -> AppResult<()> {
        *self.write()? = None;
        if let Some(ref file) = self.file {
            file.clear()?;
        }
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.read().ok()?.clone()
    }

    /// 만료되지 않은 세션만 반환
    pub fn valid_session(&self, now: DateTime<Utc>) -> Option<Session> {
        self.current().filter(|s| s.is_valid_at(now))
    }

    pub fn bearer_token(&self, now: DateTime<Utc>) -> Option<String> {
        self.valid_session(now).map(|s| s.token)
    }
}
