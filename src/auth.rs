use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::PatientRegistration;
use crate::session::{Role, Session};
use crate::validation;

/// 로그인 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    role: Role,
    #[serde(default)]
    email: Option<String>,
    expires_at: DateTime<Utc>,
}

/// 이메일/비밀번호로 로그인
pub async fn login(api: &ApiClient, email: &str, password: &str) -> AppResult<Session> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Custom("Email and password are required".to_string()));
    }

    let body = serde_json::json!({
        "email": email.trim(),
        "password": password
    });

    let response: LoginResponse = api.post("/auth/login", &body).await.map_err(|e| {
        log::error!("[Auth] Login failed: {}", e);
        e
    })?;

    let session = Session {
        token: response.token,
        role: response.role,
        email: response.email.or_else(|| Some(email.trim().to_string())),
        expires_at: response.expires_at,
    };

    if !session.is_valid_at(Utc::now()) {
        return Err(AppError::Custom("Received an expired session".to_string()));
    }

    api.session().set(session.clone())?;
    log::info!("[Auth] User logged in successfully ({})", session.role.as_str());
    Ok(session)
}

/// 환자 회원가입 (로컬 검증 통과 시에만 전송)
pub async fn register(api: &ApiClient, record: &PatientRegistration) -> AppResult<()> {
    validation::validate_registration(record).map_err(AppError::Validation)?;

    api.post_status("/auth/register", record).await?;
    log::info!("[Auth] Registration submitted");
    Ok(())
}

/// 로그아웃 (서버 요청 없이 로컬 세션만 정리)
pub fn logout(api: &ApiClient) -> AppResult<()> {
    api.session().clear()?;
    log::info!("[Auth] User logged out");
    Ok(())
}
