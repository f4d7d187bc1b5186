//! 라우트 가드
//!
//! 세션 유효성, 역할, 현재 경로만으로 동기적으로 판단하며 네트워크 요청은 하지 않습니다.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::session::{Role, Session};

pub const LOGIN_PATH: &str = "/login";
pub const PATIENT_DASHBOARD: &str = "/dashboard";
pub const DOCTOR_DASHBOARD: &str = "/doctor-dashboard";

/// 로그인 상태에서 접근 시 대시보드로 보내는 공개 페이지
static PUBLIC_ROUTES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "/",
        "/login",
        "/register",
        "/about-us",
        "/faqs",
        "/blog",
        "/contact-us",
        "/forgot-password",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(&'static str),
}

/// 쿼리스트링/해시와 끝의 슬래시 제거
pub fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.contains(normalize_path(path))
}

/// 역할별 대시보드 (알 수 없는 역할은 None)
pub fn dashboard_for(role: Role) -> Option<&'static str> {
    match role {
        Role::User => Some(PATIENT_DASHBOARD),
        Role::Doctor => Some(DOCTOR_DASHBOARD),
        Role::Unknown => None,
    }
}

/// 공개 페이지 가드: 로그인 상태면 역할별 대시보드로 이동
pub fn redirect_if_authenticated(
    session: Option<&Session>,
    path: &str,
    now: DateTime<Utc>,
) -> GuardOutcome {
    let Some(session) = session.filter(|s| s.is_valid_at(now)) else {
        return GuardOutcome::Allow;
    };

    if !is_public_route(path) {
        return GuardOutcome::Allow;
    }

    match dashboard_for(session.role) {
        Some(target) => {
            log::debug!("[Guard] {} -> {} ({})", path, target, session.role.as_str());
            GuardOutcome::Redirect(target)
        }
        None => GuardOutcome::Allow,
    }
}

/// 비공개 페이지 가드: 세션 없음 또는 역할 불일치 시 로그인으로 이동
pub fn protect(
    session: Option<&Session>,
    required_role: Option<Role>,
    now: DateTime<Utc>,
) -> GuardOutcome {
    let Some(session) = session.filter(|s| s.is_valid_at(now)) else {
        return GuardOutcome::Redirect(LOGIN_PATH);
    };

    match required_role {
        Some(role) if role != session.role => {
            log::debug!(
                "[Guard] Role {} required, session has {}",
                role.as_str(),
                session.role.as_str()
            );
            GuardOutcome::Redirect(LOGIN_PATH)
        }
        _ => GuardOutcome::Allow,
    }
}

/// 경로에 맞는 가드 적용 (공개 페이지 / 비공개 페이지)
pub fn evaluate(
    session: Option<&Session>,
    path: &str,
    required_role: Option<Role>,
    now: DateTime<Utc>,
) -> GuardOutcome {
    if is_public_route(path) {
        redirect_if_authenticated(session, path, now)
    } else {
        protect(session, required_role, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(role: Role, valid: bool) -> Session {
        let offset = if valid { Duration::hours(1) } else { Duration::hours(-1) };
        Session {
            token: "t".to_string(),
            role,
            email: None,
            expires_at: Utc::now() + offset,
        }
    }

    #[test]
    fn patient_on_login_goes_to_dashboard() {
        let s = session(Role::User, true);
        assert_eq!(
            redirect_if_authenticated(Some(&s), "/login", Utc::now()),
            GuardOutcome::Redirect("/dashboard")
        );
    }

    #[test]
    fn about_us_is_in_allow_list() {
        let s = session(Role::User, true);
        assert!(is_public_route("/about-us"));
        assert_eq!(
            redirect_if_authenticated(Some(&s), "/about-us", Utc::now()),
            GuardOutcome::Redirect("/dashboard")
        );
    }

    #[test]
    fn doctor_on_home_goes_to_doctor_dashboard() {
        let s = session(Role::Doctor, true);
        assert_eq!(
            redirect_if_authenticated(Some(&s), "/", Utc::now()),
            GuardOutcome::Redirect("/doctor-dashboard")
        );
    }

    #[test]
    fn unknown_role_and_anonymous_stay() {
        let s = session(Role::Unknown, true);
        assert_eq!(redirect_if_authenticated(Some(&s), "/login", Utc::now()), GuardOutcome::Allow);
        assert_eq!(redirect_if_authenticated(None, "/login", Utc::now()), GuardOutcome::Allow);

        let expired = session(Role::User, false);
        assert_eq!(
            redirect_if_authenticated(Some(&expired), "/login", Utc::now()),
            GuardOutcome::Allow
        );
    }

    #[test]
    fn non_public_paths_are_not_redirected_by_public_guard() {
        let s = session(Role::User, true);
        assert_eq!(
            redirect_if_authenticated(Some(&s), "/intake", Utc::now()),
            GuardOutcome::Allow
        );
    }

    #[test]
    fn path_normalization() {
        assert_eq!(normalize_path("/about-us/"), "/about-us");
        assert_eq!(normalize_path("/login?next=/dashboard"), "/login");
        assert_eq!(normalize_path("/faqs#billing"), "/faqs");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
        assert!(is_public_route("/contact-us/"));
        assert!(!is_public_route("/dashboard"));
    }

    #[test]
    fn private_pages_require_session() {
        assert_eq!(protect(None, None, Utc::now()), GuardOutcome::Redirect(LOGIN_PATH));
        let expired = session(Role::User, false);
        assert_eq!(
            protect(Some(&expired), None, Utc::now()),
            GuardOutcome::Redirect(LOGIN_PATH)
        );
    }

    #[test]
    fn role_mismatch_redirects_to_login() {
        let patient = session(Role::User, true);
        assert_eq!(
            protect(Some(&patient), Some(Role::Doctor), Utc::now()),
            GuardOutcome::Redirect(LOGIN_PATH)
        );
        assert_eq!(protect(Some(&patient), Some(Role::User), Utc::now()), GuardOutcome::Allow);
        assert_eq!(protect(Some(&patient), None, Utc::now()), GuardOutcome::Allow);
    }

    #[test]
    fn evaluate_picks_guard_by_path() {
        let doctor = session(Role::Doctor, true);
        let now = Utc::now();
        assert_eq!(
            evaluate(Some(&doctor), "/faqs", None, now),
            GuardOutcome::Redirect(DOCTOR_DASHBOARD)
        );
        assert_eq!(
            evaluate(Some(&doctor), "/doctor-dashboard", Some(Role::Doctor), now),
            GuardOutcome::Allow
        );
        assert_eq!(
            evaluate(None, "/dashboard", Some(Role::User), now),
            GuardOutcome::Redirect(LOGIN_PATH)
        );
        assert_eq!(evaluate(None, "/blog", None, now), GuardOutcome::Allow);
    }
}
