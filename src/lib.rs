pub mod api;
pub mod assessments;
pub mod auth;
pub mod cancel;
pub mod config;
pub mod error;
pub mod guards;
pub mod intake;
pub mod models;
pub mod scheduling;
pub mod session;
pub mod timefmt;
pub mod validation;

use chrono::Utc;

use api::ApiClient;
use config::PortalConfig;
use error::AppResult;
use guards::GuardOutcome;
use intake::IntakeFlow;
use models::PatientRegistration;
use scheduling::SchedulingStore;
use session::{Role, Session, SessionContext, SessionFile};

pub use error::AppError;

/// 포털 클라이언트 진입점
///
/// 설정으로부터 HTTP 클라이언트, 세션, 인테이크 흐름, 스케줄 저장소를 구성합니다.
#[derive(Debug, Clone)]
pub struct Portal {
    api: ApiClient,
    intake: IntakeFlow,
    scheduling: SchedulingStore,
}

impl Portal {
    pub fn new(config: PortalConfig) -> AppResult<Self> {
        let session = match config.session_file {
            Some(ref path) => SessionContext::restore(SessionFile::new(path), Utc::now())?,
            None => SessionContext::new(),
        };

        let api = ApiClient::new(&config, session)?;
        log::info!("[Portal] Initialized against {}", config.api_base_url);

        Ok(Self {
            intake: IntakeFlow::new(api.clone()),
            scheduling: SchedulingStore::new(api.clone()),
            api,
        })
    }

    /// 환경 변수 기반 초기화
    pub fn from_env() -> AppResult<Self> {
        Self::new(PortalConfig::from_env()?)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        self.api.session()
    }

    pub fn intake(&self) -> &IntakeFlow {
        &self.intake
    }

    pub fn scheduling(&self) -> &SchedulingStore {
        &self.scheduling
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        auth::login(&self.api, email, password).await
    }

    /// 환자 회원가입 (검증 실패 시 요청 없음)
    pub async fn register(&self, record: &PatientRegistration) -> AppResult<()> {
        auth::register(&self.api, record).await
    }

    /// 로그아웃 시 진행 중인 인테이크 제출도 취소
    pub fn logout(&self) -> AppResult<()> {
        self.intake.abandon();
        auth::logout(&self.api)
    }

    /// 화면 이동 시 라우트 가드 평가
    pub fn navigate(&self, path: &str, required_role: Option<Role>) -> GuardOutcome {
        let session = self.session().current();
        guards::evaluate(session.as_ref(), path, required_role, Utc::now())
    }
}
