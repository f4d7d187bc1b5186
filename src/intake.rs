//! 인테이크 진행 상태 머신
//!
//! 서버가 보고한 `IntakeStatus` 를 명시적인 상태로 변환하고, 각 화면의 제출을 관리합니다.
//! 화면마다 busy 플래그로 동시에 하나의 제출만 허용하며, 자동 재시도는 하지 않습니다.

use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::cancel::CancelToken;
use crate::error::{AppError, AppResult};
use crate::models::{IntakeStatus, MedicalConsultation, PhysicalMeasurements};
use crate::validation::{self, ValidationErrors};

/// 인테이크 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    /// 세션이 없는 신규 방문자
    NotStarted,
    /// 1단계 (진료 상담) 대기
    Screen1Pending,
    /// 2단계 (신체 계측) 대기
    Screen2Pending,
    Complete,
}

impl IntakeState {
    pub fn from_status(status: &IntakeStatus) -> Self {
        match (status.has_completed_intake, status.needs_screen2) {
            (true, false) => IntakeState::Complete,
            (true, true) => {
                log::warn!("[Intake] Inconsistent status (completed but needs screen 2), treating as complete");
                IntakeState::Complete
            }
            (false, true) => IntakeState::Screen2Pending,
            (false, false) => IntakeState::Screen1Pending,
        }
    }

    /// 이 단계에서 보여줄 화면
    pub fn screen(&self) -> Option<Screen> {
        match self {
            IntakeState::NotStarted | IntakeState::Screen1Pending => Some(Screen::Consultation),
            IntakeState::Screen2Pending => Some(Screen::Measurements),
            IntakeState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, IntakeState::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Consultation,
    Measurements,
}

impl Screen {
    fn index(self) -> usize {
        match self {
            Screen::Consultation => 0,
            Screen::Measurements => 1,
        }
    }
}

/// 제출 결과
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 상태를 다시 조회하여 다음 단계로 이동
    Advanced(IntakeState),
    /// 완료 콜백에 이동을 위임
    Delegated,
    /// 이미 제출 중이라 무시됨
    Ignored,
    /// 로컬 검증 실패 (요청 없음)
    Invalid(ValidationErrors),
    /// 서버/네트워크 오류 (같은 화면 유지)
    Rejected(String),
    /// 화면을 벗어나 취소됨
    Cancelled,
}

/// 완료 콜백 (부모 화면의 이동 처리)
pub type OnComplete = Box<dyn FnOnce() + Send>;

#[derive(Debug)]
struct FlowState {
    state: IntakeState,
    error: Option<String>,
}

#[derive(Debug)]
struct Shared {
    flow: Mutex<FlowState>,
    busy: [AtomicBool; 2],
    inflight: Mutex<[Option<CancelToken>; 2]>,
}

/// busy 플래그 RAII 가드 (drop 시 해제)
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// 인테이크 화면 흐름 (clone 하면 같은 상태를 공유)
#[derive(Debug, Clone)]
pub struct IntakeFlow {
    api: ApiClient,
    shared: Arc<Shared>,
}

impl IntakeFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            shared: Arc::new(Shared {
                flow: Mutex::new(FlowState {
                    state: IntakeState::NotStarted,
                    error: None,
                }),
                busy: [AtomicBool::new(false), AtomicBool::new(false)],
                inflight: Mutex::new([None, None]),
            }),
        }
    }

    fn flow(&self) -> AppResult<MutexGuard<'_, FlowState>> {
        self.shared
            .flow
            .lock()
            .map_err(|_| AppError::Custom("Intake state lock error".to_string()))
    }

    pub fn state(&self) -> IntakeState {
        self.flow()
            .map(|f| f.state)
            .unwrap_or(IntakeState::NotStarted)
    }

    /// 마지막 제출/조회 오류 메시지
    pub fn error(&self) -> Option<String> {
        self.flow().ok().and_then(|f| f.error.clone())
    }

    pub fn is_busy(&self, screen: Screen) -> bool {
        self.shared.busy[screen.index()].load(Ordering::SeqCst)
    }

    fn set_state(&self, state: IntakeState) {
        if let Ok(mut flow) = self.flow() {
            if flow.state != state {
                log::info!("[Intake] {:?} -> {:?}", flow.state, state);
            }
            flow.state = state;
            flow.error = None;
        }
    }

    fn set_error(&self, message: String) {
        if let Ok(mut flow) = self.flow() {
            flow.error = Some(message);
        }
    }

    /// 화면 진입 시 서버 상태 조회
    ///
    /// 유효한 세션이 없으면 요청 없이 `NotStarted`.
    pub async fn load(&self) -> AppResult<IntakeState> {
        if self.api.session().valid_session(Utc::now()).is_none() {
            self.set_state(IntakeState::NotStarted);
            return Ok(IntakeState::NotStarted);
        }

        match self.api.intake_status().await {
            Ok(status) => {
                let state = IntakeState::from_status(&status);
                self.set_state(state);
                Ok(state)
            }
            Err(e) => {
                log::error!("[Intake] Status check failed: {}", e);
                self.set_error(e.user_message());
                Err(e)
            }
        }
    }

    /// 1단계: 진료 상담 제출
    pub async fn submit_consultation(
        &self,
        data: &MedicalConsultation,
        on_complete: Option<OnComplete>,
    ) -> SubmitOutcome {
        let api = self.api.clone();
        self.submit(
            Screen::Consultation,
            validation::validate_consultation(data),
            async move { api.submit_medical_consultation(data).await },
            on_complete,
        )
        .await
    }

    /// 2단계: 신체 계측 제출
    pub async fn submit_measurements(
        &self,
        data: &PhysicalMeasurements,
        on_complete: Option<OnComplete>,
    ) -> SubmitOutcome {
        let api = self.api.clone();
        self.submit(
            Screen::Measurements,
            validation::validate_measurements(data),
            async move { api.submit_physical_measurements(data).await },
            on_complete,
        )
        .await
    }

    async fn submit<F>(
        &self,
        screen: Screen,
        checked: Result<(), ValidationErrors>,
        request: F,
        on_complete: Option<OnComplete>,
    ) -> SubmitOutcome
    where
        F: Future<Output = AppResult<()>>,
    {
        // 제출 중에는 no-op
        let Some(_guard) = BusyGuard::acquire(&self.shared.busy[screen.index()]) else {
            log::debug!("[Intake] {:?} submission ignored, already in flight", screen);
            return SubmitOutcome::Ignored;
        };

        if let Err(errors) = checked {
            return SubmitOutcome::Invalid(errors);
        }

        let token = CancelToken::new();
        self.track(screen, Some(token.clone()));
        let result = token.run(request).await;
        self.track(screen, None);

        match result {
            Ok(()) => {
                log::info!("[Intake] {:?} submitted", screen);
                if let Ok(mut flow) = self.flow() {
                    flow.error = None;
                }
                match on_complete {
                    Some(callback) => {
                        callback();
                        SubmitOutcome::Delegated
                    }
                    None => match self.load().await {
                        Ok(state) => SubmitOutcome::Advanced(state),
                        Err(e) => SubmitOutcome::Rejected(e.user_message()),
                    },
                }
            }
            Err(AppError::Cancelled) => {
                log::info!("[Intake] {:?} submission cancelled", screen);
                SubmitOutcome::Cancelled
            }
            Err(e) => {
                log::warn!("[Intake] {:?} submission failed: {}", screen, e);
                let message = e.user_message();
                self.set_error(message.clone());
                SubmitOutcome::Rejected(message)
            }
        }
    }

    fn track(&self, screen: Screen, token: Option<CancelToken>) {
        if let Ok(mut inflight) = self.shared.inflight.lock() {
            inflight[screen.index()] = token;
        }
    }

    /// 화면을 벗어날 때 진행 중인 제출 취소
    pub fn abandon(&self) {
        if let Ok(inflight) = self.shared.inflight.lock() {
            for token in inflight.iter().flatten() {
                token.cancel();
            }
        }
    }
}
