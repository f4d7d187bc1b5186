//! 스케줄/슬롯 상태 컨테이너
//!
//! 생성 결과는 목록에 누적(append)하고, 예약 가능 슬롯 조회 결과는 목록 전체를 교체합니다.
//! 각 요청은 pending -> fulfilled/rejected 순서를 따르며, 종료 시 항상 loading 을 해제합니다.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::timefmt;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Default)]
pub struct SchedulingState {
    pub schedules: Vec<Schedule>,
    pub slots: Vec<Slot>,
    pub available_slots: Vec<AvailableSlot>,
    pub appointments: Vec<Appointment>,
    /// 진행 중인 요청 수
    pub pending: usize,
    pub error: Option<String>,
}

impl SchedulingState {
    pub fn loading(&self) -> bool {
        self.pending > 0
    }
}

/// 진행 중 요청 카운터 가드 (요청 future 가 중간에 drop 되어도 해제)
struct PendingGuard<'a> {
    state: &'a Mutex<SchedulingState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.pending = state.pending.saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulingStore {
    api: ApiClient,
    state: Arc<Mutex<SchedulingState>>,
}

impl SchedulingStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SchedulingState::default())),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, SchedulingState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Custom("Scheduling state lock error".to_string()))
    }

    /// 현재 상태 스냅샷
    pub fn snapshot(&self) -> SchedulingState {
        self.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn schedules(&self) -> Vec<Schedule> {
        self.snapshot().schedules
    }

    pub fn available_slots(&self) -> Vec<AvailableSlot> {
        self.snapshot().available_slots
    }

    pub fn loading(&self) -> bool {
        self.snapshot().loading()
    }

    pub fn error(&self) -> Option<String> {
        self.snapshot().error
    }

    /// 특정 스케줄의 슬롯 (시작 시간순)
    pub fn slots_for_schedule(&self, schedule_id: &str) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .snapshot()
            .slots
            .into_iter()
            .filter(|s| s.schedule_id == schedule_id)
            .collect();
        slots.sort_by_key(|s| timefmt::parse_time(&s.start_time));
        slots
    }

    /// 요청 수명 주기 공통 처리
    async fn track<T, Fut>(
        &self,
        label: &str,
        request: Fut,
        apply: impl FnOnce(&mut SchedulingState, &T),
    ) -> AppResult<T>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        let pending = {
            let mut state = self.lock()?;
            state.pending += 1;
            state.error = None;
            PendingGuard { state: &self.state }
        };

        let result = request.await;
        drop(pending);

        let mut state = self.lock()?;
        match result {
            Ok(value) => {
                apply(&mut *state, &value);
                log::info!("[Schedule] {} fulfilled", label);
                Ok(value)
            }
            Err(e) => {
                log::warn!("[Schedule] {} rejected: {}", label, e);
                state.error = Some(
                    e.server_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string()),
                );
                Err(e)
            }
        }
    }

    pub async fn create_schedule(&self, req: CreateScheduleRequest) -> AppResult<Schedule> {
        check_time_range(&req.start_time, &req.end_time)?;

        self.track("create schedule", self.api.create_schedule(&req), |state, schedule| {
            state.schedules.push(schedule.clone());
        })
        .await
    }

    pub async fn create_multiple_schedules(
        &self,
        req: CreateMultipleSchedulesRequest,
    ) -> AppResult<Vec<Schedule>> {
        let mut errors = ValidationErrors::new();
        if req.working_days.is_empty() {
            errors.add("workingDays", "Select at least one working day");
        }
        if req.start_date > req.end_date {
            errors.add("endDate", "End date must not be before start date");
        }
        errors.into_result().map_err(AppError::Validation)?;
        check_time_range(&req.start_time, &req.end_time)?;

        self.track(
            "create multiple schedules",
            self.api.create_multiple_schedules(&req),
            |state, schedules| state.schedules.extend(schedules.iter().cloned()),
        )
        .await
    }

    /// 의사의 스케줄 목록 조회 (목록 교체)
    pub async fn fetch_schedules(&self, doctor_id: &str) -> AppResult<Vec<Schedule>> {
        self.track("fetch schedules", self.api.list_schedules(doctor_id), |state, schedules| {
            state.schedules = schedules.clone();
        })
        .await
    }

    pub async fn create_slot(&self, req: CreateSlotRequest) -> AppResult<Slot> {
        check_time_range(&req.start_time, &req.end_time)?;

        self.track("create slot", self.api.create_slot(&req), |state, slot| {
            state.slots.push(slot.clone());
        })
        .await
    }

    pub async fn create_multiple_slots(&self, req: CreateMultipleSlotsRequest) -> AppResult<Vec<Slot>> {
        if req.slot_duration == 0 {
            let mut errors = ValidationErrors::new();
            errors.add("slotDuration", "Slot duration must be greater than zero");
            return Err(AppError::Validation(errors));
        }

        self.track(
            "create multiple slots",
            self.api.create_multiple_slots(&req),
            |state, slots| state.slots.extend(slots.iter().cloned()),
        )
        .await
    }

    /// 예약 가능 슬롯 조회 (이전 목록과 병합하지 않고 교체)
    pub async fn fetch_available_slots(
        &self,
        query: AvailableSlotsQuery,
    ) -> AppResult<Vec<AvailableSlot>> {
        self.track(
            "fetch available slots",
            self.api.available_slots(&query),
            |state, slots| state.available_slots = slots.clone(),
        )
        .await
    }

    /// 예약 후 해당 슬롯을 예약 가능 목록에서 제거
    pub async fn book_appointment(&self, req: BookAppointmentRequest) -> AppResult<Appointment> {
        let slot_id = req.slot_id.clone();
        self.track("book appointment", self.api.book_appointment(&req), |state, appointment| {
            state.available_slots.retain(|s| s.id != slot_id);
            state.appointments.push(appointment.clone());
        })
        .await
    }
}

/// 시작 < 종료 확인 (형식 오류도 함께 보고)
fn check_time_range(start: &str, end: &str) -> AppResult<()> {
    let mut errors = ValidationErrors::new();
    let start_time = timefmt::parse_time(start);
    let end_time = timefmt::parse_time(end);

    if start_time.is_none() {
        errors.add("startTime", "Start time must be in HH:MM format");
    }
    if end_time.is_none() {
        errors.add("endTime", "End time must be in HH:MM format");
    }
    if let (Some(s), Some(e)) = (start_time, end_time) {
        if s >= e {
            errors.add("endTime", "End time must be after start time");
        }
    }
    errors.into_result().map_err(AppError::Validation)
}
