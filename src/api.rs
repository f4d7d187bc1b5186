//! 백엔드 REST API 게이트웨이
//!
//! 모든 요청에 Bearer 토큰과 요청 ID를 붙이고, `{ data: ... }` 응답을 풀어 반환합니다.
//! 실패 시 에러 본문에서 사람이 읽을 수 있는 메시지를 추출합니다.

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::PortalConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::session::SessionContext;

/// API 응답 래퍼
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

/// 백엔드 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: PortalConfig,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(config: &PortalConfig, session: SessionContext) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Custom(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str, request_id: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.config.endpoint(path))
            .header("X-Request-Id", request_id);

        if let Some(token) = self.session.bearer_token(Utc::now()) {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// 요청 전송 후 상태 코드 확인
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> AppResult<reqwest::Response> {
        let request_id = uuid::Uuid::new_v4().to_string();
        log::debug!("[API] {} {} ({})", method, path, request_id);

        let response = build(self.request(method.clone(), path, &request_id))
            .send()
            .await
            .map_err(|e| {
                log::warn!("[API] {} {} transport failure ({}): {}", method, path, request_id, e);
                AppError::from_transport(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        log::warn!(
            "[API] {} {} failed with {} ({}): {}",
            method,
            path,
            status.as_u16(),
            request_id,
            message.as_deref().unwrap_or("<no message>")
        );
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> AppResult<T> {
        let response = self.dispatch(method, path, build).await?;
        let bytes = response.bytes().await.map_err(AppError::from_transport)?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.send_data(Method::GET, path, |b| b.query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_data(Method::POST, path, |b| b.json(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_data(Method::PATCH, path, |b| b.json(body)).await
    }

    /// 응답 본문은 무시하고 상태 코드만 확인
    pub async fn post_status<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        self.dispatch(Method::POST, path, |b| b.json(body)).await?;
        Ok(())
    }

    pub async fn put_status<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        self.dispatch(Method::PUT, path, |b| b.json(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.dispatch(Method::DELETE, path, |b| b).await?;
        Ok(())
    }

    // ============ 인테이크 API ============

    pub async fn intake_status(&self) -> AppResult<IntakeStatus> {
        self.get("/intake/status", &[]).await
    }

    pub async fn submit_medical_consultation(&self, data: &MedicalConsultation) -> AppResult<()> {
        self.put_status("/intake/screen1", data).await
    }

    pub async fn submit_physical_measurements(&self, data: &PhysicalMeasurements) -> AppResult<()> {
        self.put_status("/intake/screen2", data).await
    }

    // ============ 스케줄 API ============

    pub async fn list_schedules(&self, doctor_id: &str) -> AppResult<Vec<Schedule>> {
        self.get("/schedules", &[("doctorId", doctor_id.to_string())])
            .await
    }

    pub async fn create_schedule(&self, req: &CreateScheduleRequest) -> AppResult<Schedule> {
        self.post("/schedules", req).await
    }

    pub async fn create_multiple_schedules(
        &self,
        req: &CreateMultipleSchedulesRequest,
    ) -> AppResult<Vec<Schedule>> {
        self.post("/schedules/multiple", req).await
    }

    pub async fn create_slot(&self, req: &CreateSlotRequest) -> AppResult<Slot> {
        self.post("/schedules/slots", req).await
    }

    pub async fn create_multiple_slots(
        &self,
        req: &CreateMultipleSlotsRequest,
    ) -> AppResult<Vec<Slot>> {
        self.post("/schedules/slots/multiple", req).await
    }

    pub async fn available_slots(&self, query: &AvailableSlotsQuery) -> AppResult<Vec<AvailableSlot>> {
        self.get("/schedules/available-slots", &query.to_query_pairs())
            .await
    }

    pub async fn book_appointment(&self, req: &BookAppointmentRequest) -> AppResult<Appointment> {
        self.post("/appointments", req).await
    }

    // ============ 평가지 API ============

    pub async fn list_assessments(&self) -> AppResult<Vec<Assessment>> {
        self.get("/assessments", &[]).await
    }

    pub async fn get_assessment(&self, id: &str) -> AppResult<Assessment> {
        self.get(&format!("/assessments/{}", id), &[]).await
    }

    pub async fn create_assessment(&self, input: &AssessmentInput) -> AppResult<Assessment> {
        self.post("/assessments", input).await
    }

    pub async fn update_assessment(&self, id: &str, patch: &AssessmentPatch) -> AppResult<Assessment> {
        self.patch(&format!("/assessments/{}", id), patch).await
    }

    pub async fn delete_assessment(&self, id: &str) -> AppResult<()> {
        self.delete(&format!("/assessments/{}", id)).await
    }

    pub async fn list_appointment_assessments(
        &self,
        appointment_id: &str,
    ) -> AppResult<Vec<AppointmentAssessment>> {
        self.get(&format!("/assessments/appointment/{}", appointment_id), &[])
            .await
    }

    pub async fn assign_assessment(
        &self,
        req: &AssignAssessmentRequest,
    ) -> AppResult<AppointmentAssessment> {
        self.post("/assessments/appointment", req).await
    }

    pub async fn update_appointment_assessment(
        &self,
        id: &str,
        content: &str,
    ) -> AppResult<AppointmentAssessment> {
        let body = serde_json::json!({ "content": content });
        self.patch(&format!("/assessments/appointment/{}", id), &body)
            .await
    }

    pub async fn remove_appointment_assessment(&self, id: &str) -> AppResult<()> {
        self.delete(&format!("/assessments/appointment/{}", id)).await
    }
}

/// 에러 본문에서 메시지 추출
///
/// `message`, `error` (문자열), `error.message` 순서로 확인합니다.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.get("message"),
        value.get("error"),
        value.get("error").and_then(|e| e.get("message")),
    ];

    // 공백 여부만 확인하고 서버 문구는 그대로 반환
    for candidate in candidates.into_iter().flatten() {
        if let Some(text) = candidate.as_str() {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}
