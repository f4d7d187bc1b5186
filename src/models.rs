use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// 백엔드 ID는 문자열 또는 숫자로 올 수 있음
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

// ============ 인테이크 ============

/// 서버가 보고하는 인테이크 진행 상태 (읽기 전용)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeStatus {
    pub has_completed_intake: bool,
    pub needs_screen2: bool,
}

/// 1단계 화면: 진료 상담
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalConsultation {
    pub reason_for_visit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

/// 2단계 화면: 신체 계측
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalMeasurements {
    pub height: f64,
    pub weight: f64,
    pub waist: f64,
}

// ============ 스케줄 / 슬롯 ============

/// 의사의 근무 블록 (날짜 + 시간대 + 수용 인원)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub doctor_id: String,
    pub date: NaiveDate,
    pub start_time: String, // HH:MM
    pub end_time: String,   // HH:MM
    pub max_appointments: u32,
}

/// 스케줄을 나눈 예약 단위
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub schedule_id: String,
    pub start_time: String,
    pub end_time: String,
}

/// 예약 가능한 슬롯 (조회 결과, 클라이언트에서 수정하지 않음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub schedule_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
}

/// 근무 요일 (날짜 전개는 서버에서 처리)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkingDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub max_appointments: u32,
}

/// 기간 + 요일 조합으로 스케줄 일괄 생성 (날짜 전개는 서버에서 처리)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMultipleSchedulesRequest {
    pub doctor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub working_days: Vec<WorkingDay>,
    pub start_time: String,
    pub end_time: String,
    pub max_appointments: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_time: Option<u32>, // 분 단위
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub schedule_id: String,
    pub start_time: String,
    pub end_time: String,
}

/// 슬롯 일괄 생성 (분할 계산은 서버에서 처리)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMultipleSlotsRequest {
    pub schedule_id: String,
    pub slot_duration: u32, // 분 단위
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvailableSlotsQuery {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub service_id: Option<String>,
}

impl AvailableSlotsQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("doctorId", self.doctor_id.clone()),
            ("date", self.date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(ref service_id) = self.service_id {
            pairs.push(("serviceId", service_id.clone()));
        }
        pairs
    }
}

// ============ 예약 ============

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub slot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub slot_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ============ 평가지 ============

/// 재사용 가능한 평가지 템플릿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub content: String, // 리치 텍스트
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentInput {
    pub name: String,
    pub content: String,
}

/// 부분 수정 (PATCH)
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssessmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// 예약에 연결된 평가지 (내용 덮어쓰기 가능)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentAssessment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub appointment_id: String,
    #[serde(deserialize_with = "de_id")]
    pub assessment_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub assessment: Option<Assessment>,
}

impl AppointmentAssessment {
    /// 덮어쓴 내용이 있으면 그것을, 없으면 템플릿 내용을 사용
    pub fn effective_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .or_else(|| self.assessment.as_ref().map(|a| a.content.as_str()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignAssessmentRequest {
    pub appointment_id: String,
    pub assessment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============ 환자 등록 ============

/// 환자 등록 폼 (빈 문자열 = 미입력)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRegistration {
    // 신원
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String, // YYYY-MM-DD
    pub gender: String,
    // 연락처
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    // 비상 연락처
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relationship: String,
    // 계정
    pub password: String,
    pub confirm_password: String,
    // 동의 항목
    pub consent_to_treatment: String,
    pub consent_to_telehealth: String,
    pub privacy_policy_accepted: String,
    pub preferred_communication: String,
    // 선택 항목
    #[serde(default)]
    pub insurance_provider: String,
    #[serde(default)]
    pub insurance_policy_number: String,
    #[serde(default)]
    pub ssn_last_four: String,
    #[serde(default)]
    pub preferred_language: String,
    #[serde(default)]
    pub accessibility_needs: String,
    #[serde(default)]
    pub planned_first_visit_date: String,
}
