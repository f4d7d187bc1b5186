//! 환자 등록 폼 검증
//!
//! 필드별 규칙 목록을 선언적으로 정의하고, 필드마다 처음 위반한 규칙의 메시지만 반환합니다.
//! 순수 함수이며 네트워크/서버 상태를 확인하지 않습니다 (이메일 중복 등은 서버 몫).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{MedicalConsultation, PatientRegistration, PhysicalMeasurements};

pub const PASSWORD_MIN_LEN: usize = 6;

const TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Miss", "Dr", "Mx"];
const GENDERS: &[&str] = &["male", "female", "other", "prefer_not_to_say"];
const CONSENT: &[&str] = &["yes", "no"];
const COMMUNICATION: &[&str] = &["email", "phone", "sms"];

/// 필드명 -> 첫 번째 위반 메시지
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 같은 필드에 이미 메시지가 있으면 무시 (첫 위반만 유지)
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// 단일 필드 규칙
#[derive(Debug, Clone, Copy)]
enum Rule {
    MinLen(usize),
    Email,
    Date,
    Digits(usize),
    OneOf(&'static [&'static str]),
}

/// 필드 정의: 이름, 값 접근자, 필수 여부, 형식 규칙
struct FieldSpec {
    name: &'static str,
    label: &'static str,
    value: fn(&PatientRegistration) -> &str,
    required: bool,
    rules: &'static [Rule],
}

#[rustfmt::skip]
const SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "title", label: "Title", value: |r| &r.title, required: true, rules: &[Rule::OneOf(TITLES)] },
    FieldSpec { name: "firstName", label: "First name", value: |r| &r.first_name, required: true, rules: &[] },
    FieldSpec { name: "lastName", label: "Last name", value: |r| &r.last_name, required: true, rules: &[] },
    FieldSpec { name: "dateOfBirth", label: "Date of birth", value: |r| &r.date_of_birth, required: true, rules: &[Rule::Date] },
    FieldSpec { name: "gender", label: "Gender", value: |r| &r.gender, required: true, rules: &[Rule::OneOf(GENDERS)] },
    FieldSpec { name: "email", label: "Email", value: |r| &r.email, required: true, rules: &[Rule::Email] },
    FieldSpec { name: "phone", label: "Phone number", value: |r| &r.phone, required: true, rules: &[] },
    FieldSpec { name: "address", label: "Address", value: |r| &r.address, required: true, rules: &[] },
    FieldSpec { name: "city", label: "City", value: |r| &r.city, required: true, rules: &[] },
    FieldSpec { name: "state", label: "State", value: |r| &r.state, required: true, rules: &[] },
    FieldSpec { name: "zipCode", label: "Zip code", value: |r| &r.zip_code, required: true, rules: &[] },
    FieldSpec { name: "emergencyContactName", label: "Emergency contact name", value: |r| &r.emergency_contact_name, required: true, rules: &[] },
    FieldSpec { name: "emergencyContactPhone", label: "Emergency contact phone", value: |r| &r.emergency_contact_phone, required: true, rules: &[] },
    FieldSpec { name: "emergencyContactRelationship", label: "Emergency contact relationship", value: |r| &r.emergency_contact_relationship, required: true, rules: &[] },
    FieldSpec { name: "password", label: "Password", value: |r| &r.password, required: true, rules: &[Rule::MinLen(PASSWORD_MIN_LEN)] },
    FieldSpec { name: "confirmPassword", label: "Confirm password", value: |r| &r.confirm_password, required: true, rules: &[] },
    FieldSpec { name: "consentToTreatment", label: "Consent to treatment", value: |r| &r.consent_to_treatment, required: true, rules: &[Rule::OneOf(CONSENT)] },
    FieldSpec { name: "consentToTelehealth", label: "Consent to telehealth", value: |r| &r.consent_to_telehealth, required: true, rules: &[Rule::OneOf(CONSENT)] },
    FieldSpec { name: "privacyPolicyAccepted", label: "Privacy policy", value: |r| &r.privacy_policy_accepted, required: true, rules: &[Rule::OneOf(CONSENT)] },
    FieldSpec { name: "preferredCommunication", label: "Preferred communication", value: |r| &r.preferred_communication, required: true, rules: &[Rule::OneOf(COMMUNICATION)] },
    // 선택 항목: 비어 있으면 통과, 값이 있으면 형식 검사
    FieldSpec { name: "insuranceProvider", label: "Insurance provider", value: |r| &r.insurance_provider, required: false, rules: &[] },
    FieldSpec { name: "insurancePolicyNumber", label: "Insurance policy number", value: |r| &r.insurance_policy_number, required: false, rules: &[] },
    FieldSpec { name: "ssnLastFour", label: "SSN last four", value: |r| &r.ssn_last_four, required: false, rules: &[Rule::Digits(4)] },
    FieldSpec { name: "preferredLanguage", label: "Preferred language", value: |r| &r.preferred_language, required: false, rules: &[] },
    FieldSpec { name: "accessibilityNeeds", label: "Accessibility needs", value: |r| &r.accessibility_needs, required: false, rules: &[] },
    FieldSpec { name: "plannedFirstVisitDate", label: "Planned first visit date", value: |r| &r.planned_first_visit_date, required: false, rules: &[Rule::Date] },
];

/// 필수 필드 이름 목록
pub fn mandatory_fields() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().filter(|f| f.required).map(|f| f.name)
}

/// 선택 필드 이름 목록
pub fn optional_fields() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().filter(|f| !f.required).map(|f| f.name)
}

/// 환자 등록 레코드 검증
pub fn validate_registration(record: &PatientRegistration) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for field in SCHEMA {
        let raw = (field.value)(record);
        let value = raw.trim();

        if value.is_empty() {
            if field.required {
                errors.add(field.name, format!("{} is required", field.label));
            }
            continue;
        }

        for rule in field.rules {
            // 길이 규칙은 입력값 그대로 (비밀번호의 공백도 문자로 취급)
            let checked = match rule {
                Rule::MinLen(_) => raw,
                _ => value,
            };
            if let Err(message) = check_rule(*rule, field.label, checked) {
                errors.add(field.name, message);
                break;
            }
        }
    }

    // 교차 필드 규칙: 두 값의 개별 유효성과 무관하게 불일치면 실패
    // (비밀번호 자체가 비어 있으면 필수 항목 오류만 보고)
    if !record.password.trim().is_empty() && record.confirm_password != record.password {
        errors.add("confirmPassword", "Passwords must match");
    }

    errors.into_result()
}

fn check_rule(rule: Rule, label: &str, value: &str) -> Result<(), String> {
    match rule {
        Rule::MinLen(min) => {
            if value.chars().count() < min {
                return Err(format!("{} must be at least {} characters", label, min));
            }
        }
        Rule::Email => {
            if !is_email(value) {
                return Err("Invalid email address".to_string());
            }
        }
        Rule::Date => {
            if !is_iso_date(value) {
                return Err(format!("{} must be in YYYY-MM-DD format", label));
            }
        }
        Rule::Digits(n) => {
            if value.len() != n || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("{} must be exactly {} digits", label, n));
            }
        }
        Rule::OneOf(allowed) => {
            if !allowed.contains(&value) {
                return Err(format!("{} must be one of: {}", label, allowed.join(", ")));
            }
        }
    }
    Ok(())
}

/// 1단계 화면 (진료 상담) 검증
pub fn validate_consultation(data: &MedicalConsultation) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if data.reason_for_visit.trim().is_empty() {
        errors.add("reasonForVisit", "Reason for visit is required");
    }
    errors.into_result()
}

/// 2단계 화면 (신체 계측) 검증: 모두 양수
pub fn validate_measurements(data: &PhysicalMeasurements) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for (field, label, value) in [
        ("height", "Height", data.height),
        ("weight", "Weight", data.weight),
        ("waist", "Waist", data.waist),
    ] {
        if !value.is_finite() || value <= 0.0 {
            errors.add(field, format!("{} must be a positive number", label));
        }
    }
    errors.into_result()
}

/// YYYY-MM-DD 형식이면서 실제 존재하는 날짜
pub fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let (local, domain) = match (parts.next(), parts.next()) {
        (Some(l), Some(d)) => (l, d),
        _ => return false,
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.contains(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
