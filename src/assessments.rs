//! 평가지 선택 화면
//!
//! 직원이 배정한 평가지 중에서만 선택하여 예약에 연결할 수 있습니다.
//! 연결에 성공한 평가지는 기록해 두고, 중간에 실패한 뒤 다시 시도하면 나머지만 전송합니다.

use std::collections::BTreeSet;

use crate::api::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::{AppointmentAssessment, Assessment, AssignAssessmentRequest};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone)]
pub struct AssessmentSelection {
    appointment_id: String,
    assigned: Vec<Assessment>,
    selected: BTreeSet<String>,
    /// 이미 예약에 연결된 평가지 ID
    attached: BTreeSet<String>,
}

impl AssessmentSelection {
    /// 배정된 평가지 목록으로 화면 구성
    pub fn new(appointment_id: &str, assigned: Vec<Assessment>) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            assigned,
            selected: BTreeSet::new(),
            attached: BTreeSet::new(),
        }
    }

    pub fn assigned(&self) -> &[Assessment] {
        &self.assigned
    }

    pub fn is_assigned(&self, assessment_id: &str) -> bool {
        self.assigned.iter().any(|a| a.id == assessment_id)
    }

    pub fn is_selected(&self, assessment_id: &str) -> bool {
        self.selected.contains(assessment_id)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn is_attached(&self, assessment_id: &str) -> bool {
        self.attached.contains(assessment_id)
    }

    pub fn attached_ids(&self) -> impl Iterator<Item = &str> {
        self.attached.iter().map(String::as_str)
    }

    /// 선택/해제 전환. 배정되지 않은 평가지는 거부
    pub fn toggle(&mut self, assessment_id: &str) -> AppResult<bool> {
        if !self.is_assigned(assessment_id) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "assessmentId",
                format!("Assessment {} is not assigned to this appointment", assessment_id),
            );
            return Err(AppError::Validation(errors));
        }

        if self.selected.remove(assessment_id) {
            Ok(false)
        } else {
            self.selected.insert(assessment_id.to_string());
            Ok(true)
        }
    }

    /// 선택한 평가지를 예약에 연결 (선택 순서가 아닌 ID 순서로 전송)
    ///
    /// 이미 연결된 평가지는 건너뛰며, 반환값은 이번 호출에서 새로 연결된 항목입니다.
    /// 도중에 실패하면 그 전까지 성공한 항목은 `attached_ids()` 에 남아 있습니다.
    pub async fn attach(&mut self, api: &ApiClient) -> AppResult<Vec<AppointmentAssessment>> {
        if self.selected.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("assessmentId", "Select at least one assessment");
            return Err(AppError::Validation(errors));
        }

        let pending: Vec<String> = self
            .selected
            .difference(&self.attached)
            .cloned()
            .collect();

        let mut attached = Vec::with_capacity(pending.len());
        for assessment_id in pending {
            let req = AssignAssessmentRequest {
                appointment_id: self.appointment_id.clone(),
                assessment_id: assessment_id.clone(),
                content: None,
            };
            match api.assign_assessment(&req).await {
                Ok(binding) => {
                    self.attached.insert(assessment_id);
                    attached.push(binding);
                }
                Err(e) => {
                    log::warn!(
                        "[Assessment] Attaching {} to appointment {} failed after {} success(es): {}",
                        assessment_id,
                        self.appointment_id,
                        attached.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        log::info!(
            "[Assessment] Attached {} assessment(s) to appointment {}",
            attached.len(),
            self.appointment_id
        );
        Ok(attached)
    }
}
