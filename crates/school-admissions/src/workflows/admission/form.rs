//! In-memory state of one admission form while a parent fills it in.
//!
//! Values are stored raw and only validated when the form is submitted (or
//! when the caller asks for [`AdmissionFormState::validate`] to give early
//! feedback). UI-only state such as the copy-address toggle lives next to the
//! values but is never persisted.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{
    AdmissionDetails, AdmissionId, AdmissionSubmission, SiblingEntry, VaccinationEntry,
    VisibleSections,
};
use super::repository::{AdmissionRepository, ListingCache};
use super::service::{AdmissionService, SubmissionOutcome};
use super::validation::{AdmissionValidator, ValidationErrors};

/// Value written into a single form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Submitted { id: AdmissionId },
}

/// Which inputs the form currently shows, derived from the current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionVisibility {
    pub rejoining_details: bool,
    pub current_standing: bool,
    pub pickup_location: bool,
    pub sibling_list: bool,
    pub permanent_address_editable: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("field '{path}' expects a {expected} value")]
    TypeMismatch { path: String, expected: &'static str },
    #[error("{section} entry {index} does not exist ({len} present)")]
    IndexOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },
    #[error("field '{0}' is read-only while it mirrors another field")]
    ReadOnly(String),
    #[error("the {0} section is not shown for the current answers")]
    SectionHidden(&'static str),
    #[error("the form is being submitted")]
    Busy,
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// Mutable state backing one admission form.
#[derive(Debug, Clone)]
pub struct AdmissionFormState {
    values: AdmissionSubmission,
    copy_address: bool,
    use_current_year: bool,
    phase: FormPhase,
    errors: ValidationErrors,
    submission_error: Option<String>,
}

impl Default for AdmissionFormState {
    fn default() -> Self {
        Self::new()
    }
}

const PERMANENT_ADDRESS: &str = "permanentAddress";

impl AdmissionFormState {
    pub fn new() -> Self {
        Self {
            values: AdmissionSubmission::blank(),
            copy_address: false,
            use_current_year: false,
            phase: FormPhase::Editing,
            errors: ValidationErrors::default(),
            submission_error: None,
        }
    }

    pub fn values(&self) -> &AdmissionSubmission {
        &self.values
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    /// Errors from the most recent validation pass.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// User-facing message from the most recent failed submission.
    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn copy_address_enabled(&self) -> bool {
        self.copy_address
    }

    pub fn current_year_enabled(&self) -> bool {
        self.use_current_year
    }

    /// Update one field. Paths use the wire names (`fatherEmail`) and
    /// `siblings.<index>.<field>` / `vaccinations.<index>.<field>` for rows.
    pub fn set_field(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.ensure_editable()?;
        let value = value.into();

        if path == PERMANENT_ADDRESS && self.copy_address {
            return Err(FormError::ReadOnly(path.to_string()));
        }

        match path.split_once('.') {
            Some((section, rest)) => self.set_row_field(path, section, rest, value),
            None => self.set_scalar_field(path, value),
        }
    }

    fn set_scalar_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        if let Some(slot) = flag_slot(&mut self.values, path) {
            *slot = expect_flag(path, value)?;
            return Ok(());
        }
        if let Some(slot) = text_slot(&mut self.values, path) {
            *slot = expect_text(path, value)?;
            return Ok(());
        }
        Err(FormError::UnknownField(path.to_string()))
    }

    fn set_row_field(
        &mut self,
        path: &str,
        section: &str,
        rest: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        let (index, field) = rest
            .split_once('.')
            .and_then(|(index, field)| Some((index.parse::<usize>().ok()?, field)))
            .ok_or_else(|| FormError::UnknownField(path.to_string()))?;

        match section {
            "siblings" => {
                let len = self.values.siblings.len();
                let entry = self.values.siblings.get_mut(index).ok_or(
                    FormError::IndexOutOfRange {
                        section: "siblings",
                        index,
                        len,
                    },
                )?;
                let slot = match field {
                    "name" => &mut entry.name,
                    "classGrade" => &mut entry.class_grade,
                    "rollNumber" => &mut entry.roll_number,
                    "branch" => &mut entry.branch,
                    _ => return Err(FormError::UnknownField(path.to_string())),
                };
                *slot = expect_text(path, value)?;
            }
            "vaccinations" => {
                let len = self.values.vaccinations.len();
                let entry = self.values.vaccinations.get_mut(index).ok_or(
                    FormError::IndexOutOfRange {
                        section: "vaccinations",
                        index,
                        len,
                    },
                )?;
                let slot = match field {
                    "vaccineName" => &mut entry.vaccine_name,
                    "vaccinationDate" => &mut entry.vaccination_date,
                    _ => return Err(FormError::UnknownField(path.to_string())),
                };
                *slot = expect_text(path, value)?;
            }
            _ => return Err(FormError::UnknownField(path.to_string())),
        }
        Ok(())
    }

    /// Copy the current address into the permanent address once. Later edits
    /// to the current address are not mirrored; turning the toggle off clears
    /// the permanent address so it can be typed independently.
    pub fn toggle_copy_address(&mut self, enabled: bool) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.copy_address = enabled;
        if enabled {
            self.values.permanent_address = self.values.current_residential_address.clone();
        } else {
            self.values.permanent_address.clear();
        }
        Ok(())
    }

    /// Fill the academic year from today's date. Disabling leaves the field alone.
    pub fn use_current_academic_year(&mut self, enabled: bool) -> Result<(), FormError> {
        self.use_academic_year_from(enabled, Local::now().date_naive())
    }

    pub fn use_academic_year_from(
        &mut self,
        enabled: bool,
        today: NaiveDate,
    ) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.use_current_year = enabled;
        if enabled {
            let year = today.year();
            self.values.academic_year = format!("{}-{}", year, year + 1);
        }
        Ok(())
    }

    pub fn append_sibling(&mut self) -> Result<usize, FormError> {
        self.ensure_editable()?;
        self.ensure_siblings_shown()?;
        self.values.siblings.push(SiblingEntry::default());
        Ok(self.values.siblings.len() - 1)
    }

    pub fn remove_sibling(&mut self, index: usize) -> Result<SiblingEntry, FormError> {
        self.ensure_editable()?;
        self.ensure_siblings_shown()?;
        let len = self.values.siblings.len();
        if index >= len {
            return Err(FormError::IndexOutOfRange {
                section: "siblings",
                index,
                len,
            });
        }
        Ok(self.values.siblings.remove(index))
    }

    pub fn append_vaccination(&mut self) -> Result<usize, FormError> {
        self.ensure_editable()?;
        self.values.vaccinations.push(VaccinationEntry::default());
        Ok(self.values.vaccinations.len() - 1)
    }

    pub fn remove_vaccination(&mut self, index: usize) -> Result<VaccinationEntry, FormError> {
        self.ensure_editable()?;
        let len = self.values.vaccinations.len();
        if index >= len {
            return Err(FormError::IndexOutOfRange {
                section: "vaccinations",
                index,
                len,
            });
        }
        Ok(self.values.vaccinations.remove(index))
    }

    pub fn visibility(&self) -> SectionVisibility {
        let sections = VisibleSections::of(&self.values);
        SectionVisibility {
            rejoining_details: sections.rejoining_details,
            current_standing: sections.current_standing,
            pickup_location: sections.pickup_location,
            sibling_list: sections.sibling_list,
            permanent_address_editable: !self.copy_address,
        }
    }

    /// Run the validation rules against the current values and remember the
    /// outcome for inline display. Does not change the phase.
    pub fn validate(&mut self) -> Result<AdmissionDetails, ValidationErrors> {
        let result = AdmissionValidator.validate(&self.values);
        self.errors = match &result {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors.clone(),
        };
        result
    }

    /// Enter the submitting phase if the values pass validation, handing back
    /// the payload to send. On failure the form stays editable with errors.
    pub fn begin_submit(&mut self) -> Result<AdmissionSubmission, FormError> {
        if self.phase == FormPhase::Submitting {
            return Err(FormError::Busy);
        }
        self.submission_error = None;
        self.validate()?;
        self.phase = FormPhase::Submitting;
        Ok(self.values.clone())
    }

    /// Apply the result of a submission started with [`Self::begin_submit`].
    /// Success resets the form to a blank state; failure keeps the answers.
    pub fn finish_submit(&mut self, outcome: &SubmissionOutcome) {
        match (&outcome.id, outcome.success) {
            (Some(id), true) => {
                *self = Self::new();
                self.phase = FormPhase::Submitted { id: id.clone() };
            }
            _ => {
                self.phase = FormPhase::Editing;
                self.submission_error = outcome.error.clone();
                if let Some(errors) = &outcome.field_errors {
                    self.errors = errors.clone();
                }
            }
        }
    }

    /// Full submit cycle against a service.
    pub fn submit_to<R, C>(
        &mut self,
        service: &AdmissionService<R, C>,
    ) -> Result<SubmissionOutcome, FormError>
    where
        R: AdmissionRepository + 'static,
        C: ListingCache + 'static,
    {
        let payload = self.begin_submit()?;
        let outcome = SubmissionOutcome::from_result(&service.submit(payload));
        self.finish_submit(&outcome);
        Ok(outcome)
    }

    fn ensure_editable(&mut self) -> Result<(), FormError> {
        match self.phase {
            FormPhase::Submitting => Err(FormError::Busy),
            FormPhase::Submitted { .. } => {
                self.phase = FormPhase::Editing;
                Ok(())
            }
            FormPhase::Editing => Ok(()),
        }
    }

    fn ensure_siblings_shown(&self) -> Result<(), FormError> {
        if self.values.has_siblings_in_school {
            Ok(())
        } else {
            Err(FormError::SectionHidden("siblings"))
        }
    }
}

fn expect_text(path: &str, value: FieldValue) -> Result<String, FormError> {
    match value {
        FieldValue::Text(text) => Ok(text),
        FieldValue::Flag(_) => Err(FormError::TypeMismatch {
            path: path.to_string(),
            expected: "text",
        }),
    }
}

fn expect_flag(path: &str, value: FieldValue) -> Result<bool, FormError> {
    match value {
        FieldValue::Flag(flag) => Ok(flag),
        FieldValue::Text(_) => Err(FormError::TypeMismatch {
            path: path.to_string(),
            expected: "boolean",
        }),
    }
}

fn flag_slot<'a>(values: &'a mut AdmissionSubmission, path: &str) -> Option<&'a mut bool> {
    let slot = match path {
        "isRejoining" => &mut values.is_rejoining,
        "hasSiblingsInSchool" => &mut values.has_siblings_in_school,
        "transportRequired" => &mut values.transport_required,
        "declarationAccepted" => &mut values.declaration_accepted,
        _ => return None,
    };
    Some(slot)
}

fn text_slot<'a>(values: &'a mut AdmissionSubmission, path: &str) -> Option<&'a mut String> {
    let slot = match path {
        "schoolBranch" => &mut values.school_branch,
        "purposeOfForm" => &mut values.purpose_of_form,
        "academicYear" => &mut values.academic_year,
        "studentFullName" => &mut values.student_full_name,
        "dateOfBirth" => &mut values.date_of_birth,
        "gender" => &mut values.gender,
        "nationality" => &mut values.nationality,
        "religion" => &mut values.religion,
        "casteCategory" => &mut values.caste_category,
        "subCaste" => &mut values.sub_caste,
        "aadhaarNumber" => &mut values.aadhaar_number,
        "bloodGroup" => &mut values.blood_group,
        "identificationMarks" => &mut values.identification_marks,
        "specialNeedsOrDisabilities" => &mut values.special_needs_or_disabilities,
        "currentResidentialAddress" => &mut values.current_residential_address,
        "permanentAddress" => &mut values.permanent_address,
        "admissionType" => &mut values.admission_type,
        "currentLastStandard" => &mut values.current_last_standard,
        "currentLastSection" => &mut values.current_last_section,
        "standardApplyingFor" => &mut values.standard_applying_for,
        "previousSchoolName" => &mut values.previous_school_name,
        "previousSchoolAddress" => &mut values.previous_school_address,
        "lastClassAttended" => &mut values.last_class_attended,
        "yearOfPassingLastClass" => &mut values.year_of_passing_last_class,
        "marksPercentageLastExam" => &mut values.marks_percentage_last_exam,
        "previousRollNumber" => &mut values.previous_roll_number,
        "yearStandardWhenLeft" => &mut values.year_standard_when_left,
        "reasonForLeaving" => &mut values.reason_for_leaving,
        "reasonForRejoining" => &mut values.reason_for_rejoining,
        "extracurricularInterests" => &mut values.extracurricular_interests,
        "fatherFullName" => &mut values.father_full_name,
        "fatherOccupation" => &mut values.father_occupation,
        "fatherAnnualIncome" => &mut values.father_annual_income,
        "fatherMobileNumber" => &mut values.father_mobile_number,
        "fatherEmail" => &mut values.father_email,
        "fatherAadhaarNumber" => &mut values.father_aadhaar_number,
        "motherFullName" => &mut values.mother_full_name,
        "motherOccupation" => &mut values.mother_occupation,
        "motherAnnualIncome" => &mut values.mother_annual_income,
        "motherMobileNumber" => &mut values.mother_mobile_number,
        "motherEmail" => &mut values.mother_email,
        "motherAadhaarNumber" => &mut values.mother_aadhaar_number,
        "guardianName" => &mut values.guardian_name,
        "guardianRelation" => &mut values.guardian_relation,
        "guardianOccupation" => &mut values.guardian_occupation,
        "guardianMobileNumber" => &mut values.guardian_mobile_number,
        "guardianAadhaarNumber" => &mut values.guardian_aadhaar_number,
        "emergencyContactName" => &mut values.emergency_contact_name,
        "emergencyContactRelation" => &mut values.emergency_contact_relation,
        "emergencyContactMobile" => &mut values.emergency_contact_mobile,
        "pickupDropLocation" => &mut values.pickup_drop_location,
        "medicalHistoryOrAllergies" => &mut values.medical_history_or_allergies,
        _ => return None,
    };
    Some(slot)
}
