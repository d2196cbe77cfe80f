use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Identifier wrapper for persisted admission records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdmissionId(pub String);

impl AdmissionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw form payload as filled in by the parent or guardian.
///
/// Every text input is a plain string where the empty string means "not
/// provided". Nothing here is checked; `AdmissionValidator` turns it into
/// [`AdmissionDetails`]. Keys missing from a JSON payload take the values
/// of [`AdmissionSubmission::blank`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "AdmissionSubmission::blank")]
pub struct AdmissionSubmission {
    pub school_branch: String,
    pub purpose_of_form: String,
    pub academic_year: String,

    pub student_full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub nationality: String,
    pub religion: String,
    pub caste_category: String,
    pub sub_caste: String,
    pub aadhaar_number: String,
    pub blood_group: String,
    pub identification_marks: String,
    pub special_needs_or_disabilities: String,
    pub current_residential_address: String,
    pub permanent_address: String,

    pub admission_type: String,
    pub current_last_standard: String,
    pub current_last_section: String,
    pub standard_applying_for: String,
    pub previous_school_name: String,
    pub previous_school_address: String,
    pub last_class_attended: String,
    pub year_of_passing_last_class: String,
    pub marks_percentage_last_exam: String,

    pub is_rejoining: bool,
    pub previous_roll_number: String,
    pub year_standard_when_left: String,
    pub reason_for_leaving: String,
    pub reason_for_rejoining: String,
    pub extracurricular_interests: String,

    pub has_siblings_in_school: bool,
    pub siblings: Vec<SiblingEntry>,

    pub father_full_name: String,
    pub father_occupation: String,
    pub father_annual_income: String,
    pub father_mobile_number: String,
    pub father_email: String,
    pub father_aadhaar_number: String,

    pub mother_full_name: String,
    pub mother_occupation: String,
    pub mother_annual_income: String,
    pub mother_mobile_number: String,
    pub mother_email: String,
    pub mother_aadhaar_number: String,

    pub guardian_name: String,
    pub guardian_relation: String,
    pub guardian_occupation: String,
    pub guardian_mobile_number: String,
    pub guardian_aadhaar_number: String,

    pub emergency_contact_name: String,
    pub emergency_contact_relation: String,
    pub emergency_contact_mobile: String,

    pub transport_required: bool,
    pub pickup_drop_location: String,
    pub medical_history_or_allergies: String,
    pub vaccinations: Vec<VaccinationEntry>,

    pub declaration_accepted: bool,
}

impl AdmissionSubmission {
    /// A blank form with the same defaults a fresh admission form shows.
    pub fn blank() -> Self {
        Self {
            nationality: DEFAULT_NATIONALITY.to_string(),
            ..Self::default()
        }
    }
}

pub const DEFAULT_NATIONALITY: &str = "Indian";

/// One row of the sibling list as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiblingEntry {
    pub name: String,
    pub class_grade: String,
    pub roll_number: String,
    pub branch: String,
}

/// One row of the vaccination list as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaccinationEntry {
    pub vaccine_name: String,
    pub vaccination_date: String,
}

/// Closed option list offered by a select input.
pub trait OptionLabel: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.iter().copied().find(|option| option.label() == raw)
    }
}

macro_rules! option_list {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl OptionLabel for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

option_list!(
    /// Campus the student is applying to. Siblings pick theirs independently.
    SchoolBranch {
        TPudur => "T. Pudur",
        Surakullam => "Surakullam",
    }
);

option_list!(
    PurposeOfForm {
        NewAdmission => "New Admission",
        ReAdmission => "Re-Admission",
        UpdateExistingDetails => "Update Existing Details",
    }
);

option_list!(
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
);

option_list!(
    CasteCategory {
        General => "General",
        Obc => "OBC",
        Sc => "SC",
        St => "ST",
        Ews => "EWS",
        Other => "Other",
    }
);

option_list!(
    AdmissionType {
        NewAdmission => "New Admission",
        ExistingStudent => "Existing Student",
        ReAdmission => "Re-Admission",
    }
);

option_list!(
    BloodGroup {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
        Unknown => "Unknown",
    }
);

impl AdmissionType {
    /// Students already known to the school report their current or last standing.
    pub const fn tracks_current_standing(self) -> bool {
        matches!(self, Self::ExistingStudent | Self::ReAdmission)
    }
}

/// Twelve-digit Aadhaar number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AadhaarNumber(String);

impl AadhaarNumber {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        exact_digits(raw, 12).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ten-digit mobile number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        exact_digits(raw, 10).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn exact_digits(raw: &str, len: usize) -> bool {
    raw.len() == len && raw.bytes().all(|byte| byte.is_ascii_digit())
}

/// Syntactically valid e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (local, domain) = raw.split_once('@')?;
        if !valid_local_part(local) || !valid_domain(domain) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-'".contains(c))
}

fn valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Which conditional parts of the form apply to a given set of answers.
///
/// Derived on demand from the answers themselves; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleSections {
    pub rejoining_details: bool,
    pub current_standing: bool,
    pub pickup_location: bool,
    pub sibling_list: bool,
}

impl VisibleSections {
    pub fn of(submission: &AdmissionSubmission) -> Self {
        Self {
            rejoining_details: submission.is_rejoining,
            current_standing: AdmissionType::from_label(&submission.admission_type)
                .is_some_and(AdmissionType::tracks_current_standing),
            pickup_location: submission.transport_required,
            sibling_list: submission.has_siblings_in_school,
        }
    }
}

/// Validated, fully typed admission answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionDetails {
    pub basic: BasicInformation,
    pub student: StudentDetails,
    pub academic: AcademicDetails,
    pub siblings: SiblingDetails,
    pub parents: ParentDetails,
    pub transport: TransportDetails,
    pub medical: MedicalDetails,
    pub declaration_accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInformation {
    pub school_branch: SchoolBranch,
    pub purpose_of_form: PurposeOfForm,
    pub academic_year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub nationality: String,
    pub religion: Option<String>,
    pub caste_category: CasteCategory,
    pub sub_caste: Option<String>,
    pub aadhaar_number: AadhaarNumber,
    pub blood_group: Option<BloodGroup>,
    pub identification_marks: Option<String>,
    pub special_needs_or_disabilities: Option<String>,
    pub current_residential_address: String,
    pub permanent_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicDetails {
    pub admission_type: AdmissionType,
    pub current_last_standard: Option<String>,
    pub current_last_section: Option<String>,
    pub standard_applying_for: String,
    pub previous_school_name: Option<String>,
    pub previous_school_address: Option<String>,
    pub last_class_attended: Option<String>,
    pub year_of_passing_last_class: Option<String>,
    pub marks_percentage_last_exam: Option<String>,
    /// Present only when the student is rejoining after leaving.
    pub rejoining: Option<RejoiningDetails>,
    pub extracurricular_interests: Option<String>,
}

impl AcademicDetails {
    pub fn is_rejoining(&self) -> bool {
        self.rejoining.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejoiningDetails {
    pub previous_roll_number: Option<String>,
    pub year_standard_when_left: Option<String>,
    pub reason_for_leaving: Option<String>,
    pub reason_for_rejoining: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingDetails {
    pub has_siblings_in_school: bool,
    pub entries: Vec<Sibling>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sibling {
    pub name: String,
    pub class_grade: String,
    pub roll_number: Option<String>,
    pub branch: SchoolBranch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDetails {
    pub father: ParentContact,
    pub mother: ParentContact,
    pub guardian: GuardianContact,
    pub emergency_contact: EmergencyContact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentContact {
    pub full_name: String,
    pub occupation: String,
    pub annual_income: Option<String>,
    pub mobile_number: MobileNumber,
    pub email: Option<EmailAddress>,
    pub aadhaar_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianContact {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub occupation: Option<String>,
    pub mobile_number: Option<String>,
    pub aadhaar_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportDetails {
    pub required: bool,
    pub pickup_drop_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalDetails {
    pub history_or_allergies: Option<String>,
    pub vaccinations: Vec<Vaccination>,
}

/// Vaccination as reported by the family; the date is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vaccination {
    pub vaccine_name: String,
    pub vaccination_date: String,
}
