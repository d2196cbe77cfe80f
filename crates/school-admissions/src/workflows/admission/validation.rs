use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{
    AadhaarNumber, AcademicDetails, AdmissionDetails, AdmissionSubmission, AdmissionType,
    BasicInformation, BloodGroup, CasteCategory, EmailAddress, EmergencyContact, Gender,
    GuardianContact, MedicalDetails, MobileNumber, OptionLabel, ParentContact, ParentDetails,
    PurposeOfForm, RejoiningDetails, SchoolBranch, Sibling, SiblingDetails, StudentDetails,
    TransportDetails, Vaccination, VisibleSections,
};

pub const DECLARATION_MESSAGE: &str = "You must accept the declaration";
const AADHAAR_MESSAGE: &str = "Aadhaar must be 12 digits";
const MOBILE_MESSAGE: &str = "Mobile must be 10 digits";
const EMAIL_MESSAGE: &str = "Invalid email address";

/// Per-field validation failures keyed by field path (`fatherEmail`, `siblings.0.name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(path.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of distinct fields with at least one failure.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn messages_for(&self, path: &str) -> &[String] {
        self.fields.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Stateless checker producing [`AdmissionDetails`] from raw answers.
///
/// Every rule runs; failures are collected rather than short-circuited so the
/// form can flag all offending inputs at once. Answers belonging to sections
/// that are hidden for this submission (rejoining details, current standing,
/// pickup location, sibling rows) are dropped from the typed result.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionValidator;

impl AdmissionValidator {
    pub fn validate(
        &self,
        submission: &AdmissionSubmission,
    ) -> Result<AdmissionDetails, ValidationErrors> {
        let visible = VisibleSections::of(submission);
        let mut check = FieldCheck::default();

        let basic = basic_information(&mut check, submission);
        let student = student_details(&mut check, submission);
        let academic = academic_details(&mut check, submission, visible);
        let siblings = sibling_details(&mut check, submission, visible);
        let parents = parent_details(&mut check, submission);
        let transport = transport_details(submission, visible);
        let medical = medical_details(&mut check, submission);

        if !submission.declaration_accepted {
            check.errors.push("declarationAccepted", DECLARATION_MESSAGE);
        }

        match (basic, student, academic, siblings, parents, medical) {
            (
                Some(basic),
                Some(student),
                Some(academic),
                Some(siblings),
                Some(parents),
                Some(medical),
            ) if check.errors.is_empty() => Ok(AdmissionDetails {
                basic,
                student,
                academic,
                siblings,
                parents,
                transport,
                medical,
                declaration_accepted: true,
            }),
            _ => Err(check.errors),
        }
    }
}

#[derive(Default)]
struct FieldCheck {
    errors: ValidationErrors,
}

impl FieldCheck {
    fn required(&mut self, path: &str, raw: &str, message: &str) -> Option<String> {
        let value = optional(raw);
        if value.is_none() {
            self.errors.push(path, message);
        }
        value
    }

    fn choice<T: OptionLabel>(
        &mut self,
        path: &str,
        raw: &str,
        missing: &str,
        invalid: &str,
    ) -> Option<T> {
        if raw.trim().is_empty() {
            self.errors.push(path, missing);
            return None;
        }
        let parsed = T::from_label(raw);
        if parsed.is_none() {
            self.errors.push(path, invalid);
        }
        parsed
    }

    fn optional_choice<T: OptionLabel>(&mut self, path: &str, raw: &str, invalid: &str) -> Option<T> {
        if raw.trim().is_empty() {
            return None;
        }
        let parsed = T::from_label(raw);
        if parsed.is_none() {
            self.errors.push(path, invalid);
        }
        parsed
    }

    fn pattern<T>(
        &mut self,
        path: &str,
        raw: &str,
        parse: fn(&str) -> Option<T>,
        message: &str,
    ) -> Option<T> {
        let parsed = parse(raw);
        if parsed.is_none() {
            self.errors.push(path, message);
        }
        parsed
    }

    /// Empty means absent; anything else has to parse.
    fn optional_email(&mut self, path: &str, raw: &str) -> Option<Option<EmailAddress>> {
        if raw.trim().is_empty() {
            return Some(None);
        }
        self.pattern(path, raw, EmailAddress::parse, EMAIL_MESSAGE)
            .map(Some)
    }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn basic_information(check: &mut FieldCheck, s: &AdmissionSubmission) -> Option<BasicInformation> {
    let school_branch = check.choice::<SchoolBranch>(
        "schoolBranch",
        &s.school_branch,
        "School branch is required",
        "Select a valid school branch",
    );
    let purpose_of_form = check.choice::<PurposeOfForm>(
        "purposeOfForm",
        &s.purpose_of_form,
        "Purpose is required",
        "Select a valid purpose",
    );
    let academic_year = check.required(
        "academicYear",
        &s.academic_year,
        "Academic year is required",
    );

    Some(BasicInformation {
        school_branch: school_branch?,
        purpose_of_form: purpose_of_form?,
        academic_year: academic_year?,
    })
}

fn student_details(check: &mut FieldCheck, s: &AdmissionSubmission) -> Option<StudentDetails> {
    let full_name = check.required(
        "studentFullName",
        &s.student_full_name,
        "Student name is required",
    );
    let date_of_birth = check.required(
        "dateOfBirth",
        &s.date_of_birth,
        "Date of birth is required",
    );
    let gender = check.choice::<Gender>(
        "gender",
        &s.gender,
        "Gender is required",
        "Select a valid gender",
    );
    let nationality = check.required("nationality", &s.nationality, "Nationality is required");
    let caste_category = check.choice::<CasteCategory>(
        "casteCategory",
        &s.caste_category,
        "Caste category is required",
        "Select a valid caste category",
    );
    let aadhaar_number = check.pattern(
        "aadhaarNumber",
        &s.aadhaar_number,
        AadhaarNumber::parse,
        AADHAAR_MESSAGE,
    );
    let blood_group = check.optional_choice::<BloodGroup>(
        "bloodGroup",
        &s.blood_group,
        "Select a valid blood group",
    );
    let current_residential_address = check.required(
        "currentResidentialAddress",
        &s.current_residential_address,
        "Current address is required",
    );

    Some(StudentDetails {
        full_name: full_name?,
        date_of_birth: date_of_birth?,
        gender: gender?,
        nationality: nationality?,
        religion: optional(&s.religion),
        caste_category: caste_category?,
        sub_caste: optional(&s.sub_caste),
        aadhaar_number: aadhaar_number?,
        blood_group,
        identification_marks: optional(&s.identification_marks),
        special_needs_or_disabilities: optional(&s.special_needs_or_disabilities),
        current_residential_address: current_residential_address?,
        permanent_address: optional(&s.permanent_address),
    })
}

fn academic_details(
    check: &mut FieldCheck,
    s: &AdmissionSubmission,
    visible: VisibleSections,
) -> Option<AcademicDetails> {
    let admission_type = check.choice::<AdmissionType>(
        "admissionType",
        &s.admission_type,
        "Admission type is required",
        "Select a valid admission type",
    );
    let standard_applying_for = check.required(
        "standardApplyingFor",
        &s.standard_applying_for,
        "Standard applying for is required",
    );

    let (current_last_standard, current_last_section) = if visible.current_standing {
        (
            optional(&s.current_last_standard),
            optional(&s.current_last_section),
        )
    } else {
        (None, None)
    };

    let rejoining = visible.rejoining_details.then(|| RejoiningDetails {
        previous_roll_number: optional(&s.previous_roll_number),
        year_standard_when_left: optional(&s.year_standard_when_left),
        reason_for_leaving: optional(&s.reason_for_leaving),
        reason_for_rejoining: optional(&s.reason_for_rejoining),
    });

    Some(AcademicDetails {
        admission_type: admission_type?,
        current_last_standard,
        current_last_section,
        standard_applying_for: standard_applying_for?,
        previous_school_name: optional(&s.previous_school_name),
        previous_school_address: optional(&s.previous_school_address),
        last_class_attended: optional(&s.last_class_attended),
        year_of_passing_last_class: optional(&s.year_of_passing_last_class),
        marks_percentage_last_exam: optional(&s.marks_percentage_last_exam),
        rejoining,
        extracurricular_interests: optional(&s.extracurricular_interests),
    })
}

fn sibling_details(
    check: &mut FieldCheck,
    s: &AdmissionSubmission,
    visible: VisibleSections,
) -> Option<SiblingDetails> {
    if !visible.sibling_list {
        return Some(SiblingDetails {
            has_siblings_in_school: false,
            entries: Vec::new(),
        });
    }

    let mut entries = Vec::with_capacity(s.siblings.len());
    let mut complete = true;
    for (index, entry) in s.siblings.iter().enumerate() {
        let name = check.required(
            &format!("siblings.{index}.name"),
            &entry.name,
            "Sibling name is required",
        );
        let class_grade = check.required(
            &format!("siblings.{index}.classGrade"),
            &entry.class_grade,
            "Class/Grade is required",
        );
        let branch = check.choice::<SchoolBranch>(
            &format!("siblings.{index}.branch"),
            &entry.branch,
            "Branch is required",
            "Select a valid branch",
        );

        match (name, class_grade, branch) {
            (Some(name), Some(class_grade), Some(branch)) => entries.push(Sibling {
                name,
                class_grade,
                roll_number: optional(&entry.roll_number),
                branch,
            }),
            _ => complete = false,
        }
    }

    complete.then_some(SiblingDetails {
        has_siblings_in_school: true,
        entries,
    })
}

fn parent_details(check: &mut FieldCheck, s: &AdmissionSubmission) -> Option<ParentDetails> {
    let father = parent_contact(
        check,
        "father",
        "Father's",
        [
            &s.father_full_name,
            &s.father_occupation,
            &s.father_annual_income,
            &s.father_mobile_number,
            &s.father_email,
            &s.father_aadhaar_number,
        ],
    );
    let mother = parent_contact(
        check,
        "mother",
        "Mother's",
        [
            &s.mother_full_name,
            &s.mother_occupation,
            &s.mother_annual_income,
            &s.mother_mobile_number,
            &s.mother_email,
            &s.mother_aadhaar_number,
        ],
    );

    let guardian = GuardianContact {
        name: optional(&s.guardian_name),
        relation: optional(&s.guardian_relation),
        occupation: optional(&s.guardian_occupation),
        mobile_number: optional(&s.guardian_mobile_number),
        aadhaar_number: optional(&s.guardian_aadhaar_number),
    };
    let emergency_contact = EmergencyContact {
        name: optional(&s.emergency_contact_name),
        relation: optional(&s.emergency_contact_relation),
        mobile: optional(&s.emergency_contact_mobile),
    };

    Some(ParentDetails {
        father: father?,
        mother: mother?,
        guardian,
        emergency_contact,
    })
}

/// Fields in form order: name, occupation, income, mobile, email, aadhaar.
fn parent_contact(
    check: &mut FieldCheck,
    prefix: &str,
    possessive: &str,
    [full_name, occupation, annual_income, mobile_number, email, aadhaar_number]: [&String; 6],
) -> Option<ParentContact> {
    let full_name = check.required(
        &format!("{prefix}FullName"),
        full_name,
        &format!("{possessive} name is required"),
    );
    let occupation = check.required(
        &format!("{prefix}Occupation"),
        occupation,
        &format!("{possessive} occupation is required"),
    );
    let mobile_number = check.pattern(
        &format!("{prefix}MobileNumber"),
        mobile_number,
        MobileNumber::parse,
        MOBILE_MESSAGE,
    );
    let email = check.optional_email(&format!("{prefix}Email"), email);

    Some(ParentContact {
        full_name: full_name?,
        occupation: occupation?,
        annual_income: optional(annual_income),
        mobile_number: mobile_number?,
        email: email?,
        aadhaar_number: optional(aadhaar_number),
    })
}

fn transport_details(s: &AdmissionSubmission, visible: VisibleSections) -> TransportDetails {
    TransportDetails {
        required: s.transport_required,
        pickup_drop_location: if visible.pickup_location {
            optional(&s.pickup_drop_location)
        } else {
            None
        },
    }
}

fn medical_details(check: &mut FieldCheck, s: &AdmissionSubmission) -> Option<MedicalDetails> {
    let mut vaccinations = Vec::with_capacity(s.vaccinations.len());
    let mut complete = true;
    for (index, entry) in s.vaccinations.iter().enumerate() {
        let vaccine_name = check.required(
            &format!("vaccinations.{index}.vaccineName"),
            &entry.vaccine_name,
            "Vaccine name is required",
        );
        let vaccination_date = check.required(
            &format!("vaccinations.{index}.vaccinationDate"),
            &entry.vaccination_date,
            "Vaccination date is required",
        );

        match (vaccine_name, vaccination_date) {
            (Some(vaccine_name), Some(vaccination_date)) => vaccinations.push(Vaccination {
                vaccine_name,
                vaccination_date,
            }),
            _ => complete = false,
        }
    }

    complete.then_some(MedicalDetails {
        history_or_allergies: optional(&s.medical_history_or_allergies),
        vaccinations,
    })
}
