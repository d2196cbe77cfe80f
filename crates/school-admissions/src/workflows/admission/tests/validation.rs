use super::common::*;
use crate::workflows::admission::domain::{
    AdmissionSubmission, BloodGroup, SchoolBranch, SiblingEntry,
};
use crate::workflows::admission::validation::{AdmissionValidator, DECLARATION_MESSAGE};

#[test]
fn complete_submission_produces_typed_details() {
    let details = AdmissionValidator
        .validate(&submission())
        .expect("valid submission");

    assert_eq!(details.basic.school_branch, SchoolBranch::TPudur);
    assert_eq!(details.student.blood_group, Some(BloodGroup::OPositive));
    assert_eq!(details.student.aadhaar_number.as_str(), "123412341234");
    assert_eq!(
        details.parents.father.email.as_ref().map(|email| email.as_str()),
        Some("suresh.raman@example.com")
    );
    assert_eq!(details.parents.mother.email, None);
    assert!(details.declaration_accepted);
}

#[test]
fn blank_form_reports_every_required_field() {
    let errors = AdmissionValidator
        .validate(&AdmissionSubmission::blank())
        .expect_err("blank form is invalid");

    for path in [
        "schoolBranch",
        "purposeOfForm",
        "academicYear",
        "studentFullName",
        "dateOfBirth",
        "gender",
        "casteCategory",
        "aadhaarNumber",
        "currentResidentialAddress",
        "admissionType",
        "standardApplyingFor",
        "fatherFullName",
        "fatherOccupation",
        "fatherMobileNumber",
        "motherFullName",
        "motherOccupation",
        "motherMobileNumber",
        "declarationAccepted",
    ] {
        assert!(errors.contains(path), "missing error for {path}");
    }
    assert!(!errors.contains("nationality"), "nationality defaults to Indian");
    assert!(!errors.contains("fatherEmail"));
    assert!(!errors.contains("guardianName"));
}

#[test]
fn whitespace_only_values_count_as_missing() {
    let submission = AdmissionSubmission {
        student_full_name: "   ".to_string(),
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("blank name rejected");
    assert_eq!(
        errors.messages_for("studentFullName"),
        ["Student name is required".to_string()]
    );
}

#[test]
fn aadhaar_must_be_exactly_twelve_digits() {
    for bad in ["12345678901", "1234567890123", "12345678901a", "1234 5678 9012"] {
        let submission = AdmissionSubmission {
            aadhaar_number: bad.to_string(),
            ..submission()
        };
        let errors = AdmissionValidator
            .validate(&submission)
            .expect_err("aadhaar rejected");
        assert_eq!(
            errors.messages_for("aadhaarNumber"),
            ["Aadhaar must be 12 digits".to_string()],
            "input {bad}"
        );
    }
}

#[test]
fn parent_mobile_numbers_must_be_ten_digits() {
    let submission = AdmissionSubmission {
        father_mobile_number: "987654321".to_string(),
        mother_mobile_number: "91234567801".to_string(),
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("mobiles rejected");

    assert_eq!(
        errors.messages_for("fatherMobileNumber"),
        ["Mobile must be 10 digits".to_string()]
    );
    assert_eq!(
        errors.messages_for("motherMobileNumber"),
        ["Mobile must be 10 digits".to_string()]
    );
    assert_eq!(errors.len(), 2);
}

#[test]
fn optional_email_is_checked_only_when_present() {
    let submission = AdmissionSubmission {
        mother_email: "lakshmi at example".to_string(),
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("bad email rejected");
    assert_eq!(
        errors.messages_for("motherEmail"),
        ["Invalid email address".to_string()]
    );
}

#[test]
fn declaration_must_be_accepted() {
    let submission = AdmissionSubmission {
        declaration_accepted: false,
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("declaration required");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.messages_for("declarationAccepted"),
        [DECLARATION_MESSAGE.to_string()]
    );
}

#[test]
fn unknown_option_labels_are_rejected() {
    let submission = AdmissionSubmission {
        school_branch: "Coimbatore".to_string(),
        blood_group: "Z+".to_string(),
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("unknown labels rejected");
    assert_eq!(
        errors.messages_for("schoolBranch"),
        ["Select a valid school branch".to_string()]
    );
    assert!(errors.contains("bloodGroup"));
}

#[test]
fn sibling_rows_are_validated_with_indexed_paths() {
    let mut submission = submission_with_siblings(&["Kavin", "Meera"]);
    submission.siblings[1] = SiblingEntry {
        branch: "Surakullam".to_string(),
        ..SiblingEntry::default()
    };

    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("incomplete sibling rejected");
    let paths: Vec<&str> = errors.paths().collect();
    assert_eq!(paths, ["siblings.1.classGrade", "siblings.1.name"]);
}

#[test]
fn hidden_sections_are_not_validated_and_are_dropped() {
    let submission = AdmissionSubmission {
        has_siblings_in_school: false,
        siblings: vec![SiblingEntry::default()],
        is_rejoining: false,
        previous_roll_number: "R-17".to_string(),
        transport_required: false,
        pickup_drop_location: "Bus stand".to_string(),
        current_last_standard: "Grade 1".to_string(),
        ..submission()
    };

    let details = AdmissionValidator
        .validate(&submission)
        .expect("hidden rows are ignored");
    assert!(details.siblings.entries.is_empty());
    assert!(details.academic.rejoining.is_none());
    assert!(details.transport.pickup_drop_location.is_none());
    assert!(
        details.academic.current_last_standard.is_none(),
        "new admissions carry no current standing"
    );
}

#[test]
fn visible_conditional_sections_are_kept() {
    let submission = AdmissionSubmission {
        admission_type: "Re-Admission".to_string(),
        current_last_standard: "Grade 5".to_string(),
        current_last_section: "B".to_string(),
        is_rejoining: true,
        reason_for_leaving: "Family relocated".to_string(),
        transport_required: true,
        pickup_drop_location: "Bus stand".to_string(),
        ..submission()
    };

    let details = AdmissionValidator
        .validate(&submission)
        .expect("valid submission");
    assert_eq!(details.academic.current_last_section.as_deref(), Some("B"));
    let rejoining = details.academic.rejoining.expect("rejoining kept");
    assert_eq!(
        rejoining.reason_for_leaving.as_deref(),
        Some("Family relocated")
    );
    assert_eq!(rejoining.previous_roll_number, None);
    assert_eq!(
        details.transport.pickup_drop_location.as_deref(),
        Some("Bus stand")
    );
}

#[test]
fn vaccination_rows_require_name_and_date() {
    let submission = AdmissionSubmission {
        vaccinations: vec![vaccination("MMR", "2019-05-01"), vaccination("", "")],
        ..submission()
    };
    let errors = AdmissionValidator
        .validate(&submission)
        .expect_err("incomplete vaccination rejected");
    assert!(errors.contains("vaccinations.1.vaccineName"));
    assert!(errors.contains("vaccinations.1.vaccinationDate"));
    assert!(!errors.contains("vaccinations.0.vaccineName"));
}
