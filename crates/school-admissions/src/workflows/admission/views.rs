use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    AdmissionDetails, AdmissionId, EmergencyContact, GuardianContact, OptionLabel, ParentContact,
};
use super::repository::AdmissionRecord;

pub const EMPTY_LIST_MESSAGE: &str = "No submissions yet";

const MISSING_VALUE: &str = "-";

/// One row of the admin list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionSummaryRow {
    pub id: AdmissionId,
    pub submitted_at: DateTime<Utc>,
    pub submitted_on: NaiveDate,
    pub student_name: String,
    pub branch: &'static str,
    pub class_applying: String,
    pub father_mobile: String,
    pub detail_href: String,
}

impl AdmissionSummaryRow {
    fn from_record(record: &AdmissionRecord) -> Self {
        let details = &record.details;
        Self {
            id: record.id.clone(),
            submitted_at: record.created_at,
            submitted_on: record.created_at.date_naive(),
            student_name: details.student.full_name.clone(),
            branch: details.basic.school_branch.label(),
            class_applying: details.academic.standard_applying_for.clone(),
            father_mobile: details.parents.father.mobile_number.as_str().to_string(),
            detail_href: format!("/admin/{}", record.id),
        }
    }
}

/// Admin list: every submission, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionListView {
    pub total: usize,
    pub rows: Vec<AdmissionSummaryRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
}

impl AdmissionListView {
    /// Rows keep the order of `records`; callers pass them newest first.
    pub fn from_records(records: &[AdmissionRecord]) -> Self {
        let rows: Vec<_> = records.iter().map(AdmissionSummaryRow::from_record).collect();
        Self {
            total: rows.len(),
            empty_message: rows.is_empty().then_some(EMPTY_LIST_MESSAGE),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailItem {
    pub label: &'static str,
    pub value: String,
}

impl DetailItem {
    fn text(label: &'static str, value: &str) -> Self {
        let value = if value.trim().is_empty() {
            MISSING_VALUE.to_string()
        } else {
            value.to_string()
        };
        Self { label, value }
    }

    fn optional(label: &'static str, value: Option<&str>) -> Self {
        Self::text(label, value.unwrap_or_default())
    }

    fn flag(label: &'static str, value: bool) -> Self {
        let value = if value { "Yes" } else { "No" };
        Self {
            label,
            value: value.to_string(),
        }
    }
}

/// Titled sub-block inside a section, e.g. "Father's Details" or "Sibling 2".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailGroup {
    pub title: String,
    pub items: Vec<DetailItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailSection {
    pub title: &'static str,
    pub items: Vec<DetailItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<DetailGroup>,
}

impl DetailSection {
    fn new(title: &'static str, items: Vec<DetailItem>) -> Self {
        Self {
            title,
            items,
            groups: Vec::new(),
        }
    }

    pub fn item(&self, label: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.value.as_str())
    }

    pub fn group(&self, title: &str) -> Option<&DetailGroup> {
        self.groups.iter().find(|group| group.title == title)
    }
}

/// Sectioned rendering of a single admission.
///
/// Conditional parts follow the same rules as the form: rejoining details,
/// the sibling list, guardian and emergency contacts, the pickup location and
/// the vaccination list only appear when they carry something.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionDetailView {
    pub id: AdmissionId,
    pub submitted_at: DateTime<Utc>,
    pub sections: Vec<DetailSection>,
}

impl AdmissionDetailView {
    pub fn from_record(record: &AdmissionRecord) -> Self {
        let details = &record.details;
        let mut sections = vec![
            basic_section(details),
            student_section(details),
            academic_section(details),
        ];
        if let Some(siblings) = sibling_section(details) {
            sections.push(siblings);
        }
        sections.push(parent_section(details));
        sections.push(transport_section(details));
        sections.push(medical_section(details));
        sections.push(DetailSection::new(
            "Declaration",
            vec![DetailItem::flag(
                "Declaration Accepted",
                details.declaration_accepted,
            )],
        ));

        Self {
            id: record.id.clone(),
            submitted_at: record.created_at,
            sections,
        }
    }

    pub fn section(&self, title: &str) -> Option<&DetailSection> {
        self.sections.iter().find(|section| section.title == title)
    }
}

fn basic_section(details: &AdmissionDetails) -> DetailSection {
    let basic = &details.basic;
    DetailSection::new(
        "Basic Information",
        vec![
            DetailItem::text("School Branch", basic.school_branch.label()),
            DetailItem::text("Purpose of Form", basic.purpose_of_form.label()),
            DetailItem::text("Academic Year", &basic.academic_year),
        ],
    )
}

fn student_section(details: &AdmissionDetails) -> DetailSection {
    let student = &details.student;
    DetailSection::new(
        "Student Details",
        vec![
            DetailItem::text("Full Name", &student.full_name),
            DetailItem::text("Date of Birth", &student.date_of_birth),
            DetailItem::text("Gender", student.gender.label()),
            DetailItem::text("Nationality", &student.nationality),
            DetailItem::optional("Religion", student.religion.as_deref()),
            DetailItem::text("Caste Category", student.caste_category.label()),
            DetailItem::optional("Sub-Caste", student.sub_caste.as_deref()),
            DetailItem::text("Aadhaar Number", student.aadhaar_number.as_str()),
            DetailItem::optional("Blood Group", student.blood_group.map(OptionLabel::label)),
            DetailItem::optional(
                "Identification Marks",
                student.identification_marks.as_deref(),
            ),
            DetailItem::optional(
                "Special Needs",
                student.special_needs_or_disabilities.as_deref(),
            ),
            DetailItem::text("Current Address", &student.current_residential_address),
            DetailItem::optional("Permanent Address", student.permanent_address.as_deref()),
        ],
    )
}

fn academic_section(details: &AdmissionDetails) -> DetailSection {
    let academic = &details.academic;
    let mut items = vec![
        DetailItem::text("Admission Type", academic.admission_type.label()),
        DetailItem::text("Standard Applying For", &academic.standard_applying_for),
        DetailItem::optional(
            "Current/Last Standard",
            academic.current_last_standard.as_deref(),
        ),
        DetailItem::optional(
            "Current/Last Section",
            academic.current_last_section.as_deref(),
        ),
        DetailItem::optional("Previous School", academic.previous_school_name.as_deref()),
        DetailItem::optional(
            "Previous School Address",
            academic.previous_school_address.as_deref(),
        ),
        DetailItem::optional(
            "Last Class Attended",
            academic.last_class_attended.as_deref(),
        ),
        DetailItem::optional(
            "Year of Passing",
            academic.year_of_passing_last_class.as_deref(),
        ),
        DetailItem::optional(
            "Marks/Percentage",
            academic.marks_percentage_last_exam.as_deref(),
        ),
        DetailItem::flag("Is Rejoining", academic.is_rejoining()),
    ];

    if let Some(rejoining) = &academic.rejoining {
        items.extend([
            DetailItem::optional(
                "Previous Roll Number",
                rejoining.previous_roll_number.as_deref(),
            ),
            DetailItem::optional(
                "Year/Standard When Left",
                rejoining.year_standard_when_left.as_deref(),
            ),
            DetailItem::optional("Reason for Leaving", rejoining.reason_for_leaving.as_deref()),
            DetailItem::optional(
                "Reason for Rejoining",
                rejoining.reason_for_rejoining.as_deref(),
            ),
        ]);
    }

    items.push(DetailItem::optional(
        "Extracurricular Interests",
        academic.extracurricular_interests.as_deref(),
    ));
    DetailSection::new("Academic Details", items)
}

fn sibling_section(details: &AdmissionDetails) -> Option<DetailSection> {
    let siblings = &details.siblings;
    if !siblings.has_siblings_in_school || siblings.entries.is_empty() {
        return None;
    }

    let groups = siblings
        .entries
        .iter()
        .enumerate()
        .map(|(index, sibling)| DetailGroup {
            title: format!("Sibling {}", index + 1),
            items: vec![
                DetailItem::text("Name", &sibling.name),
                DetailItem::text("Class/Grade", &sibling.class_grade),
                DetailItem::optional("Roll Number", sibling.roll_number.as_deref()),
                DetailItem::text("Branch", sibling.branch.label()),
            ],
        })
        .collect();

    Some(DetailSection {
        title: "Siblings in School",
        items: Vec::new(),
        groups,
    })
}

fn parent_section(details: &AdmissionDetails) -> DetailSection {
    let parents = &details.parents;
    let mut groups = vec![
        parent_group("Father's Details", &parents.father),
        parent_group("Mother's Details", &parents.mother),
    ];
    if let Some(guardian) = guardian_group(&parents.guardian) {
        groups.push(guardian);
    }
    if let Some(emergency) = emergency_group(&parents.emergency_contact) {
        groups.push(emergency);
    }

    DetailSection {
        title: "Parent/Guardian Details",
        items: Vec::new(),
        groups,
    }
}

fn parent_group(title: &str, parent: &ParentContact) -> DetailGroup {
    DetailGroup {
        title: title.to_string(),
        items: vec![
            DetailItem::text("Name", &parent.full_name),
            DetailItem::text("Occupation", &parent.occupation),
            DetailItem::optional("Annual Income", parent.annual_income.as_deref()),
            DetailItem::text("Mobile", parent.mobile_number.as_str()),
            DetailItem::optional("Email", parent.email.as_ref().map(|email| email.as_str())),
            DetailItem::optional("Aadhaar", parent.aadhaar_number.as_deref()),
        ],
    }
}

fn guardian_group(guardian: &GuardianContact) -> Option<DetailGroup> {
    let name = guardian.name.as_deref()?;
    Some(DetailGroup {
        title: "Guardian Details".to_string(),
        items: vec![
            DetailItem::text("Name", name),
            DetailItem::optional("Relation", guardian.relation.as_deref()),
            DetailItem::optional("Occupation", guardian.occupation.as_deref()),
            DetailItem::optional("Mobile", guardian.mobile_number.as_deref()),
            DetailItem::optional("Aadhaar", guardian.aadhaar_number.as_deref()),
        ],
    })
}

fn emergency_group(contact: &EmergencyContact) -> Option<DetailGroup> {
    let name = contact.name.as_deref()?;
    Some(DetailGroup {
        title: "Emergency Contact".to_string(),
        items: vec![
            DetailItem::text("Name", name),
            DetailItem::optional("Relation", contact.relation.as_deref()),
            DetailItem::optional("Mobile", contact.mobile.as_deref()),
        ],
    })
}

fn transport_section(details: &AdmissionDetails) -> DetailSection {
    let transport = &details.transport;
    let mut items = vec![DetailItem::flag("Transport Required", transport.required)];
    if transport.required {
        items.push(DetailItem::optional(
            "Pickup/Drop Location",
            transport.pickup_drop_location.as_deref(),
        ));
    }
    DetailSection::new("Transport Details", items)
}

fn medical_section(details: &AdmissionDetails) -> DetailSection {
    let medical = &details.medical;
    let groups = medical
        .vaccinations
        .iter()
        .enumerate()
        .map(|(index, vaccination)| DetailGroup {
            title: format!("Vaccination {}", index + 1),
            items: vec![
                DetailItem::text("Vaccine Name", &vaccination.vaccine_name),
                DetailItem::text("Date", &vaccination.vaccination_date),
            ],
        })
        .collect();

    DetailSection {
        title: "Medical History & Vaccination",
        items: vec![DetailItem::optional(
            "Medical History/Allergies",
            medical.history_or_allergies.as_deref(),
        )],
        groups,
    }
}
