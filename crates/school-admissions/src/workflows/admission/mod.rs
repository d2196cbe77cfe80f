//! School admission intake: form state, validation, persistence and the
//! admin read views.
//!
//! A submission flows from [`AdmissionFormState`] (or straight from JSON)
//! through [`AdmissionValidator`] into [`AdmissionService::submit`], which
//! stores the parent record and its sibling and vaccination rows in one
//! transaction and drops the cached admin list.

pub mod cache;
pub mod domain;
pub mod form;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use cache::MemoryListingCache;
pub use domain::{
    AadhaarNumber, AcademicDetails, AdmissionDetails, AdmissionId, AdmissionSubmission,
    AdmissionType, BasicInformation, BloodGroup, CasteCategory, EmailAddress, EmergencyContact,
    Gender, GuardianContact, MedicalDetails, MobileNumber, OptionLabel, ParentContact,
    ParentDetails, PurposeOfForm, RejoiningDetails, SchoolBranch, Sibling, SiblingDetails,
    SiblingEntry, StudentDetails, TransportDetails, Vaccination, VaccinationEntry,
    VisibleSections, DEFAULT_NATIONALITY,
};
pub use form::{AdmissionFormState, FieldValue, FormError, FormPhase, SectionVisibility};
pub use repository::{AdmissionRecord, AdmissionRepository, ListingCache, RepositoryError};
pub use router::admission_router;
pub use service::{
    AdmissionService, AdmissionServiceError, SubmissionOutcome, CORRECT_FIELDS_MESSAGE,
    SUBMISSION_FAILED_MESSAGE,
};
pub use sqlite::SqliteAdmissionRepository;
pub use validation::{AdmissionValidator, ValidationErrors, DECLARATION_MESSAGE};
pub use views::{
    AdmissionDetailView, AdmissionListView, AdmissionSummaryRow, DetailGroup, DetailItem,
    DetailSection, EMPTY_LIST_MESSAGE,
};
