use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{named_params, params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::domain::{
    AadhaarNumber, AcademicDetails, AdmissionDetails, AdmissionId, BasicInformation,
    EmailAddress, EmergencyContact, GuardianContact, MedicalDetails, MobileNumber, OptionLabel,
    ParentContact, ParentDetails, RejoiningDetails, Sibling, SiblingDetails, StudentDetails,
    TransportDetails, Vaccination,
};
use super::repository::{AdmissionRecord, AdmissionRepository, RepositoryError};
use crate::config::DatabaseConfig;

/// SQLite-backed admission store. One connection, serialized behind a mutex.
#[derive(Clone)]
pub struct SqliteAdmissionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAdmissionRepository {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "cannot create database directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        if config.is_in_memory() {
            Self::in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection lock poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn row_counts(&self) -> (i64, i64, i64) {
        let conn = self.lock().expect("connection available");
        let count = |sql: &str| -> i64 {
            conn.query_row(sql, [], |row| row.get(0))
                .expect("count query runs")
        };
        (
            count("SELECT COUNT(*) FROM admissions"),
            count("SELECT COUNT(*) FROM admission_siblings"),
            count("SELECT COUNT(*) FROM admission_vaccinations"),
        )
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) {
        self.lock()
            .expect("connection available")
            .execute_batch(sql)
            .expect("raw sql runs");
    }
}

fn migrate(conn: &Connection) -> Result<(), RepositoryError> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admissions(
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            school_branch TEXT NOT NULL,
            purpose_of_form TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            student_full_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            gender TEXT NOT NULL,
            nationality TEXT NOT NULL,
            religion TEXT,
            caste_category TEXT NOT NULL,
            sub_caste TEXT,
            aadhaar_number TEXT NOT NULL,
            blood_group TEXT,
            identification_marks TEXT,
            special_needs_or_disabilities TEXT,
            current_residential_address TEXT NOT NULL,
            permanent_address TEXT,
            admission_type TEXT NOT NULL,
            current_last_standard TEXT,
            current_last_section TEXT,
            standard_applying_for TEXT NOT NULL,
            previous_school_name TEXT,
            previous_school_address TEXT,
            last_class_attended TEXT,
            year_of_passing_last_class TEXT,
            marks_percentage_last_exam TEXT,
            is_rejoining INTEGER NOT NULL,
            previous_roll_number TEXT,
            year_standard_when_left TEXT,
            reason_for_leaving TEXT,
            reason_for_rejoining TEXT,
            extracurricular_interests TEXT,
            has_siblings_in_school INTEGER NOT NULL,
            father_full_name TEXT NOT NULL,
            father_occupation TEXT NOT NULL,
            father_annual_income TEXT,
            father_mobile_number TEXT NOT NULL,
            father_email TEXT,
            father_aadhaar_number TEXT,
            mother_full_name TEXT NOT NULL,
            mother_occupation TEXT NOT NULL,
            mother_annual_income TEXT,
            mother_mobile_number TEXT NOT NULL,
            mother_email TEXT,
            mother_aadhaar_number TEXT,
            guardian_name TEXT,
            guardian_relation TEXT,
            guardian_occupation TEXT,
            guardian_mobile_number TEXT,
            guardian_aadhaar_number TEXT,
            emergency_contact_name TEXT,
            emergency_contact_relation TEXT,
            emergency_contact_mobile TEXT,
            transport_required INTEGER NOT NULL,
            pickup_drop_location TEXT,
            medical_history_or_allergies TEXT,
            declaration_accepted INTEGER NOT NULL CHECK (declaration_accepted = 1)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_admissions_created ON admissions(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admission_siblings(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admission_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL CHECK (length(name) > 0),
            class_grade TEXT NOT NULL CHECK (length(class_grade) > 0),
            roll_number TEXT,
            branch TEXT NOT NULL,
            FOREIGN KEY(admission_id) REFERENCES admissions(id) ON DELETE CASCADE,
            UNIQUE(admission_id, position)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_admission_siblings_admission ON admission_siblings(admission_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admission_vaccinations(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admission_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            vaccine_name TEXT NOT NULL CHECK (length(vaccine_name) > 0),
            vaccination_date TEXT NOT NULL CHECK (length(vaccination_date) > 0),
            FOREIGN KEY(admission_id) REFERENCES admissions(id) ON DELETE CASCADE,
            UNIQUE(admission_id, position)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_admission_vaccinations_admission ON admission_vaccinations(admission_id)",
        [],
    )?;

    Ok(())
}

const INSERT_ADMISSION: &str = "INSERT INTO admissions(
    id, created_at, school_branch, purpose_of_form, academic_year,
    student_full_name, date_of_birth, gender, nationality, religion, caste_category, sub_caste,
    aadhaar_number, blood_group, identification_marks, special_needs_or_disabilities,
    current_residential_address, permanent_address,
    admission_type, current_last_standard, current_last_section, standard_applying_for,
    previous_school_name, previous_school_address, last_class_attended,
    year_of_passing_last_class, marks_percentage_last_exam,
    is_rejoining, previous_roll_number, year_standard_when_left, reason_for_leaving,
    reason_for_rejoining, extracurricular_interests, has_siblings_in_school,
    father_full_name, father_occupation, father_annual_income, father_mobile_number,
    father_email, father_aadhaar_number,
    mother_full_name, mother_occupation, mother_annual_income, mother_mobile_number,
    mother_email, mother_aadhaar_number,
    guardian_name, guardian_relation, guardian_occupation, guardian_mobile_number,
    guardian_aadhaar_number,
    emergency_contact_name, emergency_contact_relation, emergency_contact_mobile,
    transport_required, pickup_drop_location, medical_history_or_allergies, declaration_accepted
) VALUES (
    :id, :created_at, :school_branch, :purpose_of_form, :academic_year,
    :student_full_name, :date_of_birth, :gender, :nationality, :religion, :caste_category, :sub_caste,
    :aadhaar_number, :blood_group, :identification_marks, :special_needs_or_disabilities,
    :current_residential_address, :permanent_address,
    :admission_type, :current_last_standard, :current_last_section, :standard_applying_for,
    :previous_school_name, :previous_school_address, :last_class_attended,
    :year_of_passing_last_class, :marks_percentage_last_exam,
    :is_rejoining, :previous_roll_number, :year_standard_when_left, :reason_for_leaving,
    :reason_for_rejoining, :extracurricular_interests, :has_siblings_in_school,
    :father_full_name, :father_occupation, :father_annual_income, :father_mobile_number,
    :father_email, :father_aadhaar_number,
    :mother_full_name, :mother_occupation, :mother_annual_income, :mother_mobile_number,
    :mother_email, :mother_aadhaar_number,
    :guardian_name, :guardian_relation, :guardian_occupation, :guardian_mobile_number,
    :guardian_aadhaar_number,
    :emergency_contact_name, :emergency_contact_relation, :emergency_contact_mobile,
    :transport_required, :pickup_drop_location, :medical_history_or_allergies, :declaration_accepted
)";

const SELECT_ADMISSIONS: &str = "SELECT * FROM admissions";

impl AdmissionRepository for SqliteAdmissionRepository {
    fn insert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let d = &record.details;
        let rejoining = d.academic.rejoining.as_ref();
        let (father, mother) = (&d.parents.father, &d.parents.mother);
        let guardian = &d.parents.guardian;
        let emergency = &d.parents.emergency_contact;

        let inserted = tx.execute(
            INSERT_ADMISSION,
            named_params! {
                ":id": record.id.as_str(),
                ":created_at": encode_timestamp(&record.created_at),
                ":school_branch": d.basic.school_branch.label(),
                ":purpose_of_form": d.basic.purpose_of_form.label(),
                ":academic_year": d.basic.academic_year,
                ":student_full_name": d.student.full_name,
                ":date_of_birth": d.student.date_of_birth,
                ":gender": d.student.gender.label(),
                ":nationality": d.student.nationality,
                ":religion": d.student.religion,
                ":caste_category": d.student.caste_category.label(),
                ":sub_caste": d.student.sub_caste,
                ":aadhaar_number": d.student.aadhaar_number.as_str(),
                ":blood_group": d.student.blood_group.map(OptionLabel::label),
                ":identification_marks": d.student.identification_marks,
                ":special_needs_or_disabilities": d.student.special_needs_or_disabilities,
                ":current_residential_address": d.student.current_residential_address,
                ":permanent_address": d.student.permanent_address,
                ":admission_type": d.academic.admission_type.label(),
                ":current_last_standard": d.academic.current_last_standard,
                ":current_last_section": d.academic.current_last_section,
                ":standard_applying_for": d.academic.standard_applying_for,
                ":previous_school_name": d.academic.previous_school_name,
                ":previous_school_address": d.academic.previous_school_address,
                ":last_class_attended": d.academic.last_class_attended,
                ":year_of_passing_last_class": d.academic.year_of_passing_last_class,
                ":marks_percentage_last_exam": d.academic.marks_percentage_last_exam,
                ":is_rejoining": rejoining.is_some(),
                ":previous_roll_number": rejoining.and_then(|r| r.previous_roll_number.as_deref()),
                ":year_standard_when_left": rejoining.and_then(|r| r.year_standard_when_left.as_deref()),
                ":reason_for_leaving": rejoining.and_then(|r| r.reason_for_leaving.as_deref()),
                ":reason_for_rejoining": rejoining.and_then(|r| r.reason_for_rejoining.as_deref()),
                ":extracurricular_interests": d.academic.extracurricular_interests,
                ":has_siblings_in_school": d.siblings.has_siblings_in_school,
                ":father_full_name": father.full_name,
                ":father_occupation": father.occupation,
                ":father_annual_income": father.annual_income,
                ":father_mobile_number": father.mobile_number.as_str(),
                ":father_email": father.email.as_ref().map(EmailAddress::as_str),
                ":father_aadhaar_number": father.aadhaar_number,
                ":mother_full_name": mother.full_name,
                ":mother_occupation": mother.occupation,
                ":mother_annual_income": mother.annual_income,
                ":mother_mobile_number": mother.mobile_number.as_str(),
                ":mother_email": mother.email.as_ref().map(EmailAddress::as_str),
                ":mother_aadhaar_number": mother.aadhaar_number,
                ":guardian_name": guardian.name,
                ":guardian_relation": guardian.relation,
                ":guardian_occupation": guardian.occupation,
                ":guardian_mobile_number": guardian.mobile_number,
                ":guardian_aadhaar_number": guardian.aadhaar_number,
                ":emergency_contact_name": emergency.name,
                ":emergency_contact_relation": emergency.relation,
                ":emergency_contact_mobile": emergency.mobile,
                ":transport_required": d.transport.required,
                ":pickup_drop_location": d.transport.pickup_drop_location,
                ":medical_history_or_allergies": d.medical.history_or_allergies,
                ":declaration_accepted": d.declaration_accepted,
            },
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation
                    && matches!(
                        failure.extended_code,
                        rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                            | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    ) =>
            {
                return Err(RepositoryError::Conflict);
            }
            Err(other) => return Err(other.into()),
        }

        {
            let mut sibling_stmt = tx.prepare(
                "INSERT INTO admission_siblings(admission_id, position, name, class_grade, roll_number, branch)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for (position, sibling) in d.siblings.entries.iter().enumerate() {
                sibling_stmt.execute(params![
                    record.id.as_str(),
                    position as i64,
                    sibling.name,
                    sibling.class_grade,
                    sibling.roll_number,
                    sibling.branch.label(),
                ])?;
            }

            let mut vaccination_stmt = tx.prepare(
                "INSERT INTO admission_vaccinations(admission_id, position, vaccine_name, vaccination_date)
                 VALUES (?, ?, ?, ?)",
            )?;
            for (position, vaccination) in d.medical.vaccinations.iter().enumerate() {
                vaccination_stmt.execute(params![
                    record.id.as_str(),
                    position as i64,
                    vaccination.vaccine_name,
                    vaccination.vaccination_date,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            admission_id = %record.id,
            siblings = d.siblings.entries.len(),
            vaccinations = d.medical.vaccinations.len(),
            "admission rows committed"
        );
        Ok(record)
    }

    fn fetch(&self, id: &AdmissionId) -> Result<Option<AdmissionRecord>, RepositoryError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{SELECT_ADMISSIONS} WHERE id = ?"),
                [id.as_str()],
                admission_from_row,
            )
            .optional()?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        record.details.siblings.entries = load_siblings(&conn, Some(id))?
            .remove(id.as_str())
            .unwrap_or_default();
        record.details.medical.vaccinations = load_vaccinations(&conn, Some(id))?
            .remove(id.as_str())
            .unwrap_or_default();
        Ok(Some(record))
    }

    fn list_recent(&self) -> Result<Vec<AdmissionRecord>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("{SELECT_ADMISSIONS} ORDER BY created_at DESC, rowid DESC"))?;
        let mut records = stmt
            .query_map([], admission_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut siblings = load_siblings(&conn, None)?;
        let mut vaccinations = load_vaccinations(&conn, None)?;
        for record in &mut records {
            let key = record.id.as_str();
            record.details.siblings.entries = siblings.remove(key).unwrap_or_default();
            record.details.medical.vaccinations = vaccinations.remove(key).unwrap_or_default();
        }
        Ok(records)
    }
}

/// Sibling rows grouped by admission id, in submission order.
fn load_siblings(
    conn: &Connection,
    only: Option<&AdmissionId>,
) -> Result<HashMap<String, Vec<Sibling>>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT admission_id, name, class_grade, roll_number, branch
         FROM admission_siblings
         WHERE ?1 IS NULL OR admission_id = ?1
         ORDER BY admission_id, position",
    )?;
    let rows = stmt.query_map([only.map(AdmissionId::as_str)], |row| {
        Ok((
            row.get::<_, String>("admission_id")?,
            Sibling {
                name: row.get("name")?,
                class_grade: row.get("class_grade")?,
                roll_number: row.get("roll_number")?,
                branch: label_column(row, "branch")?,
            },
        ))
    })?;

    let mut grouped: HashMap<String, Vec<Sibling>> = HashMap::new();
    for row in rows {
        let (admission_id, sibling) = row?;
        grouped.entry(admission_id).or_default().push(sibling);
    }
    Ok(grouped)
}

/// Vaccination rows grouped by admission id, in submission order.
fn load_vaccinations(
    conn: &Connection,
    only: Option<&AdmissionId>,
) -> Result<HashMap<String, Vec<Vaccination>>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT admission_id, vaccine_name, vaccination_date
         FROM admission_vaccinations
         WHERE ?1 IS NULL OR admission_id = ?1
         ORDER BY admission_id, position",
    )?;
    let rows = stmt.query_map([only.map(AdmissionId::as_str)], |row| {
        Ok((
            row.get::<_, String>("admission_id")?,
            Vaccination {
                vaccine_name: row.get("vaccine_name")?,
                vaccination_date: row.get("vaccination_date")?,
            },
        ))
    })?;

    let mut grouped: HashMap<String, Vec<Vaccination>> = HashMap::new();
    for row in rows {
        let (admission_id, vaccination) = row?;
        grouped.entry(admission_id).or_default().push(vaccination);
    }
    Ok(grouped)
}

/// Parent row only; child collections are attached by the caller.
fn admission_from_row(row: &Row<'_>) -> rusqlite::Result<AdmissionRecord> {
    let is_rejoining: bool = row.get("is_rejoining")?;
    let rejoining = if is_rejoining {
        Some(RejoiningDetails {
            previous_roll_number: row.get("previous_roll_number")?,
            year_standard_when_left: row.get("year_standard_when_left")?,
            reason_for_leaving: row.get("reason_for_leaving")?,
            reason_for_rejoining: row.get("reason_for_rejoining")?,
        })
    } else {
        None
    };

    let details = AdmissionDetails {
        basic: BasicInformation {
            school_branch: label_column(row, "school_branch")?,
            purpose_of_form: label_column(row, "purpose_of_form")?,
            academic_year: row.get("academic_year")?,
        },
        student: StudentDetails {
            full_name: row.get("student_full_name")?,
            date_of_birth: row.get("date_of_birth")?,
            gender: label_column(row, "gender")?,
            nationality: row.get("nationality")?,
            religion: row.get("religion")?,
            caste_category: label_column(row, "caste_category")?,
            sub_caste: row.get("sub_caste")?,
            aadhaar_number: checked_column(row, "aadhaar_number", AadhaarNumber::parse)?,
            blood_group: optional_label_column(row, "blood_group")?,
            identification_marks: row.get("identification_marks")?,
            special_needs_or_disabilities: row.get("special_needs_or_disabilities")?,
            current_residential_address: row.get("current_residential_address")?,
            permanent_address: row.get("permanent_address")?,
        },
        academic: AcademicDetails {
            admission_type: label_column(row, "admission_type")?,
            current_last_standard: row.get("current_last_standard")?,
            current_last_section: row.get("current_last_section")?,
            standard_applying_for: row.get("standard_applying_for")?,
            previous_school_name: row.get("previous_school_name")?,
            previous_school_address: row.get("previous_school_address")?,
            last_class_attended: row.get("last_class_attended")?,
            year_of_passing_last_class: row.get("year_of_passing_last_class")?,
            marks_percentage_last_exam: row.get("marks_percentage_last_exam")?,
            rejoining,
            extracurricular_interests: row.get("extracurricular_interests")?,
        },
        siblings: SiblingDetails {
            has_siblings_in_school: row.get("has_siblings_in_school")?,
            entries: Vec::new(),
        },
        parents: ParentDetails {
            father: parent_from_row(row, "father")?,
            mother: parent_from_row(row, "mother")?,
            guardian: GuardianContact {
                name: row.get("guardian_name")?,
                relation: row.get("guardian_relation")?,
                occupation: row.get("guardian_occupation")?,
                mobile_number: row.get("guardian_mobile_number")?,
                aadhaar_number: row.get("guardian_aadhaar_number")?,
            },
            emergency_contact: EmergencyContact {
                name: row.get("emergency_contact_name")?,
                relation: row.get("emergency_contact_relation")?,
                mobile: row.get("emergency_contact_mobile")?,
            },
        },
        transport: TransportDetails {
            required: row.get("transport_required")?,
            pickup_drop_location: row.get("pickup_drop_location")?,
        },
        medical: MedicalDetails {
            history_or_allergies: row.get("medical_history_or_allergies")?,
            vaccinations: Vec::new(),
        },
        declaration_accepted: row.get("declaration_accepted")?,
    };

    Ok(AdmissionRecord {
        id: AdmissionId(row.get("id")?),
        created_at: timestamp_column(row, "created_at")?,
        details,
    })
}

fn parent_from_row(row: &Row<'_>, prefix: &str) -> rusqlite::Result<ParentContact> {
    let column = |name: &str| format!("{prefix}_{name}");
    let email: Option<String> = row.get(column("email").as_str())?;
    let email = match email {
        Some(raw) => Some(
            EmailAddress::parse(&raw)
                .ok_or_else(|| conversion_error(row, &column("email"), raw))?,
        ),
        None => None,
    };

    Ok(ParentContact {
        full_name: row.get(column("full_name").as_str())?,
        occupation: row.get(column("occupation").as_str())?,
        annual_income: row.get(column("annual_income").as_str())?,
        mobile_number: checked_column(row, &column("mobile_number"), MobileNumber::parse)?,
        email,
        aadhaar_number: row.get(column("aadhaar_number").as_str())?,
    })
}

fn label_column<T: OptionLabel>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    checked_column(row, column, T::from_label)
}

fn optional_label_column<T: OptionLabel>(
    row: &Row<'_>,
    column: &str,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|raw| T::from_label(&raw).ok_or_else(|| conversion_error(row, column, raw)))
        .transpose()
}

fn checked_column<T>(
    row: &Row<'_>,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    parse(&raw).ok_or_else(|| conversion_error(row, column, raw))
}

fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| conversion_error(row, column, raw))
}

fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Debug, thiserror::Error)]
#[error("column {column} holds unexpected value '{value}'")]
struct UnexpectedValue {
    column: String,
    value: String,
}

fn conversion_error(row: &Row<'_>, column: &str, value: String) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        Box::new(UnexpectedValue {
            column: column.to_string(),
            value,
        }),
    )
}
