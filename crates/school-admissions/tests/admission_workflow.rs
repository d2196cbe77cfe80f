//! End-to-end scenarios for admission intake through the public form, service
//! and HTTP facades, backed by an in-memory SQLite store.

mod common {
    use std::sync::Arc;

    use school_admissions::workflows::admission::{
        AdmissionFormState, AdmissionService, MemoryListingCache, SqliteAdmissionRepository,
    };

    pub(super) type Service = AdmissionService<SqliteAdmissionRepository, MemoryListingCache>;

    pub(super) fn service() -> Arc<Service> {
        let repository =
            Arc::new(SqliteAdmissionRepository::in_memory().expect("in-memory store opens"));
        Arc::new(AdmissionService::new(
            repository,
            Arc::new(MemoryListingCache::default()),
        ))
    }

    pub(super) fn fill(form: &mut AdmissionFormState, student: &str) {
        for (path, value) in [
            ("schoolBranch", "T. Pudur"),
            ("purposeOfForm", "New Admission"),
            ("studentFullName", student),
            ("dateOfBirth", "2018-08-21"),
            ("gender", "Female"),
            ("casteCategory", "EWS"),
            ("aadhaarNumber", "111122223333"),
            ("currentResidentialAddress", "21 Market Street, T. Pudur"),
            ("admissionType", "New Admission"),
            ("standardApplyingFor", "LKG"),
            ("fatherFullName", "Gopal S"),
            ("fatherOccupation", "Shopkeeper"),
            ("fatherMobileNumber", "9345678901"),
            ("motherFullName", "Uma Gopal"),
            ("motherOccupation", "Homemaker"),
            ("motherMobileNumber", "9345678902"),
        ] {
            form.set_field(path, value).expect("field accepted");
        }
        form.use_current_academic_year(true)
            .expect("academic year filled");
        form.set_field("declarationAccepted", true)
            .expect("declaration accepted");
    }
}

mod form_to_views {
    use super::common::*;

    use school_admissions::workflows::admission::{
        AdmissionFormState, FormPhase, EMPTY_LIST_MESSAGE,
    };

    #[test]
    fn submitted_forms_appear_in_list_and_detail_views() {
        let service = service();
        assert_eq!(
            service.list().expect("list loads").empty_message,
            Some(EMPTY_LIST_MESSAGE)
        );

        let mut form = AdmissionFormState::new();
        fill(&mut form, "Priya Gopal");
        form.set_field("hasSiblingsInSchool", true)
            .expect("flag set");
        let index = form.append_sibling().expect("sibling row");
        for (field, value) in [
            ("name", "Karthik Gopal"),
            ("classGrade", "Grade 3"),
            ("branch", "T. Pudur"),
        ] {
            form.set_field(&format!("siblings.{index}.{field}"), value)
                .expect("sibling field set");
        }

        let outcome = form.submit_to(&*service).expect("submit runs");
        assert!(outcome.success, "submission failed: {outcome:?}");
        let id = outcome.id.expect("id assigned");
        assert!(matches!(form.phase(), FormPhase::Submitted { .. }));

        let list = service.list().expect("list loads");
        assert_eq!(list.total, 1);
        assert_eq!(list.rows[0].student_name, "Priya Gopal");
        assert_eq!(list.rows[0].detail_href, format!("/admin/{id}"));

        let detail = service.detail(&id).expect("detail loads");
        let siblings = detail
            .section("Siblings in School")
            .expect("sibling section shown");
        assert_eq!(siblings.groups[0].items[0].value, "Karthik Gopal");
        let basic = detail.section("Basic Information").expect("basic section");
        let year = basic.item("Academic Year").expect("year shown");
        assert_eq!(year.len(), "2025-2026".len());
    }

    #[test]
    fn second_submission_lists_first() {
        let service = service();
        for student in ["First Child", "Second Child"] {
            let mut form = AdmissionFormState::new();
            fill(&mut form, student);
            let outcome = form.submit_to(&*service).expect("submit runs");
            assert!(outcome.success);
        }

        let names: Vec<String> = service
            .list()
            .expect("list loads")
            .rows
            .into_iter()
            .map(|row| row.student_name)
            .collect();
        assert_eq!(names, ["Second Child", "First Child"]);
    }
}

mod http {
    use super::common::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use school_admissions::workflows::admission::admission_router;

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("valid json")
    }

    #[tokio::test]
    async fn invalid_then_valid_submission_over_http() {
        let router = admission_router(service());
        let mut payload = json!({
            "schoolBranch": "Surakullam",
            "purposeOfForm": "New Admission",
            "academicYear": "2025-2026",
            "studentFullName": "Nandini R",
            "dateOfBirth": "2019-02-02",
            "gender": "Female",
            "casteCategory": "ST",
            "aadhaarNumber": "55556666",
            "currentResidentialAddress": "5 Hill Road",
            "admissionType": "New Admission",
            "standardApplyingFor": "UKG",
            "fatherFullName": "Raja N",
            "fatherOccupation": "Mason",
            "fatherMobileNumber": "9111122222",
            "motherFullName": "Rani R",
            "motherOccupation": "Weaver",
            "motherMobileNumber": "9111133333",
            "declarationAccepted": true
        });

        let request = |body: &Value| {
            Request::post("/api/v1/admissions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds")
        };

        let response = router
            .clone()
            .oneshot(request(&payload))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fieldErrors"]["aadhaarNumber"], json!(["Aadhaar must be 12 digits"]));

        payload["aadhaarNumber"] = json!("555566667777");
        let response = router
            .clone()
            .oneshot(request(&payload))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"]
            .as_str()
            .expect("id returned")
            .to_string();

        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/admissions/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::get("/api/v1/admissions/unknown")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
