use super::*;
use crate::client::{ApiClient, RetryPolicy};
use crate::request::MockHttpClient;
use crate::session::SessionState;
use crate::storage::MemoryStorage;
use folio_shared::protocol::HttpMethod;
use folio_shared::{EducationKind, SkillCategory, SkillLevel, TOKEN_STORAGE_KEY};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::rc::Rc;

const BASE: &str = "http://api.test/api";

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn services() -> (Rc<MockHttpClient>, PortfolioService, AdminService) {
    let storage = MemoryStorage::with_entry(TOKEN_STORAGE_KEY, "admin-token");
    let state = Rc::new(SessionState::new(Box::new(storage), TOKEN_STORAGE_KEY));
    state.restore();
    let http = Rc::new(MockHttpClient::new());
    let client = ApiClient::new(BASE, RetryPolicy::none(), http.clone(), state);
    (
        http,
        PortfolioService::new(client.clone()),
        AdminService::new(client),
    )
}

fn skill_json(id: i64, name: &str) -> Value {
    json!({"id": id, "nombre": name, "nivel": "Avanzado", "categoria": "Frontend", "iconoUrl": null})
}

fn project_json(id: i64, fecha: &str, skills: Vec<Value>) -> Value {
    json!({
        "id": id,
        "titulo": format!("Project {id}"),
        "descripcion": "desc",
        "urlDemo": null,
        "urlRepo": null,
        "imageUrl": null,
        "fecha": fecha,
        "skills": skills
    })
}

fn new_project_form(skills: &[EntityId]) -> ProjectForm {
    let mut form = ProjectForm::new();
    form.title = "Project 10".into();
    form.description = "desc".into();
    form.date = "2024-06-01".into();
    for id in skills {
        form.toggle_skill(*id);
    }
    form
}

/// (method, path) of every request, in send order.
fn call_log(http: &MockHttpClient) -> Vec<(HttpMethod, String)> {
    http.requests
        .borrow()
        .iter()
        .map(|r| (r.method, r.url.trim_start_matches(BASE).to_string()))
        .collect()
}

// =========================================================
// Projects
// =========================================================

#[tokio::test]
async fn create_with_two_skills_links_once_then_reloads() {
    let (http, portfolio, admin) = services();
    http.mock_response(
        HttpMethod::Get,
        &url("/skills"),
        200,
        json!([skill_json(1, "React"), skill_json(2, "Go")]),
    );
    http.mock_response(HttpMethod::Get, &url("/projects"), 200, json!([]));
    http.mock_response(
        HttpMethod::Get,
        &url("/projects"),
        200,
        json!([project_json(10, "2024-06-01", vec![skill_json(2, "Go"), skill_json(1, "React")])]),
    );
    http.mock_response(HttpMethod::Post, &url("/projects"), 201, project_json(10, "2024-06-01", vec![]));
    http.mock_response(
        HttpMethod::Post,
        &url("/projects/add-skills"),
        200,
        project_json(10, "2024-06-01", vec![skill_json(1, "React"), skill_json(2, "Go")]),
    );

    let manager = ProjectManager::new(portfolio, admin);
    manager.load().await.unwrap();
    assert_eq!(manager.skills().data().unwrap().len(), 2);
    http.requests.borrow_mut().clear();

    let saved = manager.save(&new_project_form(&[1, 2]), None).await.unwrap();
    assert_eq!(saved.id, 10);

    let links = http.requests_to(HttpMethod::Post, &url("/projects/add-skills"));
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].json_body(), json!({"projectId": 10, "skillIds": [1, 2]}));

    // write before reload
    assert_eq!(
        call_log(&http),
        vec![
            (HttpMethod::Post, "/projects".to_string()),
            (HttpMethod::Post, "/projects/add-skills".to_string()),
            (HttpMethod::Get, "/projects".to_string()),
        ]
    );

    let reloaded = manager.projects().data().unwrap();
    let linked: BTreeSet<EntityId> = reloaded[0].skill_ids().into_iter().collect();
    assert_eq!(linked, BTreeSet::from([1, 2]));
}

#[tokio::test]
async fn empty_association_reply_counts_as_linked() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Post, &url("/projects"), 201, project_json(12, "2024-06-01", vec![]));
    http.mock_response(HttpMethod::Post, &url("/projects/add-skills"), 200, Value::Null);
    http.mock_response(
        HttpMethod::Get,
        &url("/projects"),
        200,
        json!([project_json(12, "2024-06-01", vec![skill_json(1, "React"), skill_json(2, "Go")])]),
    );

    let manager = ProjectManager::new(portfolio, admin);
    let saved = manager.save(&new_project_form(&[1, 2]), None).await.unwrap();

    assert_eq!(saved.id, 12);
    assert_eq!(saved.skill_ids(), vec![1, 2]);
    assert_eq!(http.requests_to(HttpMethod::Post, &url("/projects/add-skills")).len(), 1);
}

#[tokio::test]
async fn save_without_skills_skips_association() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Put, &url("/projects/4"), 200, project_json(4, "2023-01-01", vec![]));
    http.mock_response(HttpMethod::Get, &url("/projects"), 200, json!([]));

    let manager = ProjectManager::new(portfolio, admin);
    manager.save(&new_project_form(&[]), Some(4)).await.unwrap();

    assert!(http.requests_to(HttpMethod::Post, &url("/projects/add-skills")).is_empty());
    assert_eq!(http.requests_to(HttpMethod::Put, &url("/projects/4")).len(), 1);
    assert_eq!(http.requests_to(HttpMethod::Get, &url("/projects")).len(), 1);
}

#[tokio::test]
async fn failed_association_reports_saved_project() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Post, &url("/projects"), 201, project_json(11, "2024-06-01", vec![]));
    http.mock_response(HttpMethod::Post, &url("/projects/add-skills"), 500, json!({}));
    http.mock_response(HttpMethod::Get, &url("/projects"), 200, json!([project_json(11, "2024-06-01", vec![])]));

    let manager = ProjectManager::new(portfolio, admin);
    let err = manager.save(&new_project_form(&[3]), None).await.unwrap_err();

    match err {
        ProjectSaveError::SkillsNotLinked {
            project, skill_ids, ..
        } => {
            assert_eq!(project.id, 11);
            assert_eq!(skill_ids, vec![3]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // the list still refreshes and shows the project without skills
    assert_eq!(manager.projects().data().unwrap()[0].id, 11);
}

#[tokio::test]
async fn failed_write_does_not_associate_or_reload() {
    let (http, portfolio, admin) = services();
    http.mock_response(
        HttpMethod::Post,
        &url("/projects"),
        400,
        json!({"message": "titulo must not be blank"}),
    );

    let manager = ProjectManager::new(portfolio, admin);
    let err = manager.save(&new_project_form(&[1]), None).await.unwrap_err();

    assert!(matches!(err, ProjectSaveError::Write(_)));
    assert_eq!(call_log(&http), vec![(HttpMethod::Post, "/projects".to_string())]);
}

#[tokio::test]
async fn invalid_form_never_reaches_network() {
    let (http, portfolio, admin) = services();
    let manager = ProjectManager::new(portfolio, admin);

    let err = manager.save(&ProjectForm::new(), None).await.unwrap_err();

    assert!(matches!(err, ProjectSaveError::Write(ref e) if e.kind == FolioErrorKind::InvalidInput));
    assert!(http.requests.borrow().is_empty());
}

#[tokio::test]
async fn projects_are_listed_newest_first() {
    let (http, portfolio, admin) = services();
    http.mock_response(
        HttpMethod::Get,
        &url("/projects"),
        200,
        json!([
            project_json(1, "2021-01-01", vec![]),
            project_json(2, "2024-01-01", vec![]),
            project_json(3, "2022-06-01", vec![])
        ]),
    );
    http.mock_response(HttpMethod::Get, &url("/skills"), 200, json!([]));

    let manager = ProjectManager::new(portfolio, admin);
    manager.load().await.unwrap();

    let ids: Vec<EntityId> = manager.projects().data().unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

// =========================================================
// Skills
// =========================================================

#[tokio::test]
async fn deleting_referenced_skill_is_a_conflict() {
    for status in [409, 500] {
        let (http, portfolio, admin) = services();
        http.mock_response(HttpMethod::Delete, &url("/skills/1"), status, json!({}));

        let manager = SkillManager::new(portfolio, admin);
        let err = manager.delete(1).await.unwrap_err();

        assert!(matches!(err, SkillDeleteError::StillReferenced(_)), "status {status}");
        assert!(err.user_message().contains("used by at least one project"));
        assert!(http.requests_to(HttpMethod::Get, &url("/skills")).is_empty());
    }
}

#[tokio::test]
async fn deleting_skill_without_response_is_connectivity() {
    let (http, portfolio, admin) = services();
    http.mock_network_failure(HttpMethod::Delete, &url("/skills/1"));

    let manager = SkillManager::new(portfolio, admin);
    let err = manager.delete(1).await.unwrap_err();

    assert!(matches!(err, SkillDeleteError::Connectivity(_)));
    assert_eq!(err.user_message(), crate::error::CONNECTION_ERROR_MESSAGE);
}

#[tokio::test]
async fn deleting_skill_with_expired_session() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Delete, &url("/skills/1"), 401, json!({}));

    let manager = SkillManager::new(portfolio, admin);
    let err = manager.delete(1).await.unwrap_err();

    assert!(matches!(err, SkillDeleteError::SessionExpired(_)));
}

#[tokio::test]
async fn create_skill_sends_defaults_and_reloads() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Post, &url("/skills"), 201, skill_json(5, "Svelte"));
    http.mock_response(HttpMethod::Get, &url("/skills"), 200, json!([skill_json(5, "Svelte")]));

    let manager = SkillManager::new(portfolio, admin);
    let mut form = SkillForm::new();
    form.name = "Svelte".into();
    manager.create(&form).await.unwrap();

    let body = http.requests_to(HttpMethod::Post, &url("/skills"))[0].json_body();
    assert_eq!(
        body,
        json!({"nombre": "Svelte", "nivel": "Intermedio", "categoria": "Frontend", "iconoUrl": null})
    );
    assert_eq!(manager.skills().data().unwrap().len(), 1);
    assert_eq!(form.level, SkillLevel::Intermediate);
    assert_eq!(form.category, SkillCategory::Frontend);
}

// =========================================================
// Timeline / Profile
// =========================================================

#[tokio::test]
async fn experience_update_sends_null_end_date_then_reloads_sorted() {
    let (http, portfolio, admin) = services();
    http.mock_response(
        HttpMethod::Put,
        &url("/experience/2"),
        200,
        json!({"id": 2, "empresa": "Acme", "puesto": "Lead", "descripcion": "", "fechaInicio": "2022-01-01", "fechaFin": null, "logoUrl": null}),
    );
    http.mock_response(
        HttpMethod::Get,
        &url("/experience"),
        200,
        json!([
            {"id": 1, "empresa": "Old", "puesto": "Dev", "descripcion": "", "fechaInicio": "2018-01-01", "fechaFin": "2021-12-31", "logoUrl": null},
            {"id": 2, "empresa": "Acme", "puesto": "Lead", "descripcion": "", "fechaInicio": "2022-01-01", "fechaFin": null, "logoUrl": null}
        ]),
    );

    let manager: TimelineManager<Experience> = TimelineManager::new(portfolio, admin);
    let form = TimelineForm {
        organization: "Acme".into(),
        role: "Lead".into(),
        start_date: "2022-01-01".into(),
        end_date: String::new(),
        ..TimelineForm::new()
    };
    manager.save(&form, Some(2)).await.unwrap();

    let sent = http.requests_to(HttpMethod::Put, &url("/experience/2"))[0].json_body();
    assert_eq!(sent["fechaFin"], Value::Null);

    let entries = manager.entries().data().unwrap();
    assert_eq!(entries[0].id, 2);
    assert!(entries[0].is_current());
    assert_eq!(entries[1].period_label(), "Jan 2018 - Dec 2021");
}

#[tokio::test]
async fn education_delete_then_reload() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Delete, &url("/education/7"), 204, Value::Null);
    http.mock_response(HttpMethod::Get, &url("/education"), 200, json!([]));

    let manager: TimelineManager<Education> = TimelineManager::new(portfolio, admin);
    manager.delete(7).await.unwrap();

    assert_eq!(
        call_log(&http),
        vec![
            (HttpMethod::Delete, "/education/7".to_string()),
            (HttpMethod::Get, "/education".to_string()),
        ]
    );
    assert_eq!(manager.entries().data(), Some(vec![]));
}

#[tokio::test]
async fn education_form_round_trips_kind() {
    let edu = Education {
        id: 3,
        institution: "UNED".into(),
        degree: "MSc".into(),
        description: String::new(),
        start_date: chrono::NaiveDate::from_ymd_opt(2019, 9, 1).unwrap(),
        end_date: None,
        logo_url: None,
        kind: EducationKind::Postgraduate,
    };
    let payload = Education::payload_from(&edu.to_form()).unwrap();
    assert_eq!(payload.kind, EducationKind::Postgraduate);
    assert_eq!(payload.end_date, None);
}

#[tokio::test]
async fn profile_save_requires_loaded_profile() {
    let (http, portfolio, admin) = services();
    let manager = ProfileManager::new(portfolio, admin);

    let err = manager.save(&ProfileForm::default()).await.unwrap_err();
    assert_eq!(err.kind, FolioErrorKind::InvalidInput);
    assert!(http.requests.borrow().is_empty());
}

#[tokio::test]
async fn profile_save_keeps_id_and_updates_local_copy() {
    let (http, portfolio, admin) = services();
    let profile = json!({
        "id": 1, "nombre": "Ana", "apellido": "García", "titulo": "Engineer",
        "emailContacto": "ana@example.com", "sobreMi": "", "fotoUrl": null,
        "ubicacion": null, "githubUrl": null, "linkedinUrl": null, "curriculumPdfUrl": null
    });
    http.mock_response(HttpMethod::Get, &url("/user"), 200, profile.clone());
    let mut updated = profile.clone();
    updated["titulo"] = json!("Staff Engineer");
    http.mock_response(HttpMethod::Put, &url("/user"), 200, updated);

    let manager = ProfileManager::new(portfolio, admin);
    let loaded = manager.load().await.unwrap();
    let mut form = ProfileForm::from_profile(&loaded);
    form.title = "Staff Engineer".into();

    manager.save(&form).await.unwrap();

    let sent = http.requests_to(HttpMethod::Put, &url("/user"))[0].json_body();
    assert_eq!(sent["id"], json!(1));
    assert_eq!(sent["fotoUrl"], Value::Null);
    assert_eq!(manager.profile().data().unwrap().title, "Staff Engineer");
}

#[tokio::test]
async fn opening_a_tab_loads_its_section() {
    let (http, portfolio, admin) = services();
    http.mock_response(HttpMethod::Get, &url("/skills"), 200, json!([skill_json(1, "Rust")]));

    let dashboard = Dashboard::new(portfolio, admin);
    dashboard.open(DashboardTab::Skills).await.unwrap();

    assert_eq!(dashboard.skills.skills().data().unwrap()[0].name, "Rust");
    assert_eq!(DashboardTab::default(), DashboardTab::Projects);
}
