//! Typed backend operations. Errors are passed through with an op span and
//! never interpreted here.

use crate::client::ApiClient;
use crate::error::FolioResult;
use folio_shared::protocol::*;
use folio_shared::{
    Education, EducationPayload, EntityId, Experience, ExperiencePayload, LoginCredentials,
    LoginResponse, Project, ProjectPayload, ProjectSkillRequest, Skill, SkillPayload, UserProfile,
};

// =========================================================
// Auth
// =========================================================

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// POST /auth/login
    pub async fn login(&self, credentials: &LoginCredentials) -> FolioResult<LoginResponse> {
        self.client
            .call(&Login(credentials.clone()))
            .await
            .map_err(|e| e.in_op("auth.login"))
    }
}

// =========================================================
// Public reads
// =========================================================

/// Reads available to any visitor.
#[derive(Clone)]
pub struct PortfolioService {
    client: ApiClient,
}

impl PortfolioService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /user
    pub async fn get_profile(&self) -> FolioResult<UserProfile> {
        self.client
            .call(&GetProfile)
            .await
            .map_err(|e| e.in_op("portfolio.get_profile"))
    }

    /// GET /projects
    pub async fn get_projects(&self) -> FolioResult<Vec<Project>> {
        self.client
            .call(&ListProjects)
            .await
            .map_err(|e| e.in_op("portfolio.get_projects"))
    }

    /// GET /skills
    pub async fn get_skills(&self) -> FolioResult<Vec<Skill>> {
        self.client
            .call(&ListSkills)
            .await
            .map_err(|e| e.in_op("portfolio.get_skills"))
    }

    /// GET /experience
    pub async fn get_experiences(&self) -> FolioResult<Vec<Experience>> {
        self.client
            .call(&ListExperience)
            .await
            .map_err(|e| e.in_op("portfolio.get_experiences"))
    }

    /// GET /education
    pub async fn get_education(&self) -> FolioResult<Vec<Education>> {
        self.client
            .call(&ListEducation)
            .await
            .map_err(|e| e.in_op("portfolio.get_education"))
    }
}

// =========================================================
// Admin writes
// =========================================================

/// Writes. The bearer token is attached by the client; authorization is
/// enforced by the backend.
#[derive(Clone)]
pub struct AdminService {
    client: ApiClient,
}

impl AdminService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // --- Profile ---

    pub async fn update_profile(&self, profile: UserProfile) -> FolioResult<UserProfile> {
        self.client
            .call(&UpdateProfile(profile))
            .await
            .map_err(|e| e.in_op("admin.update_profile"))
    }

    // --- Projects ---

    pub async fn create_project(&self, project: ProjectPayload) -> FolioResult<Project> {
        self.client
            .call(&CreateProject(project))
            .await
            .map_err(|e| e.in_op("admin.create_project"))
    }

    pub async fn update_project(&self, id: EntityId, project: ProjectPayload) -> FolioResult<Project> {
        self.client
            .call(&UpdateProject(id, project))
            .await
            .map_err(|e| e.in_op_with("admin.update_project", format!("id={}", id)))
    }

    pub async fn delete_project(&self, id: EntityId) -> FolioResult<()> {
        self.client
            .call(&DeleteProject(id))
            .await
            .map_err(|e| e.in_op_with("admin.delete_project", format!("id={}", id)))
    }

    /// Links existing skills to an existing project (POST /projects/add-skills).
    pub async fn add_skills_to_project(&self, request: ProjectSkillRequest) -> FolioResult<()> {
        let project_id = request.project_id;
        self.client
            .call(&AddProjectSkills(request))
            .await
            .map_err(|e| e.in_op_with("admin.add_skills_to_project", format!("project={}", project_id)))
    }

    // --- Skills ---

    pub async fn create_skill(&self, skill: SkillPayload) -> FolioResult<Skill> {
        self.client
            .call(&CreateSkill(skill))
            .await
            .map_err(|e| e.in_op("admin.create_skill"))
    }

    /// Fails on the backend while a project still references the skill.
    pub async fn delete_skill(&self, id: EntityId) -> FolioResult<()> {
        self.client
            .call(&DeleteSkill(id))
            .await
            .map_err(|e| e.in_op_with("admin.delete_skill", format!("id={}", id)))
    }

    // --- Experience ---

    pub async fn create_experience(&self, exp: ExperiencePayload) -> FolioResult<Experience> {
        self.client
            .call(&CreateExperience(exp))
            .await
            .map_err(|e| e.in_op("admin.create_experience"))
    }

    pub async fn update_experience(&self, id: EntityId, exp: ExperiencePayload) -> FolioResult<Experience> {
        self.client
            .call(&UpdateExperience(id, exp))
            .await
            .map_err(|e| e.in_op_with("admin.update_experience", format!("id={}", id)))
    }

    pub async fn delete_experience(&self, id: EntityId) -> FolioResult<()> {
        self.client
            .call(&DeleteExperience(id))
            .await
            .map_err(|e| e.in_op_with("admin.delete_experience", format!("id={}", id)))
    }

    // --- Education ---

    pub async fn create_education(&self, edu: EducationPayload) -> FolioResult<Education> {
        self.client
            .call(&CreateEducation(edu))
            .await
            .map_err(|e| e.in_op("admin.create_education"))
    }

    pub async fn update_education(&self, id: EntityId, edu: EducationPayload) -> FolioResult<Education> {
        self.client
            .call(&UpdateEducation(id, edu))
            .await
            .map_err(|e| e.in_op_with("admin.update_education", format!("id={}", id)))
    }

    pub async fn delete_education(&self, id: EntityId) -> FolioResult<()> {
        self.client
            .call(&DeleteEducation(id))
            .await
            .map_err(|e| e.in_op_with("admin.delete_education", format!("id={}", id)))
    }
}
