use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub mod date;
pub mod protocol;

// =========================================================
// Constants
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// The single key the client persists between runs.
pub const TOKEN_STORAGE_KEY: &str = "authToken";

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
}

// =========================================================
// Domain models
// =========================================================

pub type EntityId = i64;

/// The portfolio owner's public profile. One per deployment.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido", default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "emailContacto")]
    pub contact_email: String,
    #[serde(rename = "sobreMi", default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(rename = "fotoUrl", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "githubUrl", default)]
    pub github_url: Option<String>,
    #[serde(rename = "linkedinUrl", default)]
    pub linkedin_url: Option<String>,
    #[serde(rename = "curriculumPdfUrl", default)]
    pub resume_url: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        if self.last_name.trim().is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Unknown or missing levels read as `Intermediate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkillLevel {
    #[serde(rename = "Básico")]
    Basic,
    #[serde(rename = "Intermedio")]
    Intermediate,
    #[serde(rename = "Avanzado")]
    Advanced,
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel::Intermediate
    }
}

impl SkillLevel {
    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Basic => "Básico",
            SkillLevel::Intermediate => "Intermedio",
            SkillLevel::Advanced => "Avanzado",
        }
    }

    /// Accepts the wire label or the English name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "básico" | "basico" | "basic" => Some(SkillLevel::Basic),
            "intermedio" | "intermediate" => Some(SkillLevel::Intermediate),
            "avanzado" | "advanced" => Some(SkillLevel::Advanced),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SkillLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(SkillLevel::parse).unwrap_or_default())
    }
}

/// Skill category. The known set is open: anything else round-trips as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Tools,
    SoftSkills,
    Other(String),
}

impl Default for SkillCategory {
    fn default() -> Self {
        SkillCategory::Frontend
    }
}

impl SkillCategory {
    pub fn as_str(&self) -> &str {
        match self {
            SkillCategory::Frontend => "Frontend",
            SkillCategory::Backend => "Backend",
            SkillCategory::Tools => "Tools",
            SkillCategory::SoftSkills => "Soft Skills",
            SkillCategory::Other(s) => s,
        }
    }
}

impl From<String> for SkillCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Frontend" => SkillCategory::Frontend,
            "Backend" => SkillCategory::Backend,
            "Tools" => SkillCategory::Tools,
            "Soft Skills" => SkillCategory::SoftSkills,
            _ => SkillCategory::Other(s),
        }
    }
}

impl From<SkillCategory> for String {
    fn from(c: SkillCategory) -> Self {
        match c {
            SkillCategory::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Skill {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nivel", default)]
    pub level: SkillLevel,
    #[serde(rename = "categoria", default, deserialize_with = "null_as_default")]
    pub category: SkillCategory,
    #[serde(rename = "iconoUrl", default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Project {
    pub id: EntityId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "urlDemo", default)]
    pub demo_url: Option<String>,
    #[serde(rename = "urlRepo", default)]
    pub repo_url: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<Skill>,
}

impl Project {
    pub fn skill_ids(&self) -> Vec<EntityId> {
        self.skills.iter().map(|s| s.id).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Experience {
    pub id: EntityId,
    #[serde(rename = "empresa")]
    pub company: String,
    #[serde(rename = "puesto")]
    pub position: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    /// `None` means the position is current.
    #[serde(rename = "fechaFin", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "logoUrl", default)]
    pub logo_url: Option<String>,
}

/// Unknown or missing kinds read as `Degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EducationKind {
    #[serde(rename = "Degree / University")]
    Degree,
    #[serde(rename = "Course / Certification")]
    Course,
    #[serde(rename = "Postgraduate")]
    Postgraduate,
}

impl Default for EducationKind {
    fn default() -> Self {
        EducationKind::Degree
    }
}

impl EducationKind {
    pub fn label(&self) -> &'static str {
        match self {
            EducationKind::Degree => "Degree / University",
            EducationKind::Course => "Course / Certification",
            EducationKind::Postgraduate => "Postgraduate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "degree" | "university" | "degree / university" => Some(EducationKind::Degree),
            "course" | "certification" | "course / certification" => Some(EducationKind::Course),
            "postgraduate" => Some(EducationKind::Postgraduate),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for EducationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(EducationKind::parse).unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Education {
    pub id: EntityId,
    #[serde(rename = "institucion")]
    pub institution: String,
    #[serde(rename = "titulo")]
    pub degree: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fechaFin", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "logoUrl", default)]
    pub logo_url: Option<String>,
    #[serde(rename = "tipo", default, deserialize_with = "null_as_default")]
    pub kind: EducationKind,
}

// =========================================================
// Write payloads
// =========================================================
//
// Optional fields are always serialized, so an absent value goes out as an
// explicit `null` rather than being dropped or sent as "".

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectPayload {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "urlDemo")]
    pub demo_url: Option<String>,
    #[serde(rename = "urlRepo")]
    pub repo_url: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkillPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nivel")]
    pub level: SkillLevel,
    #[serde(rename = "categoria")]
    pub category: SkillCategory,
    #[serde(rename = "iconoUrl")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExperiencePayload {
    #[serde(rename = "empresa")]
    pub company: String,
    #[serde(rename = "puesto")]
    pub position: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fechaFin")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EducationPayload {
    #[serde(rename = "institucion")]
    pub institution: String,
    #[serde(rename = "titulo")]
    pub degree: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fechaFin")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: EducationKind,
}

/// Links existing skills to an existing project.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectSkillRequest {
    #[serde(rename = "projectId")]
    pub project_id: EntityId,
    #[serde(rename = "skillIds")]
    pub skill_ids: Vec<EntityId>,
}

/// Reads an explicit `null` (an unset column) as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Collapses blank text into `None`. The backend rejects "" for optional
/// URL and date columns.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
