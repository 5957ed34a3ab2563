use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Course offered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub instructor_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Embedded instructor name when the query asks for it.
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub instructor: Option<CourseInstructor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseInstructor {
    pub full_name: Option<String>,
}

/// Enrollment linking a student to a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    /// Embedded course when the query asks for it.
    #[serde(default, rename = "courses", skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    /// Embedded student fields for admin rosters.
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub student: Option<EnrolledStudent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrolledStudent {
    pub full_name: Option<String>,
    pub matric_number: Option<String>,
}

/// Kind of downloadable course material. Metadata only; the file bytes
/// live in the collaborator's storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Pdf,
    Ebook,
    Document,
    Video,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaterialType,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Announcement, either global or scoped to one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub created_by: Uuid,
    pub title: String,
    pub content: String,
    pub is_global: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub author: Option<AnnouncementAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementAuthor {
    pub full_name: Option<String>,
}
