use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::dto::{
    CreateAnnouncementInput, CreateCourseInput, CreateMaterialInput, UpdateAnnouncementInput,
    UpdateCourseInput, UpdateMaterialInput,
};
use super::repo_types::{Announcement, Course, Enrollment, Material};
use crate::client::{eq, or_filter, order, select, HostedClient};
use crate::error::StoreError;
use crate::profiles::Profile;

const COURSE_WITH_INSTRUCTOR: &str = "*, profiles:instructor_id(full_name)";

impl Course {
    /// Every course, newest first, with the instructor's display name.
    pub async fn list_all(client: &HostedClient) -> Result<Vec<Course>, StoreError> {
        client
            .rest_select(
                "courses",
                &[select(COURSE_WITH_INSTRUCTOR), order("created_at.desc")],
            )
            .await
    }

    pub async fn find_by_slug(client: &HostedClient, slug: &str) -> Result<Course, StoreError> {
        client
            .rest_select_one(
                "courses",
                &[select(COURSE_WITH_INSTRUCTOR), eq("slug", slug)],
            )
            .await
    }

    /// Admin: create a course taught by `instructor_id`.
    pub async fn create(
        client: &HostedClient,
        instructor_id: Uuid,
        input: &CreateCourseInput,
    ) -> Result<Course, StoreError> {
        let body = json!({
            "title": input.title,
            "description": input.description,
            "slug": input.slug,
            "instructor_id": instructor_id,
        });
        client.rest_insert("courses", &body).await
    }

    pub async fn update(
        client: &HostedClient,
        course_id: Uuid,
        input: &UpdateCourseInput,
    ) -> Result<Course, StoreError> {
        client
            .rest_update("courses", &[eq("id", course_id)], input)
            .await
    }

    pub async fn delete(client: &HostedClient, course_id: Uuid) -> Result<(), StoreError> {
        client.rest_delete("courses", &[eq("id", course_id)]).await
    }
}

impl Enrollment {
    /// Courses the student is enrolled in, most recent enrollment first.
    pub async fn list_for_student(
        client: &HostedClient,
        student_id: Uuid,
    ) -> Result<Vec<Course>, StoreError> {
        #[derive(Deserialize)]
        struct Row {
            courses: Option<Course>,
        }
        let rows: Vec<Row> = client
            .rest_select(
                "enrollments",
                &[
                    select("courses(*, profiles:instructor_id(full_name))"),
                    eq("student_id", student_id),
                    order("enrolled_at.desc"),
                ],
            )
            .await?;
        Ok(rows.into_iter().filter_map(|row| row.courses).collect())
    }

    pub async fn is_enrolled(
        client: &HostedClient,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, StoreError> {
        #[derive(Deserialize)]
        struct Row {
            #[allow(dead_code)]
            id: Uuid,
        }
        let rows: Vec<Row> = client
            .rest_select(
                "enrollments",
                &[
                    select("id"),
                    eq("student_id", student_id),
                    eq("course_id", course_id),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Admin: enroll one student.
    pub async fn enroll(
        client: &HostedClient,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Enrollment, StoreError> {
        let body = json!({"student_id": student_id, "course_id": course_id});
        client.rest_insert("enrollments", &body).await
    }

    /// Admin: remove one student from a course.
    pub async fn unenroll(
        client: &HostedClient,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<(), StoreError> {
        client
            .rest_delete(
                "enrollments",
                &[eq("student_id", student_id), eq("course_id", course_id)],
            )
            .await
    }

    /// Admin: enroll a batch of students in one request.
    pub async fn bulk_enroll(
        client: &HostedClient,
        course_id: Uuid,
        student_ids: &[Uuid],
    ) -> Result<Vec<Enrollment>, StoreError> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }
        let body: Vec<_> = student_ids
            .iter()
            .map(|student_id| json!({"student_id": student_id, "course_id": course_id}))
            .collect();
        client.rest_insert_many("enrollments", &body).await
    }

    /// Admin: roster for one course, with student names and matric
    /// numbers embedded.
    pub async fn list_for_course(
        client: &HostedClient,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError> {
        client
            .rest_select(
                "enrollments",
                &[
                    select("*, profiles:student_id(full_name, matric_number)"),
                    eq("course_id", course_id),
                    order("enrolled_at.desc"),
                ],
            )
            .await
    }
}

impl Material {
    pub async fn list_for_course(
        client: &HostedClient,
        course_id: Uuid,
    ) -> Result<Vec<Material>, StoreError> {
        client
            .rest_select(
                "materials",
                &[select("*"), eq("course_id", course_id), order("created_at.desc")],
            )
            .await
    }

    /// Admin: record material metadata. The file itself is uploaded
    /// through the collaborator's storage, not through this crate.
    pub async fn create(
        client: &HostedClient,
        course_id: Uuid,
        input: &CreateMaterialInput,
    ) -> Result<Material, StoreError> {
        let body = json!({
            "course_id": course_id,
            "title": input.title,
            "description": input.description,
            "type": input.kind,
            "file_path": input.file_path,
            "file_size": input.file_size,
        });
        client.rest_insert("materials", &body).await
    }

    pub async fn update(
        client: &HostedClient,
        material_id: Uuid,
        input: &UpdateMaterialInput,
    ) -> Result<Material, StoreError> {
        client
            .rest_update("materials", &[eq("id", material_id)], input)
            .await
    }

    pub async fn delete(client: &HostedClient, material_id: Uuid) -> Result<(), StoreError> {
        client
            .rest_delete("materials", &[eq("id", material_id)])
            .await
    }
}

impl Announcement {
    /// Global announcements, newest first.
    pub async fn list_global(client: &HostedClient) -> Result<Vec<Announcement>, StoreError> {
        client
            .rest_select(
                "announcements",
                &[
                    select("*, profiles:created_by(full_name)"),
                    eq("is_global", true),
                    order("created_at.desc"),
                ],
            )
            .await
    }

    /// Announcements visible on a course page: the course's own plus the
    /// global ones.
    pub async fn list_for_course(
        client: &HostedClient,
        course_id: Uuid,
    ) -> Result<Vec<Announcement>, StoreError> {
        client
            .rest_select(
                "announcements",
                &[
                    select("*, profiles:created_by(full_name)"),
                    or_filter(&format!("course_id.eq.{course_id},is_global.eq.true")),
                    order("created_at.desc"),
                ],
            )
            .await
    }

    /// Admin: publish an announcement.
    pub async fn create(
        client: &HostedClient,
        created_by: Uuid,
        input: &CreateAnnouncementInput,
    ) -> Result<Announcement, StoreError> {
        let body = json!({
            "created_by": created_by,
            "title": input.title,
            "content": input.content,
            "course_id": input.course_id,
            "is_global": input.is_global,
        });
        client.rest_insert("announcements", &body).await
    }

    pub async fn update(
        client: &HostedClient,
        announcement_id: Uuid,
        input: &UpdateAnnouncementInput,
    ) -> Result<Announcement, StoreError> {
        client
            .rest_update("announcements", &[eq("id", announcement_id)], input)
            .await
    }

    pub async fn delete(client: &HostedClient, announcement_id: Uuid) -> Result<(), StoreError> {
        client
            .rest_delete("announcements", &[eq("id", announcement_id)])
            .await
    }
}

impl Profile {
    /// Admin: every student profile, ordered by display name.
    pub async fn list_students(client: &HostedClient) -> Result<Vec<Profile>, StoreError> {
        client
            .rest_select(
                "profiles",
                &[select("*"), eq("role", "student"), order("full_name.asc")],
            )
            .await
    }
}
