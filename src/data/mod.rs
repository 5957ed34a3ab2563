mod dto;
mod repo;
mod repo_types;

pub use dto::{
    CreateAnnouncementInput, CreateCourseInput, CreateMaterialInput, UpdateAnnouncementInput,
    UpdateCourseInput, UpdateMaterialInput,
};
pub use repo_types::{
    Announcement, AnnouncementAuthor, Course, CourseInstructor, EnrolledStudent, Enrollment,
    Material, MaterialType,
};
