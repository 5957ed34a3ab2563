use serde::Serialize;
use uuid::Uuid;

use super::repo_types::MaterialType;

#[derive(Debug, Clone, Serialize)]
pub struct CreateCourseInput {
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCourseInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMaterialInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaterialType,
    pub file_path: String,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateMaterialInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MaterialType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAnnouncementInput {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,
    pub is_global: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateAnnouncementInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_global: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_inputs_omit_untouched_fields() {
        assert_eq!(serde_json::to_string(&UpdateCourseInput::default()).unwrap(), "{}");
        let patch = UpdateCourseInput {
            title: Some("Circuits II".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"title":"Circuits II"}"#);
    }

    #[test]
    fn material_inputs_use_the_wire_column_name_for_kind() {
        let input = CreateMaterialInput {
            title: "Week 1 notes".into(),
            description: None,
            kind: MaterialType::Pdf,
            file_path: "materials/week-1.pdf".into(),
            file_size: Some(52_428),
        };
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains(r#""type":"pdf""#));
    }
}
