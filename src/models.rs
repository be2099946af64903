use serde::Serialize;

use crate::layout::CourseField;

pub const UNKNOWN_STUDENT: &str = "Unknown Student";
// The portal page carries neither; the consumer fills them in from the courses.
pub const PROGRAM_PLACEHOLDER: &str = "Inferred Degree";
pub const DEPARTMENT_PLACEHOLDER: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentInfo {
    pub registration_number: String,
    pub full_name: String,
    pub program: String,
    pub department: String,
}

impl StudentInfo {
    pub fn new(registration_number: impl Into<String>, full_name: Option<String>) -> Self {
        Self {
            registration_number: registration_number.into(),
            full_name: full_name.unwrap_or_else(|| UNKNOWN_STUDENT.to_string()),
            program: PROGRAM_PLACEHOLDER.to_string(),
            department: DEPARTMENT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseRecord {
    #[serde(rename = "Semester")]
    pub semester: String,
    #[serde(rename = "Course Code")]
    pub course_code: String,
    #[serde(rename = "Course Title")]
    pub course_title: String,
    #[serde(rename = "Credit Hours")]
    pub credit_hours: String,
    #[serde(rename = "Total")]
    pub total: String,
    #[serde(rename = "Grade")]
    pub grade: String,
}

impl CourseRecord {
    pub fn set(&mut self, field: CourseField, value: String) {
        let slot = match field {
            CourseField::Semester => &mut self.semester,
            CourseField::CourseCode => &mut self.course_code,
            CourseField::CourseTitle => &mut self.course_title,
            CourseField::CreditHours => &mut self.credit_hours,
            CourseField::Total => &mut self.total,
            CourseField::Grade => &mut self.grade,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub success: bool,
    pub student_info: StudentInfo,
    pub courses: Vec<CourseRecord>,
}
