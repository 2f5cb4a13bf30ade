use crate::db::models::Student;
use serde::{Deserialize, Serialize};

/// Request body for creating a student
#[derive(Debug, Default, Deserialize)]
pub struct CreateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

/// Request body for updating a student; empty or missing fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

/// Response for student listings
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
}

/// Response for students filtered by department
#[derive(Debug, Serialize, Deserialize)]
pub struct DepartmentStudentsResponse {
    pub data: Vec<Student>,
    pub department: String,
}

/// Response for create/update operations
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentActionResponse {
    pub data: Student,
    pub message: String,
}
