use crate::api::models::{
    CreateStudentRequest, DepartmentStudentsResponse, MessageResponse, StudentActionResponse,
    StudentListResponse, UpdateStudentRequest,
};
use crate::auth::handlers::{json_body, required};
use crate::auth::middleware::AuthUser;
use crate::core::error::{AppError, Result};
use crate::db::models::{NewStudent, StudentChanges};
use crate::db::repository::Repository;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use super::AppState;

fn parse_student_id(id: &str) -> Result<i64> {
    id.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::ValidationError("Invalid student ID".to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Handler for GET /api/students - List all students
pub async fn list_students(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<StudentListResponse>> {
    tracing::debug!(user_id = user.id, "Listing students");

    let data = state.student_repo.find_all().await?;
    Ok(Json(StudentListResponse { data }))
}

/// Handler for GET /api/students/department/:department - Students in a department
pub async fn list_students_by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Result<Json<DepartmentStudentsResponse>> {
    let data = state.student_repo.find_by_department(&department).await?;
    Ok(Json(DepartmentStudentsResponse { data, department }))
}

/// Handler for POST /api/students - Create a student
pub async fn create_student(
    State(state): State<AppState>,
    user: AuthUser,
    body: std::result::Result<Json<CreateStudentRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = json_body(body)?;

    let missing = || AppError::ValidationError("Name, email, and department are required".to_string());
    let student = NewStudent {
        name: required(req.name, "name").map_err(|_| missing())?,
        email: required(req.email, "email").map_err(|_| missing())?.to_lowercase(),
        department: required(req.department, "department").map_err(|_| missing())?,
    };

    let created = state.student_repo.create(student).await?;

    tracing::info!(user_id = user.id, student_id = created.id, "Student created");

    Ok((
        StatusCode::CREATED,
        Json(StudentActionResponse {
            data: created,
            message: "Student created successfully".to_string(),
        }),
    ))
}

/// Handler for PUT /api/students/:id - Update a student
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    body: std::result::Result<Json<UpdateStudentRequest>, JsonRejection>,
) -> Result<Json<StudentActionResponse>> {
    let id = parse_student_id(&id)?;
    let req = json_body(body)?;

    let changes = StudentChanges {
        name: non_empty(req.name),
        email: non_empty(req.email).map(|e| e.to_lowercase()),
        department: non_empty(req.department),
    };

    let updated = state
        .student_repo
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    tracing::info!(user_id = user.id, student_id = id, "Student updated");

    Ok(Json(StudentActionResponse {
        data: updated,
        message: "Student updated successfully".to_string(),
    }))
}

/// Handler for DELETE /api/students/:id - Delete a student
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<MessageResponse>> {
    let id = parse_student_id(&id)?;

    if !state.student_repo.delete(id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    tracing::info!(user_id = user.id, student_id = id, "Student deleted");

    Ok(Json(MessageResponse::new("Student deleted successfully")))
}
