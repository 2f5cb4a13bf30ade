//! Repository pattern implementation for data access layer
//!
//! This module provides the Repository pattern for abstracting database operations.

use crate::core::error::{AppError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{NewStudent, NewUser, Student, StudentChanges, User};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

/// Generic repository trait for read and delete operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Find all entities
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Delete an entity by its ID, returning whether it existed
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Persistence of user identities as seen by the authentication layer
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user whose username or email matches `identifier`
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    /// Find a user by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Insert a new user; fails with `DuplicateIdentity` when the username or email is taken
    async fn insert(&self, user: NewUser) -> Result<User>;
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
}

const USER_COLUMNS: &str = "id, username, name, email, password_hash, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let identifier = identifier.to_string();
        self.db
            .execute(move |conn| {
                // An exact username match wins over an email match
                conn.query_row(
                    &format!(
                        "SELECT {} FROM users WHERE username = ?1 OR email = lower(?1) \
                         ORDER BY (username = ?1) DESC LIMIT 1",
                        USER_COLUMNS
                    ),
                    [&identifier],
                    user_from_row,
                )
                .optional()
                .map_err(AppError::DatabaseError)
            })
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                    [id],
                    user_from_row,
                )
                .optional()
                .map_err(AppError::DatabaseError)
            })
            .await
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        self.db
            .execute(move |conn| {
                let created_at = chrono::Utc::now().to_rfc3339();
                let inserted = conn.execute(
                    "INSERT INTO users (username, name, email, password_hash, created_at) \
                     VALUES (?, ?, ?, ?, ?)",
                    params![&user.username, &user.name, &user.email, &user.password_hash, &created_at],
                );

                match inserted {
                    Ok(_) => Ok(User {
                        id: conn.last_insert_rowid(),
                        username: user.username,
                        name: user.name,
                        email: user.email,
                        password_hash: user.password_hash,
                        created_at,
                    }),
                    Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateIdentity(
                        "Username or email already registered".to_string(),
                    )),
                    Err(e) => Err(AppError::DatabaseError(e)),
                }
            })
            .await
    }
}

const STUDENT_COLUMNS: &str = "id, name, email, department, created_at, updated_at";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        department: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn find_student(conn: &rusqlite::Connection, id: i64) -> Result<Option<Student>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM students WHERE id = ? AND deleted_at IS NULL",
            STUDENT_COLUMNS
        ),
        [id],
        student_from_row,
    )
    .optional()
    .map_err(AppError::DatabaseError)
}

fn email_taken() -> AppError {
    AppError::Conflict("A student with this email already exists".to_string())
}

/// Repository for Student entities
///
/// Deletes are soft: rows keep their data with `deleted_at` set and are
/// hidden from every query.
pub struct StudentRepository {
    db: Arc<DatabaseManager>,
}

impl StudentRepository {
    /// Create a new StudentRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find students belonging to a department
    pub async fn find_by_department(&self, department: &str) -> Result<Vec<Student>> {
        let department = department.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM students WHERE department = ? AND deleted_at IS NULL ORDER BY id",
                    STUDENT_COLUMNS
                ))?;

                let students = stmt
                    .query_map([&department], student_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(students)
            })
            .await
    }

    /// Insert a new student
    pub async fn create(&self, student: NewStudent) -> Result<Student> {
        self.db
            .execute(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let inserted = conn.execute(
                    "INSERT INTO students (name, email, department, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?)",
                    params![&student.name, &student.email, &student.department, &now, &now],
                );

                match inserted {
                    Ok(_) => Ok(Student {
                        id: conn.last_insert_rowid(),
                        name: student.name,
                        email: student.email,
                        department: student.department,
                        created_at: now.clone(),
                        updated_at: now,
                    }),
                    Err(e) if is_unique_violation(&e) => Err(email_taken()),
                    Err(e) => Err(AppError::DatabaseError(e)),
                }
            })
            .await
    }

    /// Apply a partial update, returning the updated student or `None` if it does not exist
    pub async fn update(&self, id: i64, changes: StudentChanges) -> Result<Option<Student>> {
        self.db
            .execute(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = conn.execute(
                    "UPDATE students SET \
                        name = COALESCE(?1, name), \
                        email = COALESCE(?2, email), \
                        department = COALESCE(?3, department), \
                        updated_at = ?4 \
                     WHERE id = ?5 AND deleted_at IS NULL",
                    params![&changes.name, &changes.email, &changes.department, &now, id],
                );

                match updated {
                    Ok(0) => Ok(None),
                    Ok(_) => find_student(conn, id),
                    Err(e) if is_unique_violation(&e) => Err(email_taken()),
                    Err(e) => Err(AppError::DatabaseError(e)),
                }
            })
            .await
    }
}

#[async_trait]
impl Repository<Student> for StudentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.db.execute(move |conn| find_student(conn, id)).await
    }

    async fn find_all(&self) -> Result<Vec<Student>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM students WHERE deleted_at IS NULL ORDER BY id",
                    STUDENT_COLUMNS
                ))?;

                let students = stmt
                    .query_map([], student_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(students)
            })
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "UPDATE students SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                    params![chrono::Utc::now().to_rfc3339(), id],
                )?;
                Ok(deleted > 0)
            })
            .await
    }
}
