use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::Project;

pub fn insert_project(conn: &Connection, project: &Project) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO projects (id, name, contract_file, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            project.id.to_string(),
            project.name,
            project.contract_file,
            fmt_ts(&project.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_project(conn: &Connection, id: &Uuid) -> Result<Option<Project>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, contract_file, created_at FROM projects WHERE id = ?1")?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(ProjectRow {
            id: row.get(0)?,
            name: row.get(1)?,
            contract_file: row.get(2)?,
            created_at: row.get(3)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(project_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, contract_file, created_at FROM projects ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ProjectRow {
            id: row.get(0)?,
            name: row.get(1)?,
            contract_file: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(project_from_row(row?)?);
    }
    Ok(projects)
}

/// Delete a project. Its items go with it via the ON DELETE CASCADE
/// foreign key; cached products are shared and stay.
pub fn delete_project(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Project".into(),
            id: id.to_string(),
        });
    }
    tracing::info!(project_id = %id, "Project deleted with its items");
    Ok(())
}

struct ProjectRow {
    id: String,
    name: String,
    contract_file: Option<String>,
    created_at: String,
}

fn project_from_row(row: ProjectRow) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        contract_file: row.contract_file,
        created_at: parse_ts(&row.created_at),
    })
}
