//! Notes endpoint used by the demo server.

use axum::{extract::Request, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::postgres::PgTransaction;
use uuid::Uuid;

use super::{transactional::TxResult, tx::Tx};
use crate::{
    error::{new_error, read_json, HttpError, DEFAULT_MAX_JSON_BODY_BYTES},
    types::DateTime,
};

pub const NOTES_PUBLISHER: &str = "notes";
const MAX_NOTE_LENGTH: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct CreateNotePayload {
    pub body: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime,
}

/// Trims the note body and checks it is neither empty nor too long.
fn validate_body(body: &str) -> Result<&str, HttpError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(new_error()
            .status(StatusCode::BAD_REQUEST)
            .message("Note body must not be empty")
            .tag("NOTE_EMPTY"));
    }
    if body.len() > MAX_NOTE_LENGTH {
        return Err(new_error()
            .status(StatusCode::BAD_REQUEST)
            .message(format!("Note body exceeds {MAX_NOTE_LENGTH} bytes"))
            .tag("NOTE_TOO_LONG")
            .custom_field("max_length", MAX_NOTE_LENGTH));
    }
    Ok(body)
}

pub fn create_note<'a>(req: Request, tx: &'a mut Tx<PgTransaction<'static>>) -> TxResult<'a, Note> {
    Box::pin(async move {
        let payload: CreateNotePayload = read_json(req, DEFAULT_MAX_JSON_BODY_BYTES).await?;
        let body = validate_body(&payload.body)?;

        let note = sqlx::query_as::<_, Note>(
            "INSERT INTO notes (id, body, created_at) VALUES ($1, $2, $3) \
             RETURNING id, body, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(body)
        .bind(DateTime::now())
        .fetch_one(tx.conn())
        .await?;

        tx.defer_publish(
            NOTES_PUBLISHER,
            json!({ "event": "note_created", "id": note.id, "created_at": note.created_at }),
        );
        Ok(note)
    })
}
