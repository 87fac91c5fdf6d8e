use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use sheets_integration::{append_submission, MissingConfig, SheetStore};
use shared::{
    domain::header,
    error::{ApiError, ErrorCode},
    form::{FieldValue, FormState},
    record::SubmissionRecord,
};
use tracing::{error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Enviado! Sua resposta foi salva na planilha.";
pub const FAILURE_MESSAGE: &str = "Falha ao enviar para a planilha.";
pub const NOT_CONFIGURED_MESSAGE: &str = "A planilha de destino não está configurada.";

/// Where submissions are written, or why they cannot be.
#[derive(Clone)]
pub enum SheetsBackend {
    Ready(Arc<dyn SheetStore>),
    Missing(MissingConfig),
}

#[derive(Clone)]
pub struct ApiContext {
    pub sheets: SheetsBackend,
}

/// One-shot message shown above the form on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Success { message: String },
    Failure { message: String, detail: String },
}

/// Per-visitor state: the questionnaire answers plus bookkeeping that is not
/// part of the form and survives a reset.
#[derive(Debug, Default)]
pub struct FormSession {
    pub form: FormState,
    pub notice: Option<Notice>,
    pub submissions: u32,
}

impl FormSession {
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

/// Persists the session's answers.
///
/// On success the form is cleared and a success notice is queued. On failure
/// the answers stay in place for a manual retry and the error detail is queued.
pub async fn submit(
    ctx: &ApiContext,
    session: &mut FormSession,
    submitted_at: NaiveDateTime,
) -> Result<SubmissionRecord, ApiError> {
    let record = SubmissionRecord::from_form(&session.form, submitted_at);
    match persist(ctx, &record).await {
        Ok(()) => {
            session.submissions += 1;
            session.notice = Some(Notice::Success {
                message: SUCCESS_MESSAGE.to_string(),
            });
            reset(session);
            Ok(record)
        }
        Err(err) => {
            let message = match err.code {
                ErrorCode::NotConfigured => NOT_CONFIGURED_MESSAGE,
                _ => FAILURE_MESSAGE,
            };
            session.notice = Some(Notice::Failure {
                message: message.to_string(),
                detail: err.message.clone(),
            });
            Err(err)
        }
    }
}

/// Clears only the questionnaire fields of the session.
pub fn reset(session: &mut FormSession) {
    session.form.reset();
}

/// Persists a submission given as column/value pairs, without a session.
pub async fn submit_columns<I>(
    ctx: &ApiContext,
    columns: I,
    submitted_at: NaiveDateTime,
) -> Result<SubmissionRecord, ApiError>
where
    I: IntoIterator<Item = (String, FieldValue)>,
{
    let form = FormState::from_columns(columns).map_err(ApiError::from)?;
    let record = SubmissionRecord::from_form(&form, submitted_at);
    persist(ctx, &record).await?;
    Ok(record)
}

pub async fn persist(ctx: &ApiContext, record: &SubmissionRecord) -> Result<(), ApiError> {
    let store = match &ctx.sheets {
        SheetsBackend::Ready(store) => store,
        SheetsBackend::Missing(gap) => {
            warn!(%gap, "submission refused, sheet is not configured");
            return Err(ApiError::new(ErrorCode::NotConfigured, gap.to_string()));
        }
    };

    append_submission(store.as_ref(), record)
        .await
        .map_err(|err| {
            error!(error = %err, timestamp = record.timestamp(), "failed to append submission");
            ApiError::new(ErrorCode::Upstream, err.to_string())
        })?;
    info!(
        timestamp = record.timestamp(),
        columns = header().len(),
        "submission appended"
    );
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
