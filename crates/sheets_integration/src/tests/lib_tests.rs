use super::*;
use chrono::NaiveDate;
use shared::form::FormState;

fn record() -> SubmissionRecord {
    let mut form = FormState::new();
    form.set_text("titulo", "Tema").expect("titulo");
    form.set_choices("foco", ["Durabilidade", "Outro"])
        .expect("foco");
    let submitted_at = NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("datetime");
    SubmissionRecord::from_form(&form, submitted_at)
}

#[tokio::test]
async fn header_is_written_only_into_an_empty_sheet() {
    let store = MemorySheetStore::new();
    assert!(ensure_header(&store, &["a", "b"]).await.expect("first"));
    assert!(!ensure_header(&store, &["a", "b"]).await.expect("second"));
    assert_eq!(store.rows(), vec![vec!["a".to_string(), "b".to_string()]]);
}

#[tokio::test]
async fn existing_first_row_is_kept_even_if_different() {
    let store = MemorySheetStore::with_rows(vec![vec!["legacy".to_string()]]);
    assert!(!ensure_header(&store, &header()).await.expect("ensure"));
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn append_submission_creates_sheet_header_and_row() {
    let store = MemorySheetStore::new();
    let record = record();

    append_submission(&store, &record).await.expect("append");

    assert!(store.worksheet_created());
    let rows = store.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], header());
    assert_eq!(rows[1], record.to_row().expect("row"));
    assert_eq!(rows[1][8], "Durabilidade, Outro");
}

#[tokio::test]
async fn rejected_append_surfaces_reason() {
    let store = MemorySheetStore::with_rows(vec![header()
        .into_iter()
        .map(str::to_string)
        .collect()]);
    store.reject_appends(Some("quota exceeded"));

    let err = append_submission(&store, &record())
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "quota exceeded");
    assert_eq!(store.rows().len(), 1);

    store.reject_appends(None);
    append_submission(&store, &record()).await.expect("append");
    assert_eq!(store.rows().len(), 2);
}

#[test]
fn connect_rejects_invalid_key() {
    let target = SheetTarget {
        spreadsheet_id: "id".into(),
        worksheet_name: "respostas".into(),
        credentials: ServiceAccountKey {
            client_email: "forms@example.iam.gserviceaccount.com".into(),
            private_key: "garbage".into(),
            private_key_id: None,
            token_uri: credentials::DEFAULT_TOKEN_URI.into(),
            project_id: None,
        },
    };
    assert!(matches!(
        connect(&target, google::DEFAULT_API_BASE),
        Err(SheetsError::InvalidKey(_))
    ));
}
