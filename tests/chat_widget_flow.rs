mod common;

use axum_test::multipart::{MultipartForm, Part};
use common::{Call, RecordingBackend, open_portal, test_server, wait_until_idle};
use energywise_portal::chat::{
    Role, SEND_FAILURE_MESSAGE, UNSUPPORTED_FILE_MESSAGE, UPLOAD_FAILURE_MESSAGE, WELCOME_MESSAGE,
};

fn pdf_form(name: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec())
            .file_name(name)
            .mime_type("application/pdf"),
    )
}

#[tokio::test]
async fn test_first_open_shows_welcome_once() {
    let (server, widgets) = test_server(RecordingBackend::new());
    let id = open_portal(&server).await;

    let opened = server.post(&format!("/widgets/chat/{id}/toggle")).await;
    opened.assert_status_ok();
    assert!(opened.text().contains("chatbot-window open"));

    // Close and reopen: no second welcome.
    server.post(&format!("/widgets/chat/{id}/toggle")).await;
    server.post(&format!("/widgets/chat/{id}/toggle")).await;

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert!(widget.is_open());
    assert_eq!(widget.messages().len(), 1);
    assert_eq!(widget.messages()[0].text, WELCOME_MESSAGE);
}

#[tokio::test]
async fn test_send_then_reply() {
    let backend = RecordingBackend::new();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;
    server.post(&format!("/widgets/chat/{id}/toggle")).await;

    server
        .post(&format!("/widgets/chat/{id}/messages"))
        .form(&[("message", "  ciao  ")])
        .await
        .assert_status_ok();
    wait_until_idle(&widgets, &id).await;

    let list = server.get(&format!("/widgets/chat/{id}/messages")).await.text();
    assert!(list.contains("Salve!"));
    assert!(!list.contains("typing-indicator"));

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    let roles: Vec<Role> = widget.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Bot, Role::User, Role::Bot]);
    assert_eq!(widget.messages()[1].text, "ciao");

    assert_eq!(backend.calls().len(), 1);
    let Call::Message(turn) = &backend.calls()[0] else {
        panic!("expected a message call");
    };
    assert_eq!(turn.message, "ciao");
    assert_eq!(turn.session_id, id);
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let backend = RecordingBackend::new();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    server
        .post(&format!("/widgets/chat/{id}/messages"))
        .form(&[("message", "   ")])
        .await
        .assert_status_ok();

    assert!(backend.calls().is_empty());
    assert!(widgets.get(&id).unwrap().lock().await.messages().is_empty());
}

#[tokio::test]
async fn test_send_while_busy_is_dropped() {
    let backend = RecordingBackend::held();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    let first = server
        .post(&format!("/widgets/chat/{id}/messages"))
        .form(&[("message", "prima")])
        .await
        .text();
    assert!(first.contains("typing-indicator"));
    assert!(first.contains("chatbot-poll"));

    server
        .post(&format!("/widgets/chat/{id}/messages"))
        .form(&[("message", "seconda")])
        .await
        .assert_status_ok();

    {
        let handle = widgets.get(&id).unwrap();
        let widget = handle.lock().await;
        assert!(widget.is_processing());
        assert_eq!(widget.messages().iter().filter(|m| m.role == Role::User).count(), 1);
    }

    backend.release();
    wait_until_idle(&widgets, &id).await;
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_backend_failure_shows_apology() {
    let (server, widgets) = test_server(RecordingBackend::failing());
    let id = open_portal(&server).await;

    server
        .post(&format!("/widgets/chat/{id}/messages"))
        .form(&[("message", "ciao")])
        .await;
    wait_until_idle(&widgets, &id).await;

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert_eq!(widget.messages().last().unwrap().text, SEND_FAILURE_MESSAGE);
    assert!(!widget.is_processing());
}

#[tokio::test]
async fn test_upload_announces_file_and_clears_preview() {
    let backend = RecordingBackend::held();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    let pending = server
        .post(&format!("/widgets/chat/{id}/upload"))
        .multipart(pdf_form("marzo.pdf"))
        .await
        .text();
    assert!(pending.contains("Ho caricato la mia bolletta: marzo.pdf"));
    assert!(pending.contains("upload-filename"));

    backend.release();
    wait_until_idle(&widgets, &id).await;

    let settled = server.get(&format!("/widgets/chat/{id}/messages")).await.text();
    assert!(settled.contains("Ho ricevuto <strong>marzo.pdf</strong>"));
    assert!(!settled.contains("upload-filename"));

    assert_eq!(
        backend.calls(),
        vec![Call::Upload {
            session_id: id.clone(),
            file_name: "marzo.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_unsupported_upload_makes_no_request() {
    let backend = RecordingBackend::new();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"a,b".to_vec())
            .file_name("letture.csv")
            .mime_type("text/csv"),
    );
    let list = server
        .post(&format!("/widgets/chat/{id}/upload"))
        .multipart(form)
        .await
        .text();

    assert!(list.contains("puoi caricare solo file PDF o immagini"));
    assert!(backend.calls().is_empty());

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert_eq!(widget.messages().len(), 1);
    assert_eq!(widget.messages()[0].text, UNSUPPORTED_FILE_MESSAGE);
    assert!(widget.staged().is_none());
}

#[tokio::test]
async fn test_upload_failure_shows_apology() {
    let (server, widgets) = test_server(RecordingBackend::failing());
    let id = open_portal(&server).await;

    server
        .post(&format!("/widgets/chat/{id}/upload"))
        .multipart(pdf_form("marzo.pdf"))
        .await;
    wait_until_idle(&widgets, &id).await;

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert_eq!(widget.messages().last().unwrap().text, UPLOAD_FAILURE_MESSAGE);
    assert!(widget.staged().is_none());
}

#[tokio::test]
async fn test_remove_attachment_clears_preview_only() {
    let backend = RecordingBackend::held();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    server
        .post(&format!("/widgets/chat/{id}/upload"))
        .multipart(pdf_form("marzo.pdf"))
        .await;

    let preview = server
        .delete(&format!("/widgets/chat/{id}/attachment"))
        .await
        .text();
    assert!(preview.is_empty());
    assert!(widgets.get(&id).unwrap().lock().await.is_processing());

    backend.release();
    wait_until_idle(&widgets, &id).await;
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_oversized_upload_shows_apology() {
    let backend = RecordingBackend::new();
    let (server, widgets) = test_server(backend.clone());
    let id = open_portal(&server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 2 * 1024 * 1024])
            .file_name("enorme.pdf")
            .mime_type("application/pdf"),
    );
    let response = server
        .post(&format!("/widgets/chat/{id}/upload"))
        .multipart(form)
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("chatbot-upload-preview"));
    assert!(backend.calls().is_empty());

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert_eq!(widget.messages().last().unwrap().text, UPLOAD_FAILURE_MESSAGE);
    assert!(widget.staged().is_none());
    assert!(!widget.is_processing());
}

#[tokio::test]
async fn test_evicted_widget_is_recreated() {
    let (server, widgets) = test_server(RecordingBackend::new());
    let id = open_portal(&server).await;
    widgets.remove(&id);
    assert!(widgets.get(&id).is_none());

    let opened = server.post(&format!("/widgets/chat/{id}/toggle")).await;
    opened.assert_status_ok();
    assert!(opened.text().contains("chatbot-window open"));

    let handle = widgets.get(&id).unwrap();
    let widget = handle.lock().await;
    assert_eq!(widget.messages().len(), 1);
    assert_eq!(widget.messages()[0].text, WELCOME_MESSAGE);
}

#[tokio::test]
async fn test_malformed_session_is_not_found() {
    let (server, widgets) = test_server(RecordingBackend::new());

    server
        .post("/widgets/chat/not-a-session/toggle")
        .expect_failure()
        .await
        .assert_status_not_found();
    assert!(widgets.is_empty());
}
