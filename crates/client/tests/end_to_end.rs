//! Drives the wizard and REST client against the real router served on a
//! local port, backed by an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use tempfile::TempDir;
use wizflow_api::config::{Environment, ServerConfig};
use wizflow_api::router::build_app_router;
use wizflow_api::state::AppState;
use wizflow_client::wizard::ProcessingOption;
use wizflow_client::{ClientConfig, ClientError, LocalFile, StepOutcome, Wizard, WorkflowClient};
use wizflow_core::store::InMemoryWorkflowStore;
use wizflow_core::upload::UploadConfig;
use wizflow_core::workflow::{NewWorkflow, OutputFormat, Source, SourceType, WorkflowPatch};

struct Server {
    base_url: String,
    _upload_dir: TempDir,
}

async fn spawn_server() -> Server {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        upload_dir: upload_dir.path().to_path_buf(),
        uploads_url_prefix: "/uploads".to_string(),
        upload: UploadConfig::default(),
        environment: Environment::Production,
    };
    let state = AppState {
        store: Arc::new(InMemoryWorkflowStore::new()),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server {
        base_url: format!("http://{addr}/api"),
        _upload_dir: upload_dir,
    }
}

fn client(server: &Server) -> WorkflowClient {
    WorkflowClient::new(ClientConfig::with_base_url(&server.base_url)).unwrap()
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crud_round_trip() {
    let server = spawn_server().await;
    let client = client(&server);

    let draft = NewWorkflow {
        name: "Invoices".to_string(),
        source: Source {
            source_type: SourceType::Folder,
            config: serde_json::json!({ "folderPath": "/in" })
                .as_object()
                .cloned()
                .unwrap(),
        },
        ..Default::default()
    };
    let created = client.create_workflow(&draft).await.unwrap();
    assert_eq!(created.name, "Invoices");
    assert_eq!(created.source.config["folderPath"], "/in");

    let fetched = client.get_workflow(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let patch = WorkflowPatch {
        description: Some(Some("Monthly".to_string())),
        ..Default::default()
    };
    let updated = client.update_workflow(created.id, &patch).await.unwrap();
    assert_eq!(updated.description.as_deref(), Some("Monthly"));
    assert_eq!(updated.name, "Invoices");

    assert_eq!(client.list_workflows().await.unwrap().len(), 1);

    let message = client.delete_workflow(created.id).await.unwrap();
    assert_eq!(message, "Workflow deleted successfully");
    assert!(client.list_workflows().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_errors_carry_server_message_and_reach_hook() {
    let server = spawn_server().await;
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let client = client(&server).on_error(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = client.get_workflow(999).await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 404, .. });
    assert_eq!(err.message(), "Workflow with id 999 not found");

    let invalid = NewWorkflow::default();
    let err = client.create_workflow(&invalid).await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 400, ref errors, .. } if errors == &vec!["Name is required".to_string()]);
    assert_eq!(err.message(), "Name is required");

    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wizard_upload_then_submit_produces_one_workflow() {
    let server = spawn_server().await;
    let client = client(&server);
    let mut wizard = Wizard::new();

    // Step 1 -> 2.
    assert_matches!(
        wizard.complete_step(&client).await,
        Ok(StepOutcome::Advanced { from: 1, to: 2 })
    );

    // Files dropped before the draft is named.
    let backing = wizard
        .files_selected(
            &client,
            vec![
                LocalFile::new("report.pdf", b"%PDF-1.4".to_vec()),
                LocalFile::new("data.csv", b"a,b\n1,2".to_vec()),
            ],
        )
        .await
        .unwrap();
    assert_eq!(backing.name, "New Workflow");
    assert_eq!(backing.files.len(), 2);

    let more = wizard
        .files_selected(&client, vec![LocalFile::new("notes.txt", b"hi".to_vec())])
        .await
        .unwrap();
    assert_eq!(more.id, backing.id);
    assert_eq!(more.files.len(), 3);
    assert_eq!(wizard.selected_files().await.len(), 3);

    wizard.set_name("Quarterly close");
    wizard.set_processing_option(ProcessingOption::OutputFormat(OutputFormat::Pdf));
    wizard.complete_step(&client).await.unwrap();
    wizard.complete_step(&client).await.unwrap();

    let outcome = wizard.complete_step(&client).await.unwrap();
    let saved = assert_matches!(outcome, StepOutcome::Submitted(w) => w);
    assert_eq!(saved.id, backing.id);
    assert_eq!(saved.name, "Quarterly close");
    assert_eq!(saved.processing_options.output_format, OutputFormat::Pdf);
    assert_eq!(saved.files.len(), 3);

    let all = client.list_workflows().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn wizard_without_files_creates_on_submit() {
    let server = spawn_server().await;
    let client = client(&server);
    let mut wizard = Wizard::new();
    wizard.set_name("No files");
    wizard.set_source_type(SourceType::Api);
    wizard.set_source_config_field("apiUrl", "https://example.com/feed");

    for _ in 0..3 {
        wizard.complete_step(&client).await.unwrap();
    }
    let outcome = wizard.complete_step(&client).await.unwrap();
    let saved = assert_matches!(outcome, StepOutcome::Submitted(w) => w);

    assert!(saved.files.is_empty());
    assert_eq!(saved.source.source_type, SourceType::Api);
    assert_eq!(client.get_workflow(saved.id).await.unwrap(), saved);
}
