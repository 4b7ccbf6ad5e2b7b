//! Workspace lifecycle tests.

use bytes::Bytes;
use codehaven_core::error::ErrorKind;
use codehaven_core::key;
use codehaven_service::file::UploadFileRequest;
use codehaven_service::folder::CreateFolderRequest;
use codehaven_service::workspace::CreateWorkspaceRequest;

use crate::helpers::TestHarness;

fn workspace_req(name: &str) -> CreateWorkspaceRequest {
    CreateWorkspaceRequest {
        name: name.to_string(),
        description: String::new(),
        is_public: false,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_create_workspace_writes_init_marker() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&ctx, workspace_req("playground"))
        .await
        .unwrap();

    assert_eq!(ws.blob_prefix, format!("workspaces/{}/", ws.id));
    assert_eq!(ws.owner_id, ctx.actor_id);
    assert_eq!(ws.collaborators, vec![ctx.actor_id]);
    assert_eq!(ws.settings.0.default_language, "javascript");
    assert!(!ws.is_deleted);

    assert!(h.blob.exists(&key::workspace_marker_key(ws.id)).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_list_workspaces_scoped_to_member() {
    let h = TestHarness::new().await;
    let alice = h.new_actor();
    let bob = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&alice, workspace_req("alice-only"))
        .await
        .unwrap();

    assert_eq!(h.workspaces.list_workspaces(&alice).await.unwrap().len(), 1);
    assert!(h.workspaces.list_workspaces(&bob).await.unwrap().is_empty());

    let err = h.workspaces.get_workspace(&bob, ws.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_soft_delete_cascades_to_whole_tree() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&ctx, workspace_req("doomed"))
        .await
        .unwrap();
    let folder = h
        .folders
        .create_folder(
            &ctx,
            CreateFolderRequest {
                workspace_id: ws.id,
                parent_id: None,
                name: "src".into(),
            },
        )
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: folder.id,
                file_name: "app.js".into(),
                content: Bytes::from("console.log(1);\n"),
            },
        )
        .await
        .unwrap();

    h.workspaces.soft_delete_workspace(&ctx, ws.id).await.unwrap();

    assert!(h.workspaces.list_workspaces(&ctx).await.unwrap().is_empty());
    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));

    // The local provider's prefix delete succeeds, so the content is
    // gone immediately rather than waiting for the sweep.
    assert!(h.blob.list_keys(&ws.blob_prefix).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_soft_delete_requires_owner() {
    let h = TestHarness::new().await;
    let alice = h.new_actor();
    let mallory = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&alice, workspace_req("locked"))
        .await
        .unwrap();

    let err = h
        .workspaces
        .soft_delete_workspace(&mallory, ws.id)
        .await
        .unwrap_err();
    // Non-members see NotFound, not Unauthorized.
    assert!(err.is_kind(ErrorKind::NotFound));

    assert!(h.workspaces.get_workspace(&alice, ws.id).await.is_ok());
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_restore_workspace_brings_back_metadata_not_blobs() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&ctx, workspace_req("phoenix"))
        .await
        .unwrap();
    let folder = h
        .folders
        .create_folder(
            &ctx,
            CreateFolderRequest {
                workspace_id: ws.id,
                parent_id: None,
                name: "src".into(),
            },
        )
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: folder.id,
                file_name: "app.js".into(),
                content: Bytes::from("let x = 1;\n"),
            },
        )
        .await
        .unwrap();

    h.workspaces.soft_delete_workspace(&ctx, ws.id).await.unwrap();
    let restored = h.workspaces.restore_workspace(&ctx, ws.id).await.unwrap();
    assert!(!restored.is_deleted);

    // Folder and file records are live again...
    let listed = h
        .folders
        .list_folders(&ctx, ws.id, None, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);

    // ...but the content was reclaimed when the workspace was trashed,
    // which restore explicitly does not undo.
    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_find_orphaned_keys_reports_unreferenced_blobs() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();

    let ws = h
        .workspaces
        .create_workspace(&ctx, workspace_req("orphanage"))
        .await
        .unwrap();
    let folder = h
        .folders
        .create_folder(
            &ctx,
            CreateFolderRequest {
                workspace_id: ws.id,
                parent_id: None,
                name: "src".into(),
            },
        )
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: folder.id,
                file_name: "kept.js".into(),
                content: Bytes::from("kept"),
            },
        )
        .await
        .unwrap();

    // Nothing is orphaned right after a clean upload; markers excluded.
    assert!(h.workspaces.find_orphaned_keys(&ctx, ws.id).await.unwrap().is_empty());

    // Simulate the chosen failure bias: blob written, metadata insert
    // failed. The stray key must show up in the reconciliation listing.
    let stray = format!("{}src/stray.js", ws.blob_prefix);
    h.blob.put(&stray, Bytes::from("nobody points at me")).await.unwrap();

    let orphans = h.workspaces.find_orphaned_keys(&ctx, ws.id).await.unwrap();
    assert_eq!(orphans, vec![stray]);
    assert!(!orphans.contains(&file.blob_key));
}
