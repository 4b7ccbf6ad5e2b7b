//! Folder hierarchy tests: paths, uniqueness, rename cascades, repair.

use bytes::Bytes;
use codehaven_core::error::ErrorKind;
use codehaven_core::key;
use codehaven_core::types::pagination::PageRequest;
use codehaven_service::RequestContext;
use codehaven_service::file::UploadFileRequest;
use codehaven_service::folder::CreateFolderRequest;
use codehaven_service::workspace::CreateWorkspaceRequest;
use uuid::Uuid;

use crate::helpers::TestHarness;

async fn workspace(h: &TestHarness, ctx: &RequestContext) -> codehaven_entity::workspace::Workspace {
    h.workspaces
        .create_workspace(
            ctx,
            CreateWorkspaceRequest {
                name: "w".into(),
                description: String::new(),
                is_public: false,
            },
        )
        .await
        .unwrap()
}

fn folder_req(ws: Uuid, parent: Option<Uuid>, name: &str) -> CreateFolderRequest {
    CreateFolderRequest {
        workspace_id: ws,
        parent_id: parent,
        name: name.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_folder_paths_follow_parent_chain() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let src = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "src"))
        .await
        .unwrap();
    assert_eq!(src.path, "/src");

    let components = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, Some(src.id), "components"))
        .await
        .unwrap();
    assert_eq!(components.path, "/src/components");

    // Marker objects land under the derived prefixes.
    assert!(h.blob.exists(&key::folder_marker_key(ws.id, "/src")).await.unwrap());
    assert!(
        h.blob
            .exists(&key::folder_marker_key(ws.id, "/src/components"))
            .await
            .unwrap()
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_invalid_names_and_missing_parents_are_rejected() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let err = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "bad/name"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::InvalidName));

    let err = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, Some(Uuid::new_v4()), "docs"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_duplicate_sibling_names_conflict() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    h.folders
        .create_folder(&ctx, folder_req(ws.id, None, "docs"))
        .await
        .unwrap();
    let err = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "docs"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::Conflict));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_concurrent_creates_have_one_winner() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let (a, b) = tokio::join!(
        h.folders.create_folder(&ctx, folder_req(ws.id, None, "docs")),
        h.folders.create_folder(&ctx, folder_req(ws.id, None, "docs")),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent create may win");
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(loser.is_kind(ErrorKind::Conflict));

    let listed = h
        .folders
        .list_folders(&ctx, ws.id, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].name, "docs");
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_rename_folder_rewrites_descendants_and_blob_keys() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let src = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "src"))
        .await
        .unwrap();
    let components = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, Some(src.id), "components"))
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: components.id,
                file_name: "App.tsx".into(),
                content: Bytes::from("export default {}\n"),
            },
        )
        .await
        .unwrap();
    let old_key = file.blob_key.clone();

    let renamed = h.folders.rename_folder(&ctx, src.id, "source").await.unwrap();
    assert_eq!(renamed.path, "/source");

    // The whole subtree followed, metadata and content both.
    let (content, moved) = h.files.get_file_content(&ctx, file.id).await.unwrap();
    assert_eq!(content, Bytes::from("export default {}\n"));
    assert_eq!(moved.path, "/source/components/App.tsx");
    assert_eq!(
        moved.blob_key,
        format!("workspaces/{}/source/components/App.tsx", ws.id)
    );
    assert!(h.blob.exists(&moved.blob_key).await.unwrap());
    assert!(!h.blob.exists(&old_key).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_move_folder_under_new_parent() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let src = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "src"))
        .await
        .unwrap();
    let legacy = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "legacy"))
        .await
        .unwrap();

    let moved = h
        .folders
        .move_folder(&ctx, legacy.id, Some(src.id))
        .await
        .unwrap();
    assert_eq!(moved.path, "/src/legacy");
    assert_eq!(moved.parent_id, Some(src.id));

    // Moving a folder under its own subtree must be refused.
    let err = h
        .folders
        .move_folder(&ctx, src.id, Some(moved.id))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::Validation));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_soft_deleted_folder_vanishes_but_blob_survives() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let src = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "src"))
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: src.id,
                file_name: "app.js".into(),
                content: Bytes::from("alert(1)"),
            },
        )
        .await
        .unwrap();
    assert_eq!(file.blob_key, format!("workspaces/{}/src/app.js", ws.id));

    h.folders.soft_delete_folder(&ctx, src.id).await.unwrap();

    let files = h
        .files
        .list_files(&ctx, src.id, PageRequest::default())
        .await
        .unwrap();
    assert!(files.items.is_empty());

    let folders = h
        .folders
        .list_folders(&ctx, ws.id, None, PageRequest::default())
        .await
        .unwrap();
    assert!(folders.items.is_empty());

    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));

    // Folder trashing is metadata-only: a direct fetch by key still
    // succeeds until the workspace sweep reclaims it.
    assert_eq!(h.blob.get(&file.blob_key).await.unwrap(), Bytes::from("alert(1)"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_restore_folder_requires_live_ancestors() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let outer = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "outer"))
        .await
        .unwrap();
    let inner = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, Some(outer.id), "inner"))
        .await
        .unwrap();

    h.folders.soft_delete_folder(&ctx, outer.id).await.unwrap();

    let err = h.folders.restore_folder(&ctx, inner.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));

    let restored = h.folders.restore_folder(&ctx, outer.id).await.unwrap();
    assert_eq!(restored.path, "/outer");

    // The cascade brought the child back with its parent.
    let children = h
        .folders
        .list_folders(&ctx, ws.id, Some(outer.id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(children.items.len(), 1);
    assert_eq!(children.items[0].id, inner.id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_repair_scan_fixes_interrupted_rewrite() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let ws = workspace(&h, &ctx).await;

    let src = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, None, "src"))
        .await
        .unwrap();
    let nested = h
        .folders
        .create_folder(&ctx, folder_req(ws.id, Some(src.id), "lib"))
        .await
        .unwrap();
    h.files
        .upload_file(
            &ctx,
            UploadFileRequest {
                workspace_id: ws.id,
                folder_id: nested.id,
                file_name: "util.js".into(),
                content: Bytes::from("x"),
            },
        )
        .await
        .unwrap();

    // Simulate a rename that flipped the node but never reached the
    // descendants: the child path no longer matches parent.path + name.
    sqlx::query("UPDATE folders SET name = 'source', path = '/source' WHERE id = $1")
        .bind(src.id)
        .execute(&h.pool)
        .await
        .unwrap();

    let (folders_fixed, files_fixed) = h.folders.repair_paths(&ctx, ws.id).await.unwrap();
    assert!(folders_fixed >= 1);
    assert_eq!(files_fixed, 1);

    let lib: codehaven_entity::folder::Folder =
        sqlx::query_as("SELECT * FROM folders WHERE id = $1")
            .bind(nested.id)
            .fetch_one(&h.pool)
            .await
            .unwrap();
    assert_eq!(lib.path, "/source/lib");

    let file: codehaven_entity::file::File =
        sqlx::query_as("SELECT * FROM files WHERE workspace_id = $1")
            .bind(ws.id)
            .fetch_one(&h.pool)
            .await
            .unwrap();
    assert_eq!(file.path, "/source/lib/util.js");
    assert_eq!(file.blob_key, format!("workspaces/{}/source/lib/util.js", ws.id));
}
