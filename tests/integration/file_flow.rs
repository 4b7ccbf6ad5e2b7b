//! File upload, content integrity, rename/move, and trash tests.

use bytes::Bytes;
use codehaven_core::checksum;
use codehaven_core::error::ErrorKind;
use codehaven_core::types::pagination::PageRequest;
use codehaven_entity::file::FileCategory;
use codehaven_service::RequestContext;
use codehaven_service::file::UploadFileRequest;
use codehaven_service::folder::CreateFolderRequest;
use codehaven_service::workspace::CreateWorkspaceRequest;
use uuid::Uuid;

use crate::helpers::TestHarness;

struct Tree {
    ws: codehaven_entity::workspace::Workspace,
    src: codehaven_entity::folder::Folder,
}

async fn tree(h: &TestHarness, ctx: &RequestContext) -> Tree {
    let ws = h
        .workspaces
        .create_workspace(
            ctx,
            CreateWorkspaceRequest {
                name: "w".into(),
                description: String::new(),
                is_public: false,
            },
        )
        .await
        .unwrap();
    let src = h
        .folders
        .create_folder(
            ctx,
            CreateFolderRequest {
                workspace_id: ws.id,
                parent_id: None,
                name: "src".into(),
            },
        )
        .await
        .unwrap();
    Tree { ws, src }
}

fn upload(ws: Uuid, folder: Uuid, name: &str, content: &'static str) -> UploadFileRequest {
    UploadFileRequest {
        workspace_id: ws,
        folder_id: folder,
        file_name: name.to_string(),
        content: Bytes::from(content),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_upload_then_read_roundtrip() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let content = "function main() {}\nmain();\n";
    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", content))
        .await
        .unwrap();

    assert_eq!(file.name, "app");
    assert_eq!(file.extension, "js");
    assert_eq!(file.category, FileCategory::Javascript);
    assert_eq!(file.mime_type, "application/javascript");
    assert_eq!(file.path, "/src/app.js");
    assert_eq!(file.blob_key, format!("workspaces/{}/src/app.js", t.ws.id));
    assert_eq!(file.size_bytes, content.len() as i64);
    assert_eq!(file.version, 1);
    assert_eq!(file.checksum_sha256, checksum::digest(content.as_bytes()));
    assert_eq!(file.metadata.0.line_count, Some(3));

    let (bytes, meta) = h.files.get_file_content(&ctx, file.id).await.unwrap();
    assert_eq!(bytes, Bytes::from(content));
    assert_eq!(checksum::digest(&bytes), meta.checksum_sha256);
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_second_upload_conflicts_instead_of_overwriting() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "data.txt", "0123456789"))
        .await
        .unwrap();

    let err = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "data.txt", "9876543210"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::Conflict));

    // The first upload's content is untouched.
    let (bytes, _) = h.files.get_file_content(&ctx, file.id).await.unwrap();
    assert_eq!(bytes, Bytes::from("0123456789"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_update_content_is_the_explicit_overwrite() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", "old"))
        .await
        .unwrap();

    let updated = h
        .files
        .update_content(&ctx, file.id, Bytes::from("brand new body\n"))
        .await
        .unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.blob_key, file.blob_key);
    assert_eq!(updated.size_bytes, 15);
    assert_ne!(updated.checksum_sha256, file.checksum_sha256);

    let (bytes, _) = h.files.get_file_content(&ctx, file.id).await.unwrap();
    assert_eq!(bytes, Bytes::from("brand new body\n"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_corrupted_content_surfaces_integrity_error() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", "trustworthy"))
        .await
        .unwrap();

    // Corrupt the stored object behind the metadata's back.
    h.blob.put(&file.blob_key, Bytes::from("tampered")).await.unwrap();

    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::Integrity));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_rename_file_rederives_key_and_category() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "script.js", "print()"))
        .await
        .unwrap();
    let old_key = file.blob_key.clone();

    let renamed = h.files.rename_file(&ctx, file.id, "script.py").await.unwrap();

    assert_eq!(renamed.path, "/src/script.py");
    assert_eq!(renamed.category, FileCategory::Python);
    assert_eq!(renamed.mime_type, "text/x-python");
    assert_eq!(renamed.blob_key, format!("workspaces/{}/src/script.py", t.ws.id));
    assert!(h.blob.exists(&renamed.blob_key).await.unwrap());
    assert!(!h.blob.exists(&old_key).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_move_file_to_sibling_folder() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let lib = h
        .folders
        .create_folder(
            &ctx,
            CreateFolderRequest {
                workspace_id: t.ws.id,
                parent_id: None,
                name: "lib".into(),
            },
        )
        .await
        .unwrap();
    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "util.js", "shared"))
        .await
        .unwrap();

    let moved = h.files.move_file(&ctx, file.id, lib.id).await.unwrap();
    assert_eq!(moved.folder_id, lib.id);
    assert_eq!(moved.path, "/lib/util.js");

    let in_src = h.files.list_files(&ctx, t.src.id, PageRequest::default()).await.unwrap();
    assert!(in_src.items.is_empty());
    let in_lib = h.files.list_files(&ctx, lib.id, PageRequest::default()).await.unwrap();
    assert_eq!(in_lib.items.len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_trash_then_restore_file() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", "gone soon"))
        .await
        .unwrap();

    h.files.soft_delete_file(&ctx, file.id).await.unwrap();

    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));

    // Restore brings the record back into the namespace. The local
    // provider's best-effort delete succeeded, so the content itself
    // stays gone — the documented limitation.
    let restored = h.files.restore_file(&ctx, file.id).await.unwrap();
    assert!(!restored.is_deleted);
    let err = h.files.get_file_content(&ctx, file.id).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_upload_over_trashed_name_conflicts_on_key() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    let t = tree(&h, &ctx).await;

    let file = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", "first"))
        .await
        .unwrap();
    h.files.soft_delete_file(&ctx, file.id).await.unwrap();

    // The trashed record still owns the derived key, so a re-create of
    // the same name reports Conflict until the trash entry is gone.
    let err = h
        .files
        .upload_file(&ctx, upload(t.ws.id, t.src.id, "app.js", "second"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::Conflict));
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn test_list_files_for_missing_folder() {
    let h = TestHarness::new().await;
    let ctx = h.new_actor();
    tree(&h, &ctx).await;

    let err = h
        .files
        .list_files(&ctx, Uuid::new_v4(), PageRequest::default())
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
}
