// End-to-end tests for LocalCommentService with a scratch SQLite file, a
// temporary attachment directory and the mock media toolkit.

use std::sync::Arc;

use remark_core::context::{CreateProject, CreateTask, CreateUnit, CreateUser};
use remark_core::{AttachmentFormat, ContentType, CreateComment, TaskStatus};
use remark_db::Db;
use remark_media::mock::MockToolkit;
use remark_service::{CommentService, LocalCommentService, ServiceError, Upload, WAV_MIME_TYPE};
use remark_store::{LocalStore, StoreConfig};

const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";
const PDF_BYTES: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n";

struct Harness {
    _dir: tempfile::TempDir,
    db_path: std::path::PathBuf,
    db: Db,
    svc: LocalCommentService,
    toolkit: Arc<MockToolkit>,
    tutor: i64,
    convenor: i64,
    marker: i64,
    student: i64,
    task: i64,
}

fn harness() -> Harness {
    harness_with(MockToolkit::new())
}

fn harness_with(toolkit: MockToolkit) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("remark.db");
    let db = Db::open_path(&db_path).unwrap();
    let store = Arc::new(LocalStore::new(&StoreConfig {
        local_data_dir: Some(dir.path().join("attachments").to_string_lossy().to_string()),
    }));
    let toolkit = Arc::new(toolkit);
    let svc = LocalCommentService::new(db.clone(), store, toolkit.clone());

    let user = |name: &str| {
        db.create_user(&CreateUser {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
        })
        .unwrap()
        .id
    };
    let tutor = user("Tutor");
    let convenor = user("Convenor");
    let marker = user("Marker");
    let student = user("Student");

    let unit = db
        .create_unit(&CreateUnit {
            code: "COS20007".into(),
            name: "Object Oriented Programming".into(),
        })
        .unwrap()
        .id;
    db.add_unit_staff(unit, tutor).unwrap();
    db.add_unit_staff(unit, convenor).unwrap();
    db.add_unit_staff(unit, marker).unwrap();

    let project = db
        .create_project(&CreateProject {
            unit_id: unit,
            student_id: student,
            main_tutor_id: Some(tutor),
        })
        .unwrap();
    let task = db
        .create_task(&CreateTask {
            project_id: project.id,
            name: "Credit Task 2".into(),
            status: TaskStatus::WorkingOnIt,
        })
        .unwrap()
        .id;

    Harness {
        _dir: dir,
        db_path,
        db,
        svc,
        toolkit,
        tutor,
        convenor,
        marker,
        student,
        task,
    }
}

impl Harness {
    /// Run SQL through a second connection, e.g. to make later writes fail.
    fn execute_side(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    async fn text_from_student(&self, body: &str) -> i64 {
        self.svc
            .create_comment(&CreateComment::text(self.task, self.student, self.tutor, body))
            .await
            .unwrap()
            .id
    }

    async fn media_from_tutor(&self, kind: ContentType) -> i64 {
        self.svc
            .create_comment(&CreateComment::media(self.task, self.tutor, self.student, kind))
            .await
            .unwrap()
            .id
    }
}

// -- Creation and validation --

#[tokio::test]
async fn author_has_read_their_own_comment() {
    let h = harness();
    let id = h.text_from_student("Could you look at my loop?").await;

    assert!(h.svc.is_read(h.student, id).await.unwrap());
    assert!(!h.svc.is_read(h.tutor, id).await.unwrap());

    let own = h.svc.serialize(id, h.student).await.unwrap();
    assert!(!own.is_new);
    let theirs = h.svc.serialize(id, h.tutor).await.unwrap();
    assert!(theirs.is_new);
}

#[tokio::test]
async fn main_tutor_comment_is_read_by_whole_staff() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Discussion).await;

    for staff in [h.tutor, h.convenor, h.marker] {
        assert!(h.svc.is_read(staff, id).await.unwrap(), "user {staff}");
    }
    assert!(!h.svc.is_read(h.student, id).await.unwrap());
    assert_eq!(h.svc.count_read_receipts(id).await.unwrap(), 3);
}

#[tokio::test]
async fn failed_author_receipt_leaves_no_comment() {
    let h = harness();
    h.execute_side(
        "CREATE TRIGGER reject_receipts BEFORE INSERT ON comments_read_receipts
         BEGIN SELECT RAISE(ABORT, 'receipts rejected'); END;",
    );

    let err = h
        .svc
        .create_comment(&CreateComment::text(h.task, h.student, h.tutor, "lost?"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Internal(_)), "got {err}");
    assert!(h.svc.list_comments(h.task).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_fields_are_reported_by_name() {
    let h = harness();
    let err = h
        .svc
        .create_comment(&CreateComment::default())
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation(fields) => {
            assert_eq!(fields, vec!["recipient_id", "task_id", "user_id"])
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert!(h.db.list_comments(h.task).unwrap().is_empty());
}

#[tokio::test]
async fn unknown_references_are_validation_errors() {
    let h = harness();
    let err = h
        .svc
        .create_comment(&CreateComment::text(h.task, h.student, 9999, "hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ServiceError::Validation(f) if f == &vec!["recipient_id".to_string()]),
        "got {err}"
    );

    let err = h
        .svc
        .create_comment(&CreateComment::text(9999, h.student, h.tutor, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(&err, ServiceError::Validation(f) if f == &vec!["task_id".to_string()]));
}

#[tokio::test]
async fn overlong_body_is_rejected_and_nothing_is_written() {
    let h = harness();
    let body = "é".repeat(4096);
    let err = h
        .svc
        .create_comment(&CreateComment::text(h.task, h.student, h.tutor, &body))
        .await
        .unwrap_err();
    assert!(matches!(&err, ServiceError::Validation(f) if f == &vec!["comment".to_string()]));
    assert!(h.db.list_comments(h.task).unwrap().is_empty());

    let body = "é".repeat(4095);
    h.text_from_student(&body).await;
}

// -- Read receipts --

#[tokio::test]
async fn mark_read_is_idempotent() {
    let h = harness();
    let id = h.text_from_student("first draft").await;

    h.svc.mark_read(h.marker, id).await.unwrap();
    let first = h.svc.read_time(h.marker, id).await.unwrap().unwrap();
    h.svc.mark_read(h.marker, id).await.unwrap();
    let again = h.svc.read_time(h.marker, id).await.unwrap().unwrap();

    assert_eq!(first, again);
    // author + marker
    assert_eq!(h.db.count_read_receipts(id).unwrap(), 2);
}

#[tokio::test]
async fn non_supervisor_read_only_marks_themselves() {
    let h = harness();
    let id = h.text_from_student("question").await;

    h.svc.mark_read(h.marker, id).await.unwrap();

    assert!(h.svc.is_read(h.marker, id).await.unwrap());
    assert!(!h.svc.is_read(h.tutor, id).await.unwrap());
    assert!(!h.svc.is_read(h.convenor, id).await.unwrap());
}

#[tokio::test]
async fn main_tutor_read_marks_whole_staff() {
    let h = harness();
    let id = h.text_from_student("ready for feedback").await;

    h.svc.mark_read(h.tutor, id).await.unwrap();

    for staff in [h.tutor, h.convenor, h.marker] {
        assert!(h.svc.is_read(staff, id).await.unwrap(), "user {staff}");
    }
    // 3 staff + the author
    assert_eq!(h.db.count_read_receipts(id).unwrap(), 4);
}

#[tokio::test]
async fn main_tutor_outside_staff_roster_still_gets_receipt() {
    let h = harness();
    let outsider = h
        .db
        .create_user(&CreateUser {
            name: "Guest".into(),
            email: "guest@example.com".into(),
        })
        .unwrap()
        .id;
    let project = h.db.get_task(h.task).unwrap().project_id;
    h.db.set_main_tutor(project, Some(outsider)).unwrap();

    let id = h.text_from_student("hello").await;
    h.svc.mark_read(outsider, id).await.unwrap();

    assert!(h.svc.is_read(outsider, id).await.unwrap());
    assert!(h.svc.is_read(h.convenor, id).await.unwrap());
}

#[tokio::test]
async fn mark_unread_does_not_fan_out() {
    let h = harness();
    let id = h.text_from_student("check this").await;
    h.svc.mark_read(h.tutor, id).await.unwrap();

    h.svc.mark_unread(h.tutor, id).await.unwrap();

    assert!(!h.svc.is_read(h.tutor, id).await.unwrap());
    assert!(h.svc.is_read(h.convenor, id).await.unwrap());
    assert!(h.svc.is_read(h.marker, id).await.unwrap());
    assert!(h.svc.serialize(id, h.tutor).await.unwrap().is_new);

    // Unreading something never read is a no-op.
    h.svc.mark_unread(h.tutor, id).await.unwrap();
}

// -- Views --

#[tokio::test]
async fn view_uses_label_for_media_comments() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Pdf).await;

    let view = h.svc.serialize(id, h.student).await.unwrap();
    assert_eq!(view.comment.as_deref(), Some("pdf document"));
    assert!(view.has_attachment);
    assert_eq!(view.kind, ContentType::Pdf);

    let id = h.media_from_tutor(ContentType::Discussion).await;
    let view = h.svc.serialize(id, h.student).await.unwrap();
    assert_eq!(view.comment.as_deref(), Some("discussion comment"));
    assert!(!view.has_attachment);
}

#[tokio::test]
async fn recipient_email_mirrors_author() {
    let h = harness();
    let id = h.text_from_student("email check").await;

    let view = h.svc.serialize(id, h.tutor).await.unwrap();
    assert_eq!(view.author.email, "student@example.com");
    assert_eq!(view.recipient.id, h.tutor);
    assert_eq!(view.recipient.name, "Tutor");
    assert_eq!(view.recipient.email, "student@example.com");
}

#[tokio::test]
async fn recipient_read_time_appears_once_read() {
    let h = harness();
    let id = h.text_from_student("waiting").await;

    let view = h.svc.serialize(id, h.student).await.unwrap();
    assert!(view.recipient_read_time.is_none());

    h.svc.mark_read(h.tutor, id).await.unwrap();
    let read_at = h.svc.read_time(h.tutor, id).await.unwrap();
    let view = h.svc.serialize(id, h.student).await.unwrap();
    assert_eq!(view.recipient_read_time, read_at);
    assert!(read_at.is_some());
}

#[tokio::test]
async fn task_view_lists_comments_in_order() {
    let h = harness();
    let a = h.text_from_student("one").await;
    let b = h.media_from_tutor(ContentType::Audio).await;

    let views = h.svc.serialize_task(h.task, h.student).await.unwrap();
    assert_eq!(views.iter().map(|v| v.id).collect::<Vec<_>>(), vec![a, b]);
    assert!(!views[0].is_new);
    assert!(views[1].is_new);

    let json = serde_json::to_value(&views[1]).unwrap();
    assert_eq!(json["type"], "audio");
    assert_eq!(json["comment"], "audio comment");
}

// -- Attachments --

#[tokio::test]
async fn audio_is_stored_as_wav() {
    let h = harness();
    // Pad the table so the comment under test gets id 42.
    loop {
        let id = h.text_from_student("filler").await;
        if id == 41 {
            break;
        }
    }
    let id = h.media_from_tutor(ContentType::Audio).await;
    assert_eq!(id, 42);

    let stored = h
        .svc
        .add_attachment(id, Upload::from_bytes(b"OggS fake recording").unwrap())
        .await
        .unwrap();
    assert!(stored);

    let comment = h.svc.get_comment(id).await.unwrap();
    assert_eq!(comment.attachment_format, Some(AttachmentFormat::Wav));

    let path = h.svc.attachment_path(id).await.unwrap().unwrap();
    assert!(path.ends_with("comment-42.wav"));
    assert_eq!(
        h.svc.attachment_file_name(id).await.unwrap().as_deref(),
        Some("comment-42.wav")
    );
    assert_eq!(std::fs::read(&path).unwrap(), remark_media::mock::FAKE_WAV);

    assert_eq!(
        h.svc.attachment_mime_type(id).await.unwrap().as_deref(),
        Some(WAV_MIME_TYPE)
    );
    assert_eq!(h.toolkit.calls(), vec!["transcode_audio"]);
}

#[tokio::test]
async fn failed_transcode_leaves_comment_without_attachment() {
    let h = harness_with(MockToolkit::new().failing_audio());
    let id = h.media_from_tutor(ContentType::Audio).await;

    let upload = Upload::from_bytes(b"not audio").unwrap();
    let upload_path = upload.path().to_path_buf();
    let stored = h.svc.add_attachment(id, upload).await.unwrap();

    assert!(!stored);
    assert!(!upload_path.exists());
    assert_eq!(h.svc.get_comment(id).await.unwrap().attachment_format, None);
    assert_eq!(h.svc.attachment_path(id).await.unwrap(), None);
    assert_eq!(h.svc.attachment_file_name(id).await.unwrap(), None);
    assert_eq!(h.svc.attachment_mime_type(id).await.unwrap(), None);
}

#[tokio::test]
async fn gif_is_stored_unchanged() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Image).await;

    assert!(h
        .svc
        .add_attachment(id, Upload::from_bytes(GIF_BYTES).unwrap())
        .await
        .unwrap());

    let path = h.svc.attachment_path(id).await.unwrap().unwrap();
    assert!(path.to_string_lossy().ends_with(".gif"));
    assert_eq!(std::fs::read(&path).unwrap(), GIF_BYTES);
    assert_eq!(
        h.svc.attachment_mime_type(id).await.unwrap().as_deref(),
        Some("image/gif")
    );
    assert!(h.toolkit.calls().is_empty());
}

#[tokio::test]
async fn other_images_are_compressed_to_jpeg() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Image).await;

    let upload = Upload::from_bytes(PNG_BYTES).unwrap();
    let upload_path = upload.path().to_path_buf();
    assert!(h.svc.add_attachment(id, upload).await.unwrap());
    assert!(!upload_path.exists());

    let comment = h.svc.get_comment(id).await.unwrap();
    assert_eq!(comment.attachment_format, Some(AttachmentFormat::Jpg));
    assert_eq!(
        h.svc.attachment_mime_type(id).await.unwrap().as_deref(),
        Some("image/jpeg")
    );
    assert_eq!(h.toolkit.calls(), vec!["compress_image"]);
}

#[tokio::test]
async fn pdf_is_kept_when_compression_fails() {
    let h = harness_with(MockToolkit::new().failing_pdf());
    let id = h.media_from_tutor(ContentType::Pdf).await;

    assert!(h
        .svc
        .add_attachment(id, Upload::from_bytes(PDF_BYTES).unwrap())
        .await
        .unwrap());

    let path = h.svc.attachment_path(id).await.unwrap().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), PDF_BYTES);
    assert_eq!(
        h.svc.attachment_mime_type(id).await.unwrap().as_deref(),
        Some("application/pdf")
    );
}

#[tokio::test]
async fn reupload_in_new_format_replaces_old_file() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Image).await;

    h.svc
        .add_attachment(id, Upload::from_bytes(GIF_BYTES).unwrap())
        .await
        .unwrap();
    let gif_path = h.svc.attachment_path(id).await.unwrap().unwrap();

    h.svc
        .add_attachment(id, Upload::from_bytes(PNG_BYTES).unwrap())
        .await
        .unwrap();
    let jpg_path = h.svc.attachment_path(id).await.unwrap().unwrap();

    assert!(!gif_path.exists());
    assert!(jpg_path.exists());
    assert_ne!(gif_path, jpg_path);
}

const FREEZE_COMMENTS: &str = "CREATE TRIGGER freeze_comments BEFORE UPDATE ON task_comments
     BEGIN SELECT RAISE(ABORT, 'comments frozen'); END;";

#[tokio::test]
async fn same_format_reupload_keeps_old_file_when_update_fails() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Image).await;
    h.svc
        .add_attachment(id, Upload::from_bytes(GIF_BYTES).unwrap())
        .await
        .unwrap();
    let path = h.svc.attachment_path(id).await.unwrap().unwrap();

    h.execute_side(FREEZE_COMMENTS);
    let mut other_gif = GIF_BYTES.to_vec();
    other_gif.extend_from_slice(b"\x00\x3b");
    let err = h
        .svc
        .add_attachment(id, Upload::from_bytes(&other_gif).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Internal(_)), "got {err}");
    let comment = h.svc.get_comment(id).await.unwrap();
    assert_eq!(comment.attachment_format, Some(AttachmentFormat::Gif));
    assert_eq!(std::fs::read(&path).unwrap(), GIF_BYTES);
}

#[tokio::test]
async fn new_format_is_removed_when_update_fails() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Image).await;
    h.svc
        .add_attachment(id, Upload::from_bytes(GIF_BYTES).unwrap())
        .await
        .unwrap();
    let gif_path = h.svc.attachment_path(id).await.unwrap().unwrap();

    h.execute_side(FREEZE_COMMENTS);
    h.svc
        .add_attachment(id, Upload::from_bytes(PNG_BYTES).unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        h.svc.get_comment(id).await.unwrap().attachment_format,
        Some(AttachmentFormat::Gif)
    );
    assert!(gif_path.exists());
    assert!(!gif_path.with_extension("jpg").exists());
}

#[tokio::test]
async fn text_comments_reject_attachments() {
    let h = harness();
    let id = h.text_from_student("no files here").await;

    let upload = Upload::from_bytes(PDF_BYTES).unwrap();
    let upload_path = upload.path().to_path_buf();
    let err = h.svc.add_attachment(id, upload).await.unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(!upload_path.exists());
    assert_eq!(h.svc.get_comment(id).await.unwrap().attachment_format, None);
}

#[tokio::test]
async fn attachment_for_missing_comment_is_not_found() {
    let h = harness();
    let err = h
        .svc
        .add_attachment(404, Upload::from_bytes(PDF_BYTES).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

// -- Deletion --

#[tokio::test]
async fn delete_removes_file_and_receipts() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Pdf).await;
    h.svc
        .add_attachment(id, Upload::from_bytes(PDF_BYTES).unwrap())
        .await
        .unwrap();
    h.svc.mark_read(h.student, id).await.unwrap();
    let path = h.svc.attachment_path(id).await.unwrap().unwrap();
    assert!(path.exists());

    h.svc.delete_comment(id).await.unwrap();

    assert!(!path.exists());
    assert_eq!(h.svc.count_read_receipts(id).await.unwrap(), 0);
    assert!(matches!(
        h.svc.get_comment(id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_tolerates_missing_file() {
    let h = harness();
    let id = h.media_from_tutor(ContentType::Audio).await;
    h.svc
        .add_attachment(id, Upload::from_bytes(b"OggS").unwrap())
        .await
        .unwrap();
    let path = h.svc.attachment_path(id).await.unwrap().unwrap();
    std::fs::remove_file(&path).unwrap();

    h.svc.delete_comment(id).await.unwrap();
    assert!(h.db.list_comments(h.task).unwrap().is_empty());
}
