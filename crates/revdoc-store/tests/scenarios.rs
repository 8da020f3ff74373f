//! Integration tests for the authoritative store.
//!
//! Tests cover:
//! - Draft/publish lifecycle through commands
//! - Concurrent submissions from several clients on one document
//! - Parallel documents that never contend
//! - Filesystem round trip of a document with and without a draft

use revdoc_core::{ClientId, DocumentId, OperationData, RevisionId, TextOperation};
use revdoc_store::{
    ApplyError, AssetCommand, AssetEvent, DocumentEvent, DocumentStore, EditText,
    StoreConfigBuilder, StoreError, Submission,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn edit(client: &ClientId, op: TextOperation, base: u64) -> AssetCommand {
    AssetCommand::EditText(EditText::new(client.clone(), &op, RevisionId(base)))
}

#[test]
fn test_publish_lifecycle() {
    let store = DocumentStore::default();
    let id = DocumentId::from_string("lifecycle");
    let doc = store.create(id.clone(), "A").unwrap();
    let alice = ClientId::new("alice");

    let (event, mut events) = store
        .dispatch(&id, &alice, edit(&alice, TextOperation::insert_at(1, 1, "B").unwrap(), 0))
        .unwrap();
    assert!(matches!(event, AssetEvent::TextEdited { revision: RevisionId(1), .. }));
    {
        let doc = doc.lock();
        assert_eq!(doc.draft(), "AB");
        assert_eq!(doc.text(), "A");
        assert!(doc.has_draft());
    }

    let (_, published) = store
        .dispatch(&id, &alice, AssetCommand::ApplyDraftChanges)
        .unwrap();
    events.extend(published);
    let snapshot = store.snapshot(&id).unwrap();
    assert_eq!(snapshot.text, "AB");
    assert_eq!(snapshot.draft, "AB");
    assert_eq!(snapshot.revision, RevisionId(1));

    assert_eq!(
        events,
        vec![
            DocumentEvent::Changed { revision: RevisionId(1) },
            DocumentEvent::DraftOpened,
            DocumentEvent::DraftCleared,
            DocumentEvent::Changed { revision: RevisionId(1) },
        ]
    );
    // Already handed out; nothing left queued on the document.
    assert!(doc.lock().take_events().is_empty());
}

#[test]
fn test_concurrent_inserts_converge() {
    let store = DocumentStore::default();
    let id = DocumentId::from_string("concurrent");
    store.create(id.clone(), "AB").unwrap();

    let c1 = ClientId::new("c1");
    let c2 = ClientId::new("c2");

    let (first, _) = store
        .dispatch(&id, &c1, edit(&c1, TextOperation::insert_at(2, 0, "X").unwrap(), 0))
        .unwrap();
    let (second, _) = store
        .dispatch(&id, &c2, edit(&c2, TextOperation::insert_at(2, 2, "Y").unwrap(), 0))
        .unwrap();

    // Each client applies its own op locally, then the broadcasts in order.
    let (op1, rev1) = first.edit().unwrap().unwrap();
    let (op2, rev2) = second.edit().unwrap().unwrap();
    assert_eq!((rev1, rev2), (RevisionId(1), RevisionId(2)));

    let server = op2.apply(&op1.apply("AB").unwrap()).unwrap();
    assert_eq!(server, "XABY");
    assert_eq!(store.snapshot(&id).unwrap().draft, "XABY");
}

#[test]
fn test_deleting_the_same_text_twice() {
    let store = DocumentStore::default();
    let id = DocumentId::from_string("double-delete");
    store.create(id.clone(), "abc").unwrap();

    let c1 = ClientId::new("c1");
    let c2 = ClientId::new("c2");
    store
        .dispatch(&id, &c1, edit(&c1, TextOperation::delete_at(3, 0, 3).unwrap(), 0))
        .unwrap();
    let (event, _) = store
        .dispatch(&id, &c2, edit(&c2, TextOperation::delete_at(3, 0, 3).unwrap(), 0))
        .unwrap();

    // The second delete rebases to nothing but is still a revision.
    let (op, revision) = event.edit().unwrap().unwrap();
    assert!(op.is_noop());
    assert_eq!(revision, RevisionId(2));
    assert_eq!(store.snapshot(&id).unwrap().draft, "");
}

#[test]
fn test_identity_is_checked_before_decoding() {
    let store = DocumentStore::default();
    let id = DocumentId::from_string("identity");
    store.create(id.clone(), "text").unwrap();

    let command = AssetCommand::EditText(EditText {
        operation: OperationData {
            user_id: ClientId::new("alice"),
            ops: Default::default(),
        },
        base_revision: RevisionId(0),
    });
    let err = store
        .dispatch(&id, &ClientId::new("mallory"), command)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Apply(ApplyError::IdentityMismatch { .. })
    ));
}

#[test]
fn test_compaction_bounds_rebasing() {
    let store = DocumentStore::default();
    let id = DocumentId::from_string("compacted");
    store.create(id.clone(), "").unwrap();

    let writer = ClientId::new("writer");
    for i in 0..4 {
        store
            .submit(
                &id,
                &writer,
                Submission::new(writer.clone(), TextOperation::insert_at(i, i, "x").unwrap(), RevisionId(i as u64)),
            )
            .unwrap();
    }
    assert_eq!(store.compact(&id, RevisionId(2)).unwrap(), 2);
    assert_eq!(store.compact(&id, RevisionId(2)).unwrap(), 0);

    // A base below the floor can no longer be rebased.
    let late = ClientId::new("late");
    let err = store
        .submit(
            &id,
            &late,
            Submission::new(late.clone(), TextOperation::insert_at(1, 0, "L").unwrap(), RevisionId(1)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Apply(ApplyError::Pruned { base: RevisionId(1), oldest: RevisionId(2) })
    ));
    assert_eq!(store.snapshot(&id).unwrap().revision, RevisionId(4));

    // The floor itself is still a valid base.
    let (accepted, _) = store
        .submit(
            &id,
            &late,
            Submission::new(late.clone(), TextOperation::insert_at(2, 0, "L").unwrap(), RevisionId(2)),
        )
        .unwrap();
    assert_eq!(accepted.revision, RevisionId(5));
    assert_eq!(store.snapshot(&id).unwrap().draft, "Lxxxx");
}

#[test]
fn test_parallel_submissions_on_one_document() {
    let store = Arc::new(DocumentStore::default());
    let id = DocumentId::from_string("shared");
    store.create(id.clone(), "").unwrap();

    let clients = 8;
    let edits_per_client = 25;

    let handles: Vec<_> = (0..clients)
        .map(|c| {
            let store = store.clone();
            let id = id.clone();
            thread::spawn(move || {
                let client = ClientId::new(format!("client-{}", c));
                let mut revisions = Vec::new();
                for _ in 0..edits_per_client {
                    // Always based on the empty initial draft; the store rebases.
                    let op = TextOperation::insert_at(0, 0, &c.to_string()).unwrap();
                    let (accepted, _) = store
                        .submit(&id, &client, Submission::new(client.clone(), op, RevisionId(0)))
                        .unwrap();
                    revisions.push(accepted.revision);
                }
                revisions
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for revision in handle.join().unwrap() {
            assert!(seen.insert(revision), "revision {} assigned twice", revision);
        }
    }

    let total = (clients * edits_per_client) as u64;
    assert_eq!(seen.len() as u64, total);
    assert!(seen.iter().all(|r| (1..=total).contains(&r.value())));

    let snapshot = store.snapshot(&id).unwrap();
    assert_eq!(snapshot.revision, RevisionId(total));
    assert_eq!(snapshot.draft.chars().count() as u64, total);
    for c in 0..clients {
        let digit = char::from_digit(c as u32, 10).unwrap();
        assert_eq!(
            snapshot.draft.chars().filter(|&ch| ch == digit).count(),
            edits_per_client
        );
    }
}

#[test]
fn test_documents_are_independent() {
    let store = Arc::new(DocumentStore::default());
    let ids: Vec<_> = (0..4)
        .map(|i| DocumentId::from_string(format!("doc-{}", i)))
        .collect();
    for id in &ids {
        store.create(id.clone(), "").unwrap();
    }

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let store = store.clone();
            thread::spawn(move || {
                let client = ClientId::new("writer");
                for i in 0..50u64 {
                    let op = TextOperation::insert_at(i as usize, i as usize, "x").unwrap();
                    store
                        .submit(&id, &client, Submission::new(client.clone(), op, RevisionId(i)))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in &ids {
        let snapshot = store.snapshot(id).unwrap();
        assert_eq!(snapshot.revision, RevisionId(50));
        assert_eq!(snapshot.draft, "x".repeat(50));
    }
}

#[test]
fn test_filesystem_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfigBuilder::new().file_extension("tex").build();
    let store = DocumentStore::new(config);
    let persistence = store.persistence_in(dir.path());
    assert_eq!(persistence.document_path(), dir.path().join("document.tex"));
    std::fs::write(persistence.document_path(), "line one\r\nline two").unwrap();

    let id = DocumentId::from_string("paper");
    let doc = store.open(id.clone(), &persistence).unwrap();
    assert_eq!(doc.lock().text(), "line one\nline two");
    assert!(!doc.lock().has_draft());

    let alice = ClientId::new("alice");
    let len = doc.lock().draft().chars().count();
    store
        .dispatch(&id, &alice, edit(&alice, TextOperation::insert_at(len, len, "!").unwrap(), 0))
        .unwrap();
    store.save(&id, &persistence).unwrap();

    assert_eq!(
        std::fs::read_to_string(persistence.draft_path()).unwrap(),
        "line one\nline two!"
    );

    store.publish(&id).unwrap();
    store.save(&id, &persistence).unwrap();
    assert!(!persistence.draft_path().exists());
    assert_eq!(
        std::fs::read_to_string(persistence.document_path()).unwrap(),
        "line one\nline two!"
    );
}
