mod common;

use common::{load_theme, maintainer, seed_theme, ProbeStore};
use themereview_core::db::open_db_in_memory;
use themereview_core::{
    DocId, DocumentReviewRepository, LeaveReviewError, LeaveReviewOutcome, OrphanReviewPolicy,
    ReviewService, ServiceError, SqliteDocumentStore,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn out_of_range_rating_is_rejected_without_any_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "noir");
    let probe = ProbeStore::new(&store);
    let maintainer = maintainer(&probe);

    for rating in [0, 6, 100, -5] {
        let err = maintainer
            .leave_review("u1", &theme_id.to_string(), rating, "x")
            .unwrap_err();
        assert!(matches!(
            err,
            LeaveReviewError::Rejected(ServiceError::Range(_))
        ));
    }

    assert_eq!(probe.mutations(), 0);
    let theme = load_theme(&store, theme_id);
    assert!(theme.reviews.is_empty());
    assert_eq!(theme.rating, 0.0);
}

#[test]
fn malformed_theme_id_is_rejected_without_any_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let probe = ProbeStore::new(&store);

    let err = maintainer(&probe)
        .leave_review("u1", "not-an-object-id", 3, "x")
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveReviewError::Rejected(ServiceError::BadRequest(_))
    ));
    assert_eq!(probe.mutations(), 0);
}

#[test]
fn sequential_reviews_keep_mean_and_count() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "epic fantasy");
    let maintainer = maintainer(&store);

    let ratings = [5, 3, 4, 1, 2, 5, 5];
    for (index, rating) in ratings.iter().enumerate() {
        let outcome = maintainer
            .leave_review(&format!("u{index}"), &theme_id.to_string(), *rating, "x")
            .unwrap();
        let seen = &ratings[..=index];
        let expected = seen.iter().sum::<i32>() as f64 / seen.len() as f64;
        match outcome {
            LeaveReviewOutcome::Committed { theme_rating, .. } => {
                assert_close(theme_rating, expected)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews.len(), ratings.len());
    assert_close(theme.rating, 25.0 / 7.0);
    assert_close(theme.rating, theme.embedded_mean());

    let standalone = ReviewService::new(DocumentReviewRepository::new(&store))
        .list_reviews()
        .unwrap();
    assert_eq!(standalone.len(), ratings.len());
}

#[test]
fn embedded_snapshots_do_not_follow_standalone_edits() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "cozy mystery");
    let maintainer = maintainer(&store);
    let reviews = ReviewService::new(DocumentReviewRepository::new(&store));
    let theme_key = theme_id.to_string();

    maintainer.leave_review("u1", &theme_key, 4, "good").unwrap();
    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews.len(), 1);
    assert_close(theme.rating, 4.0);

    let second = maintainer.leave_review("u2", &theme_key, 2, "meh").unwrap();
    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews.len(), 2);
    assert_close(theme.rating, 3.0);

    let second_id = second.review().id.to_string();
    reviews.update_review(&second_id, 5, "actually great").unwrap();
    assert_eq!(reviews.get_review(&second_id).unwrap().rating, 5);

    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews[1].rating, 2);
    assert_eq!(theme.reviews[1].comment, "meh");
    assert_close(theme.rating, 3.0);

    reviews.delete_review(&second_id).unwrap();
    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews.len(), 2);
    assert_close(theme.rating, 3.0);
}

#[test]
fn embedded_snapshot_matches_standalone_record_at_creation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "horror");

    let outcome = maintainer(&store)
        .leave_review("u9", &theme_id.to_string(), 5, "chilling")
        .unwrap();

    let standalone = ReviewService::new(DocumentReviewRepository::new(&store))
        .get_review(&outcome.review().id.to_string())
        .unwrap();
    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews, vec![standalone.clone()]);
    assert_eq!(&standalone, outcome.review());
    assert_eq!(standalone.theme_id, theme_id.to_string());
}

#[test]
fn missing_theme_still_persists_standalone_review_by_default() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let ghost = DocId::generate().to_string();

    let outcome = maintainer(&store)
        .leave_review("u1", &ghost, 4, "orphan")
        .unwrap();

    let review = match outcome {
        LeaveReviewOutcome::ThemeMissing { review } => review,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let stored = ReviewService::new(DocumentReviewRepository::new(&store))
        .get_review(&review.id.to_string())
        .unwrap();
    assert_eq!(stored.theme_id, ghost);
    assert_eq!(stored.rating, 4);
}

#[test]
fn missing_theme_writes_nothing_under_reject_policy() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let maintainer = maintainer(&store).with_orphan_policy(OrphanReviewPolicy::Reject);

    let err = maintainer
        .leave_review("u1", &DocId::generate().to_string(), 4, "orphan")
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveReviewError::Rejected(ServiceError::NotFound { kind: "theme", .. })
    ));
    assert!(ReviewService::new(DocumentReviewRepository::new(&store))
        .list_reviews()
        .unwrap()
        .is_empty());
}

#[test]
fn resync_recomputes_from_embedded_list() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "thriller");
    let maintainer = maintainer(&store);
    let key = theme_id.to_string();

    maintainer.leave_review("u1", &key, 1, "x").unwrap();
    maintainer.leave_review("u2", &key, 4, "y").unwrap();

    conn.execute(
        "UPDATE documents
         SET body = json_set(body, '$.rating', 0.0)
         WHERE collection = 'ThemeCollection';",
        [],
    )
    .unwrap();
    assert_eq!(load_theme(&store, theme_id).rating, 0.0);

    assert_close(maintainer.resync_theme_rating(&key).unwrap(), 2.5);
    assert_close(load_theme(&store, theme_id).rating, 2.5);

    assert!(matches!(
        maintainer
            .resync_theme_rating(&DocId::generate().to_string())
            .unwrap_err(),
        ServiceError::NotFound { kind: "theme", .. }
    ));
    assert!(matches!(
        maintainer.resync_theme_rating("bogus").unwrap_err(),
        ServiceError::BadRequest(_)
    ));
}

#[test]
fn alternate_theme_id_spellings_store_the_canonical_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "western");
    let canonical = theme_id.to_string();
    let maintainer = maintainer(&store);

    for spelling in [
        canonical.to_uppercase(),
        format!("urn:uuid:{canonical}"),
        format!("{{{canonical}}}"),
        canonical.replace('-', ""),
    ] {
        let outcome = maintainer.leave_review("u1", &spelling, 4, "x").unwrap();
        assert!(matches!(outcome, LeaveReviewOutcome::Committed { .. }));
        assert_eq!(outcome.review().theme_id, canonical);
    }

    let theme = load_theme(&store, theme_id);
    assert_eq!(theme.reviews.len(), 4);
    assert!(theme.reviews.iter().all(|review| review.theme_id == canonical));

    let standalone = ReviewService::new(DocumentReviewRepository::new(&store))
        .list_reviews()
        .unwrap();
    assert_eq!(standalone.len(), 4);
    assert!(standalone.iter().all(|review| review.theme_id == canonical));
}
