mod common;

use common::{load_theme, seed_theme};
use themereview_core::db::open_db_in_memory;
use themereview_core::{
    Book, DocId, DocumentThemeRepository, Filter, ServiceError, SqliteDocumentStore, Theme,
    ThemeService,
};

#[test]
fn merge_appends_book_genres_to_matched_theme() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "classics");
    let service = ThemeService::new(DocumentThemeRepository::new(&store));

    let book = Book::new("Dune", ["sci-fi", "desert"]);
    let matched = service
        .add_genres_to_theme(&book, &Filter::id(theme_id))
        .unwrap();

    assert_eq!(matched, 1);
    assert_eq!(load_theme(&store, theme_id).genres, vec!["sci-fi", "desert"]);
}

#[test]
fn repeated_merge_accumulates_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let theme_id = seed_theme(&store, "classics");
    let service = ThemeService::new(DocumentThemeRepository::new(&store));
    let book = Book::new("Emma", ["romance"]);

    service
        .add_genres_to_theme(&book, &Filter::id(theme_id))
        .unwrap();
    service
        .add_genres_to_theme(&book, &Filter::id(theme_id))
        .unwrap();

    assert_eq!(
        load_theme(&store, theme_id).genres,
        vec!["romance", "romance"]
    );
}

#[test]
fn merge_by_field_filter_and_no_match_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = ThemeService::new(DocumentThemeRepository::new(&store));
    let theme_id = service.create_theme(Theme::new("gothic")).unwrap();
    let book = Book::new("Dracula", ["horror"]);

    assert_eq!(
        service
            .add_genres_to_theme(&book, &Filter::field_eq("name", "gothic"))
            .unwrap(),
        1
    );
    assert_eq!(
        service
            .add_genres_to_theme(&book, &Filter::field_eq("name", "absent"))
            .unwrap(),
        0
    );
    assert_eq!(
        service
            .add_genres_to_theme(&book, &Filter::id(DocId::generate()))
            .unwrap(),
        0
    );

    let theme = service.get_theme(&theme_id.to_string()).unwrap();
    assert_eq!(theme.genres, vec!["horror"]);
}

#[test]
fn create_theme_derives_rating_and_get_validates_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = ThemeService::new(DocumentThemeRepository::new(&store));

    let mut theme = Theme::new("imported");
    theme.reviews.push(themereview_core::Review::new("u1", "x", 2, "a"));
    theme.reviews.push(themereview_core::Review::new("u2", "x", 5, "b"));
    theme.rating = 1.0;
    let id = service.create_theme(theme).unwrap();

    assert_eq!(service.get_theme(&id.to_string()).unwrap().rating, 3.5);
    assert!(matches!(
        service.get_theme("12").unwrap_err(),
        ServiceError::BadRequest(_)
    ));
    assert!(matches!(
        service
            .get_theme(&DocId::generate().to_string())
            .unwrap_err(),
        ServiceError::NotFound { kind: "theme", .. }
    ));
}
