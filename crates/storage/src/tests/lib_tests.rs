use super::*;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/state.db"),
        "sqlite://./data/state.db"
    );
    assert_eq!(normalize_database_url("  "), DEFAULT_DATABASE_URL);
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn sqlite_path_ignores_memory_and_query_suffix() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/state.db?mode=rwc"),
        Some(PathBuf::from("./data/state.db"))
    );
}

#[test]
fn prepare_creates_parent_directory() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("state.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(prepared.starts_with("sqlite://"));
    assert!(temp_root.path().join("nested").exists());
}

#[tokio::test]
async fn no_persistence_forgets_everything() {
    let persistence = NoPersistence;
    persistence.save("q=shoes").await.expect("save");
    assert_eq!(persistence.load().await.expect("load"), "");
}

#[tokio::test]
async fn memory_persistence_records_saves() {
    let persistence = MemoryPersistence::with_state("q=boots");
    assert_eq!(persistence.load().await.expect("load"), "q=boots");

    let shared = persistence.clone();
    shared.save("q=shoes").await.expect("save");
    shared.save("").await.expect("save");

    assert_eq!(persistence.load().await.expect("load"), "");
    assert_eq!(persistence.saves().await, vec!["q=shoes".to_string(), String::new()]);
}

#[tokio::test]
async fn fragment_persistence_uses_url_fragment() {
    let persistence =
        FragmentPersistence::new("https://shop.example/search#fq=color%3Ared").expect("url");
    assert_eq!(persistence.load().await.expect("load"), "fq=color%3Ared");

    persistence
        .save("fq={!tag=c}color%3Ablue&q=shoes")
        .await
        .expect("save");
    let url = persistence.current_url().await;
    assert_eq!(url.path(), "/search");
    assert_eq!(
        persistence.load().await.expect("load"),
        "fq={!tag=c}color%3Ablue&q=shoes"
    );

    persistence.save("").await.expect("save");
    assert_eq!(persistence.current_url().await.fragment(), None);
    assert_eq!(persistence.load().await.expect("load"), "");
}

#[tokio::test]
async fn fragment_persistence_rejects_bad_url() {
    assert!(FragmentPersistence::new("not a url").is_err());
}

#[tokio::test]
async fn file_persistence_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let persistence = FilePersistence::new(dir.path().join("state").join("exposed.txt"));
    persistence.init().await.expect("init");

    assert_eq!(persistence.load().await.expect("missing file"), "");
    persistence.save("q=shoes&start=20").await.expect("save");
    assert_eq!(persistence.load().await.expect("load"), "q=shoes&start=20");
}

#[tokio::test]
async fn sqlite_persistence_upserts_per_session() {
    let persistence = SqlitePersistence::new("sqlite::memory:", "alice")
        .await
        .expect("db");
    persistence.init().await.expect("init");
    assert_eq!(persistence.load().await.expect("empty"), "");
    assert!(persistence.stored().await.expect("stored").is_none());

    persistence.save("q=shoes").await.expect("save");
    persistence.save("q=boots").await.expect("save again");

    let stored = persistence.stored().await.expect("stored").expect("row");
    assert_eq!(stored.session_key, "alice");
    assert_eq!(stored.exposed, "q=boots");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_state")
        .fetch_one(persistence.pool())
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sqlite_persistence_creates_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("state.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let persistence = SqlitePersistence::new(&database_url, "default")
        .await
        .expect("db");
    persistence.save("fq=a%3A1").await.expect("save");
    drop(persistence);

    assert!(db_path.exists(), "database file should exist: {}", db_path.display());

    let reopened = SqlitePersistence::new(&database_url, "default")
        .await
        .expect("reopen");
    assert_eq!(reopened.load().await.expect("load"), "fq=a%3A1");
}

#[tokio::test]
async fn open_persistence_falls_back_to_memory() {
    let blocker = tempfile::NamedTempFile::new().expect("tempfile");
    let database_url = format!(
        "sqlite://{}/state.db",
        blocker.path().to_string_lossy().replace('\\', "/")
    );

    let persistence = open_persistence(&database_url, "default").await;
    persistence.save("q=x").await.expect("save");
    assert_eq!(persistence.load().await.expect("load"), "q=x");
}
