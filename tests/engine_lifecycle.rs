use flatdb::config::EngineConfig;
use flatdb::executor::ExecutionEngine;
use flatdb::sql::{Command, DeleteCommand, InsertCommand, Predicate, SelectCommand, SelectItem};
use flatdb::{Error, ErrorKind};

const SCHEMA: &str = r#"{
    "name": "library",
    "tuples_limit": 2,
    "structure": {
        "books": ["title", "author", "shelf"],
        "members": ["name", "city"]
    },
    "primary_key": true
}"#;

fn open_engine(dir: &std::path::Path) -> ExecutionEngine {
    let schema_path = dir.join("library.json");
    std::fs::write(&schema_path, SCHEMA).unwrap();

    let config = EngineConfig::new()
        .schema_path(schema_path)
        .data_dir(dir.join("data"));
    ExecutionEngine::from_config(&config).unwrap()
}

fn rows(engine: &ExecutionEngine, sql: &str) -> Vec<Vec<String>> {
    engine
        .execute_sql(sql)
        .unwrap()
        .rows
        .into_iter()
        .map(|r| r.into_fields())
        .collect()
}

#[test]
fn test_engine_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path());
    let books_dir = dir.path().join("data").join("library").join("books");

    // Bootstrap layout
    assert!(books_dir.join("1.csv").exists());
    assert!(books_dir.join("books_Lock").exists());
    assert!(books_dir.join("books_pk_sequence").exists());

    for (title, author, shelf) in [
        ("Dune", "Herbert", "A"),
        ("Emma", "Austen", "B"),
        ("Ulysses, Annotated", "Joyce", "A"),
    ] {
        let result = engine
            .execute_sql(&format!(
                "INSERT INTO books VALUES ('{}', '{}', '{}');",
                title, author, shelf
            ))
            .unwrap();
        assert!(result.primary_key.is_some());
    }

    // Third row rolled over into segment 2
    assert!(books_dir.join("2.csv").exists());
    let segment_two = std::fs::read_to_string(books_dir.join("2.csv")).unwrap();
    assert_eq!(
        segment_two,
        "books_pk,title,author,shelf\n3,\"Ulysses, Annotated\",Joyce,A\n"
    );

    assert_eq!(
        rows(&engine, "SELECT title FROM books WHERE shelf = 'A'"),
        vec![vec!["Dune"], vec!["Ulysses, Annotated"]]
    );

    engine
        .execute_sql("DELETE FROM books WHERE author = 'Herbert' OR author = 'Austen'")
        .unwrap();
    assert_eq!(
        rows(&engine, "SELECT books_pk, title FROM books"),
        vec![vec!["3", "Ulysses, Annotated"]]
    );

    // Keys keep increasing after deletes, and the emptied segment is refilled
    let result = engine
        .execute_sql("INSERT INTO books VALUES ('Middlemarch', 'Eliot', 'C')")
        .unwrap();
    assert_eq!(result.primary_key, Some(4));
    let segment_one = std::fs::read_to_string(books_dir.join("1.csv")).unwrap();
    assert_eq!(segment_one, "books_pk,title,author,shelf\n4,Middlemarch,Eliot,C\n");
}

#[test]
fn test_typed_commands() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path());

    engine
        .execute(Command::Insert(InsertCommand {
            table_name: "members".to_string(),
            values: vec!["Ada".to_string(), "London".to_string()],
        }))
        .unwrap();
    engine
        .execute(Command::Insert(InsertCommand {
            table_name: "members".to_string(),
            values: vec!["Grace".to_string(), "New York".to_string()],
        }))
        .unwrap();

    let result = engine
        .execute(Command::Select(SelectCommand {
            columns: vec![SelectItem::Wildcard],
            tables: vec!["members".to_string()],
            predicate: Some(Predicate::equals("city", "'New York'")),
        }))
        .unwrap();
    assert_eq!(result.columns, vec!["name", "city"]);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].fields(), ["Grace", "New York"]);

    engine
        .execute(Command::Delete(DeleteCommand {
            table_name: "members".to_string(),
            predicate: Predicate::equals("members.name", "Ada"),
        }))
        .unwrap();
    assert_eq!(rows(&engine, "SELECT name FROM members"), vec![vec!["Grace"]]);
}

#[test]
fn test_errors_leave_data_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path());
    engine
        .execute_sql("INSERT INTO members VALUES (Ada, London)")
        .unwrap();

    let members_dir = dir.path().join("data").join("library").join("members");
    let before = std::fs::read_to_string(members_dir.join("1.csv")).unwrap();

    let err = engine
        .execute_sql("INSERT INTO members VALUES (Bob)")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaViolation);

    let err = engine
        .execute_sql("DELETE FROM members WHERE age = 3")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaViolation);

    let err = engine.execute_sql("DROP TABLE members").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PredicateSyntax);

    assert!(matches!(
        engine.execute_sql("SELECT * FROM visitors"),
        Err(Error::TableNotFound(_))
    ));

    assert_eq!(
        std::fs::read_to_string(members_dir.join("1.csv")).unwrap(),
        before
    );
}

#[test]
fn test_invalid_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("bad.json");
    std::fs::write(&schema_path, r#"{"name": "x", "tuples_limit": 0, "structure": {"t": ["a"]}}"#)
        .unwrap();

    let config = EngineConfig::new()
        .schema_path(&schema_path)
        .data_dir(dir.path());
    let err = ExecutionEngine::from_config(&config).err().unwrap();
    assert!(err.is_schema_violation());
    assert!(!dir.path().join("x").exists());
}
