//! End-to-end query compilation tests against an in-memory object store.

use std::sync::Arc;

use flowsql::{execute, row, rows_to_json, CompileError, QueryContext, QueryOutput, Row};
use flowsql_core::config::EngineConfig;
use flowsql_exec::Engine;
use flowsql_io::{MemoryStorage, ObjectStore};
use flowsql_planner::{
    BinaryOp, FromEx, JoinEx, OrderEx, OriginEx, ProjectionEx, Query, Statement, TermEx,
};

fn people_store() -> MemoryStorage {
    let mem = MemoryStorage::new();
    mem.insert("data/people.csv", "a,b\n1,x\n2,y\n").unwrap();
    mem.insert("data/parts/p0.jsonl", "{\"n\":3,\"tag\":\"c\"}\n{\"n\":1,\"tag\":\"a\"}\n")
        .unwrap();
    mem.insert("data/parts/p1.jsonl", "{\"n\":2,\"tag\":\"b\"}\n{\"n\":1,\"tag\":\"a\"}\n")
        .unwrap();
    mem
}

fn context(mem: &MemoryStorage) -> QueryContext {
    let engine = Engine::with_persist_store(EngineConfig::default(), Arc::new(mem.clone()));
    QueryContext::new(Arc::new(engine))
}

fn people() -> FromEx {
    FromEx::new(OriginEx::data_source("data/people.csv", "csv"))
}

fn parts() -> FromEx {
    FromEx::new(OriginEx::data_source("data/parts", "jsonl"))
}

async fn run(mem: &MemoryStorage, query: Query) -> Result<QueryOutput, CompileError> {
    let store: Arc<dyn ObjectStore> = Arc::new(mem.clone());
    execute(store, &Statement::Query(query), &context(mem)).await
}

fn array(output: QueryOutput) -> Vec<Row> {
    match output {
        QueryOutput::Array(rows) => rows,
        other => panic!("expected an array, got {other:?}"),
    }
}

#[tokio::test]
async fn test_project_single_column() {
    let mem = people_store();
    let q = Query::select_all(people()).with_projection(vec![ProjectionEx::column("a")]);
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(rows, vec![row! { "a" => 1i64 }, row! { "a" => 2i64 }]);
}

#[tokio::test]
async fn test_filter_then_star() {
    let mem = people_store();
    let q = Query::select_all(people()).with_filter(TermEx::binary(
        BinaryOp::Gt,
        TermEx::column("a"),
        TermEx::int(1),
    ));
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(rows, vec![row! { "a" => 2i64, "b" => "y" }]);
}

#[tokio::test]
async fn test_missing_origin_is_fatal() {
    let mem = people_store();
    let q = Query::select_all(FromEx::new(OriginEx::data_source("nowhere", "csv")));
    let err = run(&mem, q).await.unwrap_err();
    assert!(matches!(err, CompileError::SourceNotFound(_)));
    assert!(err.to_string().contains("no file or directory was found"));
}

#[tokio::test]
async fn test_missing_result_set_is_fatal() {
    let mem = people_store();
    let q = Query::select_all(FromEx::new(OriginEx::result_set("never-written")));
    let err = run(&mem, q).await.unwrap_err();
    assert!(matches!(err, CompileError::SourceNotFound(ref name) if name == "never-written"));
}

#[tokio::test]
async fn test_top_one_keeps_first_row() {
    let mem = people_store();
    let q = Query::select_all(people())
        .with_projection(vec![ProjectionEx::top(1, vec![ProjectionEx::star()])]);
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(rows, vec![row! { "a" => 1i64, "b" => "x" }]);
}

#[tokio::test]
async fn test_container_origin_reads_every_object() {
    let mem = people_store();
    let rows = array(run(&mem, Query::select_all(parts())).await.unwrap());
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn test_distinct_over_container() {
    let mem = people_store();
    let q = Query::select_all(parts())
        .with_projection(vec![ProjectionEx::distinct(vec![ProjectionEx::star()])]);
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(rows.len(), 3);
    for (i, r) in rows.iter().enumerate() {
        assert!(!rows[i + 1..].contains(r), "duplicate row {r:?}");
    }
}

#[tokio::test]
async fn test_order_by_applies_before_top() {
    let mem = people_store();
    let q = Query::select_all(parts())
        .with_order(vec![OrderEx::desc("n")])
        .with_projection(vec![ProjectionEx::top(2, vec![ProjectionEx::column("tag")])]);
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(rows, vec![row! { "tag" => "c" }, row! { "tag" => "b" }]);
}

#[tokio::test]
async fn test_order_by_is_stable_multi_key() {
    let mem = MemoryStorage::new();
    mem.insert(
        "t.csv",
        "id,grp,score\n1,b,5\n2,a,5\n3,b,7\n4,a,5\n5,a,9\n",
    )
    .unwrap();
    let q = Query::select_all(FromEx::new(OriginEx::data_source("t.csv", "csv")))
        .with_order(vec![OrderEx::asc("grp"), OrderEx::desc("score")])
        .with_projection(vec![ProjectionEx::column("id")]);
    let rows = array(run(&mem, q).await.unwrap());
    let ids: Vec<String> = rows.iter().map(|r| r.lookup("id").unwrap().to_string()).collect();
    assert_eq!(ids, vec!["5", "2", "4", "3", "1"]);
}

#[tokio::test]
async fn test_order_by_mixed_numeric_column_agrees_with_filter() {
    let mem = MemoryStorage::new();
    mem.insert("prices.csv", "id,price\n1,10\n2,2.5\n3,1\n").unwrap();
    let prices = || FromEx::new(OriginEx::data_source("prices.csv", "csv"));
    let ids = |rows: Vec<Row>| -> Vec<String> {
        rows.iter().map(|r| r.lookup("id").unwrap().to_string()).collect()
    };

    let ordered = Query::select_all(prices())
        .with_order(vec![OrderEx::asc("price")])
        .with_projection(vec![ProjectionEx::column("id")]);
    assert_eq!(ids(array(run(&mem, ordered).await.unwrap())), vec!["3", "2", "1"]);

    let cheap = Query::select_all(prices())
        .with_filter(TermEx::binary(
            BinaryOp::Lt,
            TermEx::column("price"),
            TermEx::int(5),
        ))
        .with_order(vec![OrderEx::desc("price")])
        .with_projection(vec![ProjectionEx::column("id")]);
    assert_eq!(ids(array(run(&mem, cheap).await.unwrap())), vec!["2", "3"]);
}

#[tokio::test]
async fn test_computed_projection_and_json_rendering() {
    let mem = people_store();
    let q = Query::select_all(people()).with_projection(vec![
        ProjectionEx::aliased(TermEx::call("upper", vec![TermEx::column("b")]), "B"),
        ProjectionEx::aliased(
            TermEx::binary(BinaryOp::Mul, TermEx::column("a"), TermEx::int(10)),
            "a10",
        ),
    ]);
    let rows = array(run(&mem, q).await.unwrap());
    assert_eq!(
        rows_to_json(&rows),
        serde_json::json!([{ "B": "X", "a10": 10 }, { "B": "Y", "a10": 20 }])
    );
}

#[tokio::test]
async fn test_missing_projected_column_aborts() {
    let mem = people_store();
    let q = Query::select_all(people()).with_projection(vec![ProjectionEx::column("zzz")]);
    let err = run(&mem, q).await.unwrap_err();
    assert!(err.to_string().contains("zzz"));
}

#[tokio::test]
async fn test_joins_and_group_by_are_rejected() {
    let mem = people_store();

    let mut with_join = Query::select_all(people());
    with_join.joins.push(JoinEx {
        from: parts(),
        on: TermEx::binary(BinaryOp::Eq, TermEx::column("a"), TermEx::column("n")),
    });
    assert!(matches!(
        run(&mem, with_join).await,
        Err(CompileError::Unsupported(_))
    ));

    let mut with_group = Query::select_all(people());
    with_group.group_by.push(TermEx::column("b"));
    assert!(matches!(
        run(&mem, with_group).await,
        Err(CompileError::Unsupported(_))
    ));
}

#[tokio::test]
async fn test_non_query_statement_is_rejected() {
    let mem = people_store();
    let store: Arc<dyn ObjectStore> = Arc::new(mem.clone());
    let err = execute(
        store,
        &Statement::Insert {
            table: "people".into(),
        },
        &context(&mem),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CompileError::Unsupported(_)));
}

#[tokio::test]
async fn test_unknown_extractor_fails() {
    let mem = people_store();
    let q = Query::select_all(FromEx::new(OriginEx::data_source("data/people.csv", "parquet")));
    let err = run(&mem, q).await.unwrap_err();
    assert!(err.to_string().contains("parquet"));
}
