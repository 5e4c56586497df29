//! End-to-end tests: parse a search string, fold it into builders, and
//! check the rendered SQL together with the bind list.

use std::sync::Arc;

use chrono::NaiveDate;
use steward_search::builder::{DeleteBuilder, Filterable, QueryBuilder, UpdateBuilder};
use steward_search::context::{Dialect, OrgId, QueryContext};
use steward_search::schema::{EntitySchema, FieldType};
use steward_search::search::SearchParser;
use steward_search::transform::FieldTransformer;
use steward_search::value::SqlValue;

fn person_schema() -> EntitySchema {
    EntitySchema::new("person", "name")
        .with_field("name", FieldType::Text)
        .with_field("male", FieldType::Boolean)
        .with_field("age", FieldType::Number)
        .with_field("date", FieldType::Date)
        .with_field("status", FieldType::Enum)
        .with_field("keywords", FieldType::List)
}

fn pg() -> QueryContext {
    QueryContext::single_tenant(Dialect::Postgres)
}

#[test]
fn search_folds_into_select() {
    let parser = SearchParser::new(person_schema());
    let search = parser.parse("name:foo AND male:true").unwrap();

    let mut query = QueryBuilder::new(pg())
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT id FROM people WHERE (name ILIKE ? AND male = ?)"
    );
    assert_eq!(
        query.bind_values(),
        vec![SqlValue::Text("%foo%".to_string()), SqlValue::Bool(true)]
    );
}

#[test]
fn grouped_search_keeps_value_order() {
    let parser = SearchParser::new(person_schema());
    let search = parser
        .parse("(name:foo OR male:true) AND date:1990-01-01")
        .unwrap();

    let mut query = QueryBuilder::new(pg())
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap()
        .limit(5)
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT id FROM people WHERE \
         ((name ILIKE ? OR male = ?) AND (date >= ? AND date <= ?)) LIMIT ?"
    );
    assert_eq!(
        query.bind_values(),
        vec![
            SqlValue::Text("%foo%".to_string()),
            SqlValue::Bool(true),
            SqlValue::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
            SqlValue::Date(NaiveDate::from_ymd_opt(1990, 1, 2).unwrap()),
            SqlValue::BigInt(5),
        ]
    );
}

#[test]
fn search_str_uses_attached_parser() {
    let parser = Arc::new(SearchParser::with_transformer(
        person_schema(),
        FieldTransformer::new().with_column("name", "full_name"),
    ));

    let mut query = QueryBuilder::new(pg())
        .with_parser(parser)
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search_str("name:smith")
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT id FROM people WHERE full_name ILIKE ?"
    );
}

#[test]
fn ansi_dialect_renders_like() {
    let parser = SearchParser::new(person_schema());
    let search = parser.parse("name:foo").unwrap();

    let mut query = QueryBuilder::new(QueryContext::single_tenant(Dialect::Ansi))
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap();

    assert_eq!(query.sql().unwrap(), "SELECT id FROM people WHERE name LIKE ?");
}

#[test]
fn search_and_tenancy_compose_with_paging() {
    let parser = SearchParser::new(person_schema());
    let search = parser.parse("status:active keywords:red|green").unwrap();
    let ctx = QueryContext::for_org(Dialect::Postgres, OrgId::new(42));

    let mut query = QueryBuilder::new(ctx)
        .select(&["id", "name"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap()
        .in_org()
        .unwrap()
        .page("name desc", 100, 25)
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT id, name FROM people WHERE \
         (status = ? AND (? = any(keywords) OR ? = any(keywords))) AND org_id=? \
         ORDER BY name desc LIMIT ? OFFSET ?"
    );
    assert_eq!(
        query.bind_values(),
        vec![
            SqlValue::Text("ACTIVE".to_string()),
            SqlValue::Text("red".to_string()),
            SqlValue::Text("green".to_string()),
            SqlValue::Int(42),
            SqlValue::BigInt(25),
            SqlValue::BigInt(100),
        ]
    );
}

#[test]
fn search_folds_into_update_and_delete() {
    let parser = SearchParser::new(person_schema());

    let search = parser.parse("male:true").unwrap();
    let mut update = UpdateBuilder::new(pg())
        .update("people")
        .unwrap()
        .value("reviewed", true)
        .unwrap()
        .search(&search)
        .unwrap();
    assert_eq!(
        update.sql().unwrap(),
        "UPDATE people SET reviewed=? WHERE male = ?"
    );
    assert_eq!(update.bind_values().len(), 2);

    let search = parser.parse("age:[90 TO *]").unwrap();
    let mut delete = DeleteBuilder::new(pg())
        .from("people")
        .unwrap()
        .search(&search)
        .unwrap();
    assert_eq!(delete.sql().unwrap(), "DELETE FROM people WHERE age >= ?");
    assert_eq!(delete.bind_values().len(), 1);
}

#[test]
fn subselect_inside_search_filtered_query() {
    let parser = SearchParser::new(person_schema());
    let search = parser.parse("name:smith").unwrap();

    let recent = QueryBuilder::new(pg())
        .select(&["person_id"])
        .unwrap()
        .from(&["sessions"])
        .unwrap()
        .with("kind", "web")
        .unwrap();

    let mut query = QueryBuilder::new(pg())
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap()
        .where_id_in("id", recent)
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT id FROM people WHERE name ILIKE ? AND id IN \
         (SELECT person_id FROM sessions WHERE kind=?)"
    );
    assert_eq!(
        query.bind_values(),
        vec![
            SqlValue::Text("%smith%".to_string()),
            SqlValue::Text("web".to_string()),
        ]
    );
}

#[test]
fn malformed_searches_never_reach_builders() {
    let parser = SearchParser::new(person_schema());
    assert!(parser.parse("name:\"unterminated").is_err());
    assert!(parser.parse("date:[1990-01-01 TO 2000-01-01").is_err());
    assert!(parser.parse("date:[[1990-01-01 TO 2000-01-01]").is_err());
    assert!(parser.parse("unknown_field:x").is_err());
}

#[cfg(feature = "postgres")]
#[test]
fn postgres_numbering_matches_bind_count() {
    use steward_search::postgres;

    let parser = SearchParser::new(person_schema());
    let search = parser.parse("name:foo male:true").unwrap();
    let mut query = QueryBuilder::new(pg())
        .select(&["id"])
        .unwrap()
        .from(&["people"])
        .unwrap()
        .search(&search)
        .unwrap()
        .limit(10)
        .unwrap();

    let sql = postgres::numbered(&query.sql().unwrap());
    assert_eq!(
        sql,
        "SELECT id FROM people WHERE (name ILIKE $1 AND male = $2) LIMIT $3"
    );
    let values = query.bind_values();
    assert_eq!(postgres::args(&values).len(), 3);
}
