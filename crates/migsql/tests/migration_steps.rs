//! End-to-end checks of a migration step built from the public API.

use migsql::ddl::STATEMENT_SEPARATOR;
use migsql::prelude::*;
use migsql::ArrayParamType;

#[test]
fn upsert_scenario() {
    let unit = generate(|p| p.upsert(fields! { "name" => "Alice", "age" => 30 })).unwrap();

    assert_eq!(unit.sql, "`name` = :p0,`age` = :p1");
    assert_eq!(unit.param("p0"), Some(&ParamValue::from("Alice")));
    assert_eq!(unit.param("p1"), Some(&ParamValue::from(30)));
    assert!(unit.types.is_empty());
}

#[test]
fn update_template_with_conditional_where() {
    let build = |apply_filter: bool| {
        generate(|p| {
            let set = p.upsert(fields! { "ACTIVE" => "N" })?;
            let filter = p.emit_if(apply_filter, |p| {
                Ok(format!(" WHERE {}", p.all_equal(fields! { "status" => "active" })?))
            })?;
            Ok(format!("UPDATE b_user SET {set}{filter}"))
        })
        .unwrap()
    };

    assert!(build(true).sql.ends_with("WHERE `status` = :p1"));
    assert!(!build(false).sql.contains("WHERE"));
}

#[test]
fn dynamic_table_scenario() {
    let sql = DynamicNameDdl::new(
        "CREATE TABLE",
        "b_iblock_?_prop",
        "SELECT ID FROM b_iblock WHERE CODE = 'catalog'",
    )
    .definition("(id INT)")
    .to_sql()
    .unwrap();

    let stmts: Vec<&str> = sql.split(STATEMENT_SEPARATOR).collect();
    assert_eq!(stmts.len(), 6);
    assert_eq!(stmts[0], "SET @SUBSTITUTION = 0");
    assert!(stmts[1].contains("@SUBSTITUTION := ID FROM b_iblock WHERE CODE = 'catalog'"));
    assert_eq!(
        stmts[2],
        "SET @DDL_STATEMENT = CONCAT('CREATE TABLE ', 'b_iblock_', @SUBSTITUTION, '_prop', '(id INT)')"
    );
    assert_eq!(stmts[3], "PREPARE dynamicDdl FROM @DDL_STATEMENT");
    assert_eq!(stmts[4], "EXECUTE dynamicDdl");
    assert_eq!(stmts[5], "DEALLOCATE PREPARE dynamicDdl");
}

#[test]
fn full_migration_step() {
    let mut m = Migration::new().with_description("Catalog properties");

    m.add_insert_sql(
        "b_iblock_property",
        fields! {
            "IBLOCK_ID" => BindValue::deferred(|p| {
                Ok(format!("SELECT ID FROM b_iblock WHERE CODE = {}", p.bind("catalog")?))
            }),
            "CODE" => "COLOR",
            "SORT" => 500,
        },
    )
    .unwrap();
    m.add_create_iblock_table_sql("b_iblock_element_prop_s?", "CODE = 'catalog'", "(IBLOCK_ELEMENT_ID INT NOT NULL)")
        .unwrap();
    m.add_delete_where_sql("b_option", "MODULE_ID = :module AND NAME IN (:names)", vec![
        ("module", ParamValue::from("catalog")),
        ("names", ParamValue::from(vec!["a", "b"])),
    ])
    .unwrap();
    m.add_option_update_sql("catalog", "default_quantity", 1, Some("s1"))
        .unwrap();
    m.add_drop_table_sql("b_catalog_old");

    assert_eq!(m.description(), Some("Catalog properties"));
    assert_eq!(m.len(), 5);

    let s = m.statements();
    assert_eq!(
        s[0].sql,
        "INSERT INTO b_iblock_property SET `IBLOCK_ID` = (SELECT ID FROM b_iblock WHERE CODE = :p0),`CODE` = :p1,`SORT` = :p2"
    );
    assert_eq!(s[0].params.len(), 3);
    assert!(s[1].sql.starts_with("SET @SUBSTITUTION = 0;\n"));
    assert!(s[1].params.is_empty());
    assert_eq!(s[2].types.get("names"), Some(&ArrayParamType::String));
    assert!(s[3].sql.ends_with("AND `SITE_ID` = :p3"));
    assert_eq!(s[4].sql, "DROP TABLE `b_catalog_old`");

    // Each statement got its own binder.
    assert_eq!(s[3].params[0].0, "p0");
}

#[test]
fn failed_step_leaves_queue_untouched() {
    let mut m = Migration::new();
    m.add_sql("SELECT 1");

    let err = m
        .add_generated_sql(|p| {
            let a = p.bind_named("x", 1)?;
            let b = p.bind_named("x", 2)?;
            Ok(format!("SELECT {a}, {b}"))
        })
        .unwrap_err();

    assert!(err.is_duplicate_parameter());
    assert_eq!(m.len(), 1);
}
