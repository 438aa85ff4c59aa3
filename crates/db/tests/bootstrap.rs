use sqlx::PgPool;

/// Connect, migrate, verify the schema and seed data.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    marquee_db::health_check(&pool).await.unwrap();

    for table in ["movies", "users", "tokens", "permissions", "users_permissions"] {
        sqlx::query(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
    }

    let codes: Vec<String> = sqlx::query_scalar("SELECT code FROM permissions ORDER BY code")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(codes, vec!["movies:read", "movies:write"]);
}

/// Check constraints back up the application-level validation.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_movie_check_constraints(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO movies (title, year, runtime, genres) VALUES ('Bad', 2000, -5, '{drama}')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "negative runtime should be rejected");

    let result = sqlx::query(
        "INSERT INTO movies (title, year, runtime, genres) VALUES ('Bad', 2000, 90, '{a,b,c,d,e,f}')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "six genres should be rejected");

    let result = sqlx::query(
        "INSERT INTO movies (title, year, runtime, genres) VALUES ('Bad', 2000, 90, '{}')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "an empty genre list should be rejected");
}
