//! Shared fixture for tests against a live MySQL instance.
//!
//! Configure with:
//!   CONTENT_STORE_SOCKET=/run/mysqld/mysqld.sock
//!   CONTENT_STORE_USER=test CONTENT_STORE_PASSWORD=test CONTENT_STORE_DATABASE=test
//!
//! Every fixture creates its own tables (suffixed with a fresh uuid) and
//! drops them on teardown, so tests may run in parallel.

#![allow(dead_code)]

use store::{CrudEngine, Driver, StoreConfig, TablePair};

pub fn config_from_env() -> StoreConfig {
    let var = |name: &str| std::env::var(name).unwrap_or_else(|_| panic!("{name} required"));
    StoreConfig::new(
        var("CONTENT_STORE_SOCKET"),
        var("CONTENT_STORE_USER"),
        std::env::var("CONTENT_STORE_PASSWORD").unwrap_or_default(),
        var("CONTENT_STORE_DATABASE"),
    )
}

pub struct Fixture {
    pub driver: Driver,
    pub engine: CrudEngine,
    pub pages: TablePair,
    pub pastes: TablePair,
    pub hashes: String,
}

impl Fixture {
    pub async fn setup() -> Self {
        let driver = Driver::init(&config_from_env()).await.expect("store init failed");
        let engine = driver.engine();
        let suffix = uuid::Uuid::new_v4().simple().to_string();

        let pages = TablePair::new(format!("pages_{suffix}"), format!("page_contents_{suffix}"))
            .unwrap();
        let pastes =
            TablePair::new(format!("pastes_{suffix}"), format!("paste_contents_{suffix}"))
                .unwrap();
        let hashes = format!("page_hashes_{suffix}");

        let ddl = [
            format!(
                "CREATE TABLE `pages_{suffix}` (
                    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                    title VARCHAR(255) NOT NULL,
                    subtitle VARCHAR(255) NOT NULL,
                    tag VARCHAR(64) NOT NULL,
                    content_id BIGINT UNSIGNED NOT NULL UNIQUE
                )"
            ),
            format!(
                "CREATE TABLE `page_contents_{suffix}` (
                    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                    created DATETIME(6) NOT NULL,
                    updated DATETIME(6) NOT NULL,
                    body LONGTEXT NOT NULL
                )"
            ),
            format!(
                "CREATE TABLE `pastes_{suffix}` (
                    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                    filename VARCHAR(255) NOT NULL,
                    filetype VARCHAR(64) NOT NULL,
                    content_id BIGINT UNSIGNED NOT NULL UNIQUE
                )"
            ),
            format!(
                "CREATE TABLE `paste_contents_{suffix}` (
                    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                    created DATETIME(6) NOT NULL,
                    updated DATETIME(6) NOT NULL,
                    body LONGBLOB NOT NULL
                )"
            ),
            format!(
                "CREATE TABLE `page_hashes_{suffix}` (
                    url_hash BINARY(16) PRIMARY KEY,
                    content_id BIGINT UNSIGNED NOT NULL
                )"
            ),
        ];
        for stmt in &ddl {
            sqlx::query(stmt)
                .execute(engine.pool())
                .await
                .expect("create table failed");
        }

        Self { driver, engine, pages, pastes, hashes }
    }

    pub async fn teardown(self) {
        use store::Tables;
        let names = [
            self.pages.record_table().to_string(),
            self.pages.content_table().to_string(),
            self.pastes.record_table().to_string(),
            self.pastes.content_table().to_string(),
            self.hashes.clone(),
        ];
        for name in names {
            sqlx::query(&format!("DROP TABLE IF EXISTS `{name}`"))
                .execute(self.engine.pool())
                .await
                .expect("drop table failed");
        }
        self.driver.stop().await;
    }
}
