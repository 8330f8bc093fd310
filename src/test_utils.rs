/// # Test Utilities Module
///
/// Database fixtures shared by the unit tests: an isolated in-memory database
/// holding the `tb_usuarios` table, optionally seeded with sample users.

use crate::config::DatabaseConfig;
use crate::core::db::QueryExecutor;
use crate::core::Result;
use rusqlite::named_params;

pub const USERS_TABLE_SQL: &str = "
    CREATE TABLE tb_usuarios (
        idusuario INTEGER PRIMARY KEY AUTOINCREMENT,
        deslogin TEXT,
        dessenha TEXT,
        dtcadastro TEXT DEFAULT CURRENT_TIMESTAMP
    );
";

/// Isolated database test fixture
pub struct UserFixture {
    pub executor: QueryExecutor,
}

impl UserFixture {
    /// Create a new in-memory database with an empty `tb_usuarios` table
    pub fn new() -> Result<Self> {
        let executor = QueryExecutor::connect(&DatabaseConfig::in_memory())?;
        executor.execute(USERS_TABLE_SQL, &[])?;
        Ok(UserFixture { executor })
    }

    /// Create fixture seeded with alice (1), bob (2) and carol (3, NULL hash and timestamp)
    pub fn with_sample_users() -> Result<Self> {
        let fixture = Self::new()?;
        fixture.insert(1, Some("alice"), Some("hash123"), Some("2024-01-01 10:00:00"))?;
        fixture.insert(2, Some("bob"), Some("hash456"), Some("2023-06-15 08:30:00"))?;
        fixture.insert(3, Some("carol"), None, None)?;
        Ok(fixture)
    }

    /// Insert one row verbatim, bypassing the entity
    pub fn insert(
        &self,
        id: i64,
        login: Option<&str>,
        hash: Option<&str>,
        registered_at: Option<&str>,
    ) -> Result<()> {
        self.executor.execute(
            "INSERT INTO tb_usuarios (idusuario, deslogin, dessenha, dtcadastro)
             VALUES (:ID, :LOGIN, :HASH, :TS)",
            named_params! {
                ":ID": id,
                ":LOGIN": login,
                ":HASH": hash,
                ":TS": registered_at,
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    #[test]
    fn test_sample_users_fixture() {
        let fixture = UserFixture::with_sample_users().unwrap();
        let rows = fixture
            .executor
            .select_all("SELECT idusuario FROM tb_usuarios ORDER BY idusuario", &[])
            .unwrap();
        let ids: Vec<&Value> = rows.iter().filter_map(|r| r.get("idusuario")).collect();
        assert_eq!(ids, vec![&Value::Integer(1), &Value::Integer(2), &Value::Integer(3)]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let fixture = UserFixture::with_sample_users().unwrap();
        assert!(fixture.insert(1, Some("again"), None, None).is_err());
    }
}
