//! Technology scoping: which database products are in scope for a scan

use std::collections::HashSet;
use std::str::FromStr;

/// Database technologies recognised by the fingerprint catalog.
///
/// `Db` is the generic SQL database category and the parent of every other
/// variant. `MongoDb` and `CouchDb` are carried so that scope checks can
/// exclude them from SQL testing even when the whole database category is
/// selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tech {
    Db,
    MySql,
    MsSql,
    Oracle,
    Db2,
    PostgreSql,
    Sybase,
    Firebird,
    HypersonicSql,
    Sqlite,
    MongoDb,
    CouchDb,
}

impl Tech {
    pub fn parent(self) -> Option<Tech> {
        match self {
            Tech::Db => None,
            _ => Some(Tech::Db),
        }
    }

    /// SQL-capable technologies; the known no-sql stores are excluded.
    pub fn is_sql_db(self) -> bool {
        !matches!(self, Tech::Db | Tech::MongoDb | Tech::CouchDb)
    }
}

impl FromStr for Tech {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "db" | "generic" => Ok(Tech::Db),
            "mysql" => Ok(Tech::MySql),
            "mssql" | "sqlserver" => Ok(Tech::MsSql),
            "oracle" => Ok(Tech::Oracle),
            "db2" => Ok(Tech::Db2),
            "postgresql" | "postgres" => Ok(Tech::PostgreSql),
            "sybase" => Ok(Tech::Sybase),
            "firebird" => Ok(Tech::Firebird),
            "hypersonic" | "hsqldb" => Ok(Tech::HypersonicSql),
            "sqlite" => Ok(Tech::Sqlite),
            other => anyhow::bail!("unknown database technology: {other}"),
        }
    }
}

/// The set of technologies a scan is allowed to probe.
#[derive(Debug, Clone)]
pub struct TechSet {
    all: bool,
    include: HashSet<Tech>,
}

impl TechSet {
    /// Everything in scope. This is the default when no scope is configured.
    pub fn all() -> Self {
        Self {
            all: true,
            include: HashSet::new(),
        }
    }

    pub fn of(techs: impl IntoIterator<Item = Tech>) -> Self {
        Self {
            all: false,
            include: techs.into_iter().collect(),
        }
    }

    /// A technology is included when it, or any of its ancestors, is in the
    /// set. Selecting `Db` therefore covers every dialect, but selecting a
    /// dialect does not imply the generic `Db` category.
    pub fn includes(&self, tech: Tech) -> bool {
        if self.all {
            return true;
        }
        let mut current = Some(tech);
        while let Some(t) = current {
            if self.include.contains(&t) {
                return true;
            }
            current = t.parent();
        }
        false
    }

    /// Whether this scope warrants SQL injection testing at all.
    pub fn targets_sql(&self) -> bool {
        if self.all || self.include.contains(&Tech::Db) {
            return true;
        }
        self.include.iter().any(|t| t.is_sql_db())
    }
}

impl Default for TechSet {
    fn default() -> Self {
        TechSet::all()
    }
}
