//! RDBMS fingerprint catalog
//!
//! Each dialect carries the error fragments that identify it, in the order
//! they should be tried: the most common cases come first and the first
//! match wins. The fragments are actual driver-level error messages, not
//! guesses. A narrower list per dialect identifies malformed UNION queries
//! specifically. The last entry is the dialect-agnostic fallback whose
//! fragments indicate SQL trouble without fingerprinting a product.

use anyhow::Result;
use regex::{Regex, RegexBuilder};

use crate::core::tech::Tech;

const GENERIC_NAME: &str = "Generic SQL RDBMS";

pub struct Dialect {
    name: &'static str,
    tech: Tech,
    error_patterns: Vec<Regex>,
    union_patterns: Vec<Regex>,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tech(&self) -> Tech {
        self.tech
    }

    pub fn is_generic(&self) -> bool {
        self.name == GENERIC_NAME
    }

    pub fn error_patterns(&self) -> &[Regex] {
        &self.error_patterns
    }

    pub fn union_patterns(&self) -> &[Regex] {
        &self.union_patterns
    }
}

pub struct DialectCatalog {
    dialects: Vec<Dialect>,
}

impl DialectCatalog {
    /// Compiles the full catalog. Called once at startup; probes only ever
    /// run the precompiled patterns.
    pub fn load() -> Result<Self> {
        let specs: &[(&'static str, Tech, &[&str], &[&str])] = &[
            (
                "MySQL",
                Tech::MySql,
                &[
                    "You have an error in your SQL syntax",
                    "com.mysql.jdbc.exceptions",
                    "org.gjt.mm.mysql",
                    "ODBC driver does not support",
                    "The used SELECT statements have a different number of columns",
                ],
                &[
                    "You have an error in your SQL syntax",
                    "The used SELECT statements have a different number of columns",
                ],
            ),
            (
                "Microsoft SQL Server",
                Tech::MsSql,
                &[
                    "com.microsoft.sqlserver.jdbc",
                    "com.microsoft.jdbc",
                    "com.inet.tds",
                    "com.ashna.jturbo",
                    "weblogic.jdbc.mssqlserver",
                    "[Microsoft]",
                    "[SQLServer]",
                    "[SQLServer 2000 Driver for JDBC]",
                    // also shipped by Sybase installations; could be either
                    "net.sourceforge.jtds.jdbc",
                    "80040e14",
                    "800a0bcd",
                    "80040e57",
                    "ODBC driver does not support",
                    "All queries in an SQL statement containing a UNION operator must have an equal number of expressions in their target lists",
                    "All queries combined using a UNION, INTERSECT or EXCEPT operator must have an equal number of expressions in their target lists",
                ],
                &[
                    "All queries in an SQL statement containing a UNION operator must have an equal number of expressions in their target lists",
                    "All queries combined using a UNION, INTERSECT or EXCEPT operator must have an equal number of expressions in their target lists",
                ],
            ),
            (
                "Oracle",
                Tech::Oracle,
                &[
                    "oracle.jdbc",
                    "SQLSTATE[HY",
                    "ORA-00933",
                    "ORA-06512",
                    "SQL command not properly ended",
                    "ORA-00942",
                    "ORA-29257",
                    "ORA-00932",
                    "query block has incorrect number of result columns",
                    "ORA-01789",
                ],
                &[
                    "query block has incorrect number of result columns",
                    "ORA-01789",
                ],
            ),
            (
                "IBM DB2",
                Tech::Db2,
                &["com.ibm.db2.jcc", "COM.ibm.db2.jdbc"],
                &[],
            ),
            (
                "PostgreSQL",
                Tech::PostgreSql,
                &[
                    "org.postgresql.util.PSQLException",
                    "org.postgresql",
                    "each UNION query must have the same number of columns",
                ],
                &["each UNION query must have the same number of columns"],
            ),
            (
                "Sybase",
                Tech::Sybase,
                &[
                    "com.sybase.jdbc",
                    "com.sybase.jdbc2.jdbc",
                    "com.sybase.jdbc3.jdbc",
                    // see Microsoft SQL Server; could be either
                    "net.sourceforge.jtds.jdbc",
                ],
                &[],
            ),
            ("Informix", Tech::Db, &["com.informix.jdbc"], &[]),
            ("Firebird", Tech::Firebird, &["org.firebirdsql.jdbc"], &[]),
            ("IDS Server", Tech::Db, &["ids.sql"], &[]),
            (
                "InstantDB",
                Tech::Db,
                &["org.enhydra.instantdb.jdbc", "jdbc.idb"],
                &[],
            ),
            ("Interbase", Tech::Db, &["interbase.interclient"], &[]),
            (
                "Hypersonic SQL",
                Tech::HypersonicSql,
                &[
                    "org.hsql",
                    "hSql.",
                    "Unexpected token , requires FROM in statement",
                    "Unexpected end of command in statement",
                    "Column count does not match in statement",
                    "Table not found in statement",
                    "Unexpected token:",
                ],
                &[
                    "Unexpected end of command in statement",
                    "Column count does not match in statement",
                ],
            ),
            (
                "Sybase SQL Anywhere",
                Tech::Sybase,
                &["sybase.jdbc.sqlanywhere"],
                &[],
            ),
            ("Pointbase", Tech::Db, &["com.pointbase.jdbc"], &[]),
            (
                "Cloudscape",
                Tech::Db,
                &["db2j.", "COM.cloudscape", "RmiJdbc.RJDriver"],
                &[],
            ),
            ("Ingres", Tech::Db, &["com.ingres.jdbc"], &[]),
            (
                "SQLite",
                Tech::Sqlite,
                &[
                    // the one genuine regular expression in the catalog
                    "re:near \".+\": syntax error",
                    "SQLITE_ERROR",
                    "SELECTs to the left and right of UNION do not have the same number of result columns",
                ],
                &["SELECTs to the left and right of UNION do not have the same number of result columns"],
            ),
            (
                GENERIC_NAME,
                Tech::Db,
                &[
                    "com.ibatis.common.jdbc",
                    "org.hibernate",
                    "sun.jdbc.odbc",
                    "[ODBC Driver Manager]",
                    "ODBC driver does not support",
                    "System.Data.OleDb",
                    // in case no more specific message was detected
                    "java.sql.SQLException",
                ],
                &[],
            ),
        ];

        let mut dialects = Vec::with_capacity(specs.len());
        for &(name, tech, errors, unions) in specs {
            dialects.push(Dialect {
                name,
                tech,
                error_patterns: compile_all(errors)?,
                union_patterns: compile_all(unions)?,
            });
        }
        Ok(Self { dialects })
    }

    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    pub fn generic(&self) -> Option<&Dialect> {
        self.dialects.iter().find(|d| d.is_generic())
    }
}

/// Fragments are literal text unless prefixed with `re:`.
fn compile_all(fragments: &[&str]) -> Result<Vec<Regex>> {
    fragments
        .iter()
        .map(|fragment| {
            let source = match fragment.strip_prefix("re:") {
                Some(raw) => raw.to_string(),
                None => regex::escape(fragment),
            };
            Ok(RegexBuilder::new(&source).case_insensitive(true).build()?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_compiles_with_generic_last() {
        let catalog = DialectCatalog::load().unwrap();
        assert!(catalog.dialects().len() > 15);
        assert!(catalog.dialects().last().unwrap().is_generic());
        assert!(catalog.generic().is_some());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let catalog = DialectCatalog::load().unwrap();
        let mysql = &catalog.dialects()[0];
        assert_eq!(mysql.name(), "MySQL");
        assert!(mysql.error_patterns()[0].is_match("YOU HAVE AN ERROR IN YOUR SQL SYNTAX near x"));
    }

    #[test]
    fn literal_fragments_do_not_act_as_regexes() {
        let catalog = DialectCatalog::load().unwrap();
        let mssql = catalog
            .dialects()
            .iter()
            .find(|d| d.name() == "Microsoft SQL Server")
            .unwrap();
        let bracketed = mssql
            .error_patterns()
            .iter()
            .find(|p| p.as_str().contains("Microsoft"))
            .unwrap();
        assert!(bracketed.is_match("error: [Microsoft] driver"));
        assert!(!bracketed.is_match("error: M driver"));
    }

    #[test]
    fn sqlite_near_pattern_is_a_real_regex() {
        let catalog = DialectCatalog::load().unwrap();
        let sqlite = catalog
            .dialects()
            .iter()
            .find(|d| d.name() == "SQLite")
            .unwrap();
        assert!(sqlite.error_patterns()[0].is_match("near \"SELECT\": syntax error"));
        assert!(!sqlite.error_patterns()[0].is_match("near \"\": syntax error"));
    }

    #[test]
    fn union_lists_are_narrower_than_error_lists() {
        let catalog = DialectCatalog::load().unwrap();
        for dialect in catalog.dialects() {
            assert!(dialect.union_patterns().len() <= dialect.error_patterns().len());
        }
    }
}
