//! The `Database` facade: one data directory, one buffer pool, one
//! catalog. Accepts raw SQL text and drives it through the full
//! compilation pipeline.

use crate::buffer::BufferManager;
use crate::catalog::SystemCatalog;
use crate::common::config::DatabaseConfig;
use crate::common::Result;
use crate::exec::{ExecResult, Executor};
use crate::sql::analyzer::SemanticAnalyzer;
use crate::sql::parser::parse_statement;
use crate::sql::plan::Planner;

/// Owns the buffer pool (and, through it, the catalog) for one data
/// directory. Every statement is compiled fresh: a new catalog snapshot,
/// a new semantic analyzer, a new plan.
pub struct Database {
    buffer: BufferManager,
}

impl Database {
    /// Open (creating if absent) the data directory named by `config`.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let buffer = BufferManager::open(config.data_dir, config.buffer_pool_capacity)?;
        Ok(Self { buffer })
    }

    /// Convenience wrapper around `open(DatabaseConfig::default())`.
    pub fn open_default() -> Result<Self> {
        Self::open(DatabaseConfig::default())
    }

    /// Compile and execute one SQL statement.
    pub fn execute(&mut self, sql: &str) -> Result<ExecResult> {
        let span = tracing::debug_span!("statement", sql);
        let _enter = span.enter();
        let result = self.execute_inner(sql);
        if let Err(err) = &result {
            tracing::warn!(%err, "statement failed");
        }
        result
    }

    fn execute_inner(&mut self, sql: &str) -> Result<ExecResult> {
        let stmt = parse_statement(sql)?;
        tracing::trace!("parsed statement");

        let snapshot = SystemCatalog::snapshot(&mut self.buffer)?;
        let analyzer = SemanticAnalyzer::new(snapshot);
        analyzer.analyze(&stmt)?;
        tracing::trace!("passed semantic analysis");

        let plan = Planner::plan(stmt);
        tracing::trace!("built logical plan");

        let result = Executor::execute(&mut self.buffer, plan)?;
        tracing::debug!("statement executed");
        Ok(result)
    }

    /// Split `script` on top-level `;` (honoring single-quoted string
    /// literals), compiling and executing each statement independently.
    /// A later statement still runs after an earlier one fails.
    pub fn execute_script(&mut self, script: &str) -> Vec<Result<ExecResult>> {
        split_statements(script).into_iter().map(|stmt| self.execute(&stmt)).collect()
    }

    /// Flush every dirty frame and consume the handle. Prefer this over
    /// letting `Database` drop when the flush result matters to the
    /// caller.
    pub fn close(mut self) -> Result<()> {
        self.buffer.flush_all()
    }

    /// Read-only access to buffer pool observability counters.
    pub fn buffer_stats(&self) -> crate::buffer::StatsSnapshot {
        self.buffer.stats().snapshot()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.buffer.flush_all() {
            tracing::warn!(%err, "failed to flush buffer pool on drop");
        }
    }
}

/// Split on `;` outside single-quoted strings, honoring `\\`/`\'`
/// escapes the same way the lexer does, so a `;` inside a string
/// literal never ends a statement early.
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = script.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_string = !in_string;
                current.push(c);
            }
            '\\' if in_string => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' if !in_string => {
                statements.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}
