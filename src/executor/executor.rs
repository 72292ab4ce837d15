//! Query Executor for FlatDB
//!
//! This module executes parsed commands against the table directories of one
//! schema and returns results.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::predicate::CompiledPredicate;
use crate::catalog::{Catalog, TableDef};
use crate::config::{self, EngineConfig};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::parse_command;
use crate::storage::{Row, Table};

/// Query result
#[derive(Debug, Default, Serialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Primary key assigned by an INSERT, when keys are enabled
    pub primary_key: Option<u64>,
    /// Message
    pub message: Option<String>,
}

impl QueryResult {
    /// Create a new empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Result of a successful INSERT
    pub fn inserted(primary_key: Option<u64>) -> Self {
        Self {
            primary_key,
            ..Self::with_message("Insert successful")
        }
    }
}

/// Cancels a running SELECT or DELETE between two segments
///
/// Cloned handles share one flag. A cancellation is consumed by the
/// operation it stops.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    cancelled: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Request cancellation of the running operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear a pending cancellation
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Check whether a cancellation is pending
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.swap(false, Ordering::SeqCst) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Execution Engine
pub struct ExecutionEngine {
    /// Schema model
    catalog: Arc<Catalog>,
    /// `<data_dir>/<schema name>`
    schema_dir: PathBuf,
    /// Table storage (table_name -> Table)
    tables: HashMap<String, Table>,
    /// Cancellation flag shared with [`InterruptHandle`]s
    interrupt: InterruptHandle,
}

impl ExecutionEngine {
    /// Open the engine for `catalog` under `data_dir`, creating every table
    /// directory and first segment that does not exist yet
    pub fn open(catalog: Arc<Catalog>, data_dir: impl AsRef<Path>) -> Result<Self> {
        let schema_dir = config::schema_dir(data_dir.as_ref(), catalog.name());
        std::fs::create_dir_all(&schema_dir)?;

        let mut tables = HashMap::new();
        for def in catalog.tables() {
            let table = Table::open(Arc::clone(def), &schema_dir, catalog.segment_row_limit())?;
            tables.insert(def.name().to_string(), table);
        }

        info!(
            schema = %catalog.name(),
            dir = %schema_dir.display(),
            tables = tables.len(),
            "engine initialised"
        );

        Ok(Self {
            catalog,
            schema_dir,
            tables,
            interrupt: InterruptHandle::default(),
        })
    }

    /// Load the schema file named by `config` and open the engine
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let catalog = Catalog::load_from_disk(&config.schema_path)?;
        Self::open(Arc::new(catalog), &config.data_dir)
    }

    /// Schema model
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Directory holding the table directories
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Handle that cancels the running SELECT or DELETE
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Parse and execute one command
    pub fn execute_sql(&self, input: &str) -> Result<QueryResult> {
        let command = parse_command(input)?;
        self.execute(command)
    }

    /// Execute a command
    pub fn execute(&self, command: Command) -> Result<QueryResult> {
        match command {
            Command::Insert(InsertCommand { table_name, values }) => {
                self.execute_insert(&table_name, values)
            }
            Command::Select(SelectCommand {
                columns,
                tables,
                predicate,
            }) => self.execute_select(&columns, &tables, predicate.as_ref()),
            Command::Delete(DeleteCommand {
                table_name,
                predicate,
            }) => self.execute_delete(&table_name, &predicate),
        }
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    // ========== INSERT ==========

    fn execute_insert(&self, table_name: &str, values: Vec<String>) -> Result<QueryResult> {
        let table = self.table(table_name)?;
        let def = table.definition();

        if values.len() != def.column_count() {
            return Err(Error::ArityMismatch {
                table: table_name.to_string(),
                expected: def.column_count(),
                found: values.len(),
            });
        }

        let _guard = table.lock_exclusive()?;

        let mut row = Row::new(values);
        let primary_key = table.next_primary_key()?;
        if let Some(key) = primary_key {
            row.prepend(key.to_string());
        }

        let segment = table.append(&row)?;
        debug!(table = %table_name, segment, primary_key = ?primary_key, "row inserted");

        Ok(QueryResult::inserted(primary_key))
    }

    // ========== SELECT ==========

    fn execute_select(
        &self,
        items: &[SelectItem],
        table_names: &[String],
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        // Resolve every table and projection before touching any segment
        let mut plans = Vec::with_capacity(table_names.len());
        for name in table_names {
            let table = self.table(name)?;
            plans.push((table, Projection::build(table.definition(), items)?));
        }
        for item in items {
            if let SelectItem::Column(ColumnRef {
                table: Some(qualifier),
                ..
            }) = item
            {
                if !table_names.contains(qualifier) {
                    return Err(Error::TableNotFound(qualifier.clone()));
                }
            }
        }

        let mut result = QueryResult::empty();
        let mut columns_set = false;

        for (table, projection) in plans {
            if projection.is_empty() {
                continue;
            }

            let filter = match predicate {
                Some(pred) => match CompiledPredicate::compile(table.definition(), pred) {
                    Ok(filter) => Some(filter),
                    Err(e) => {
                        warn!(table = %table.name(), error = %e, "skipping table, predicate cannot be evaluated");
                        continue;
                    }
                },
                None => None,
            };

            if !columns_set {
                result.columns = projection.names.clone();
                columns_set = true;
            }

            let _guard = table.lock_shared()?;
            for segment in table.segments().list_segments()? {
                self.interrupt.check_cancelled()?;

                let rows = match table.segments().read_segment(&segment) {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(table = %table.name(), segment = segment.number, error = %e, "skipping unreadable segment");
                        continue;
                    }
                };

                result.rows.extend(
                    rows.iter()
                        .filter(|row| filter.as_ref().map_or(true, |f| f.matches(row)))
                        .map(|row| row.project(&projection.indexes)),
                );
            }
        }

        debug!(tables = ?table_names, rows = result.rows.len(), "select finished");
        Ok(result)
    }

    // ========== DELETE ==========

    fn execute_delete(&self, table_name: &str, predicate: &Predicate) -> Result<QueryResult> {
        let table = self.table(table_name)?;
        let filter = CompiledPredicate::compile(table.definition(), predicate)?;

        let _guard = table.lock_exclusive()?;

        let mut deleted = 0usize;
        for segment in table.segments().list_segments()? {
            self.interrupt.check_cancelled()?;

            let segment_failed = |source: Error| Error::SegmentFailed {
                table: table_name.to_string(),
                segment: segment.number,
                source: Box::new(source),
            };

            let rows = table
                .segments()
                .read_segment(&segment)
                .map_err(segment_failed)?;
            let before = rows.len();
            let survivors: Vec<Row> = rows.into_iter().filter(|row| !filter.matches(row)).collect();

            if survivors.len() == before {
                continue;
            }

            table
                .segments()
                .rewrite_segment(&segment, &survivors)
                .map_err(segment_failed)?;
            deleted += before - survivors.len();
        }

        debug!(table = %table_name, predicate = %predicate, deleted, "delete finished");
        Ok(QueryResult::with_message("Delete successful"))
    }
}

/// Projected row indexes and output names for one table
struct Projection {
    indexes: Vec<usize>,
    names: Vec<String>,
}

impl Projection {
    /// Resolve the select list against `def`; items qualified with another
    /// table are left out
    fn build(def: &TableDef, items: &[SelectItem]) -> Result<Self> {
        let mut indexes = Vec::new();
        let mut names = Vec::new();

        for item in items {
            match item {
                SelectItem::Wildcard => {
                    indexes.extend(def.user_column_indexes());
                    names.extend(def.columns().iter().cloned());
                }
                SelectItem::Column(column) => {
                    if !column.applies_to(def.name()) {
                        continue;
                    }
                    indexes.push(def.require_column(&column.column)?);
                    names.push(column.column.clone());
                }
            }
        }

        Ok(Self { indexes, names })
    }

    fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
