use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use stow::{
    AsValue, Columns, Error, Executor, Result, RowLabeled, RowsAffected, Statement, Value,
    future::{BoxFuture, FutureExt},
    stream::{self, BoxStream, StreamExt},
};

/// In-memory table store understanding the statements the runtime emits.
///
/// Supported shapes, keywords in upper case:
/// - `INSERT INTO t (a, b) VALUES ($1, $2)`
/// - `UPDATE t SET a = $1, b = $2 WHERE k = $3`
/// - `DELETE FROM t [WHERE k = $1]`
/// - `SELECT a, p.b FROM t [p] [WHERE k = $n] [ORDER BY c] [OFFSET $n] [LIMIT $n]`
/// - `SELECT COUNT(*) FROM t [WHERE k = $n]`
///
/// Columns never written read as NULL. Every statement received is recorded.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: Mutex<HashMap<String, Vec<Columns>>>,
    statements: Mutex<Vec<Statement>>,
    failure: Mutex<Option<String>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        lock(&self.statements).clone()
    }

    pub fn clear_statements(&self) {
        lock(&self.statements).clear();
    }

    /// Fail every following statement whose text contains `pattern`.
    pub fn fail_when(&self, pattern: impl Into<String>) {
        *lock(&self.failure) = Some(pattern.into());
    }

    pub fn clear_failure(&self) {
        *lock(&self.failure) = None;
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Columns> {
        lock(&self.tables)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn receive(&self, statement: &Statement) -> Result<()> {
        lock(&self.statements).push(statement.clone());
        match lock(&self.failure).as_deref() {
            Some(pattern) if statement.sql.contains(pattern) => Err(Error::msg(format!(
                "Injected failure for `{}`",
                statement.sql
            ))),
            _ => Ok(()),
        }
    }

    fn run_execute(&self, statement: Statement) -> Result<RowsAffected> {
        self.receive(&statement)?;
        let sql = statement.sql.trim();
        let affected = if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (table, rest) = split_once(rest, " (")?;
            let (columns, _) = split_once(rest, ")")?;
            let columns: Vec<&str> = columns.split(',').map(str::trim).collect();
            if columns.len() != statement.args.len() {
                return Err(Error::msg(format!(
                    "{} columns but {} arguments in `{sql}`",
                    columns.len(),
                    statement.args.len()
                )));
            }
            let row: Columns = columns
                .iter()
                .map(|v| v.to_string())
                .zip(statement.args.iter().cloned())
                .collect();
            let mut tables = lock(&self.tables);
            tables.entry(table.trim().to_string()).or_default().push(row);
            1
        } else if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table, rest) = split_once(rest, " SET ")?;
            let (assignments, filter) = split_once(rest, " WHERE ")?;
            let filter = equality(filter, &statement.args)?;
            let assignments = assignments
                .split(',')
                .map(|v| equality(v, &statement.args))
                .collect::<Result<Vec<_>>>()?;
            let mut tables = lock(&self.tables);
            let Some(rows) = tables.get_mut(table.trim()) else {
                return Ok(RowsAffected::default());
            };
            let mut affected = 0;
            for row in rows.iter_mut().filter(|v| matches(v, &filter)) {
                for (column, value) in &assignments {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
            affected
        } else if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table, filter) = match rest.split_once(" WHERE ") {
                Some((table, filter)) => (table, Some(equality(filter, &statement.args)?)),
                None => (rest, None),
            };
            let mut tables = lock(&self.tables);
            let Some(rows) = tables.get_mut(table.trim()) else {
                return Ok(RowsAffected::default());
            };
            let before = rows.len();
            match filter {
                Some(filter) => rows.retain(|v| !matches(v, &filter)),
                None => rows.clear(),
            }
            (before - rows.len()) as u64
        } else {
            return Err(Error::msg(format!("Unsupported statement `{sql}`")));
        };
        Ok(RowsAffected {
            rows_affected: affected,
            last_affected_id: None,
        })
    }

    fn run_query(&self, statement: Statement) -> Result<Vec<RowLabeled>> {
        self.receive(&statement)?;
        let sql = statement.sql.trim();
        let Some(rest) = sql.strip_prefix("SELECT ") else {
            return Err(Error::msg(format!("Unsupported query `{sql}`")));
        };
        let (selection, rest) = split_once(rest, " FROM ")?;
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let Some(table) = tokens.first() else {
            return Err(Error::msg(format!("Missing table in `{sql}`")));
        };
        let mut filter = None;
        let mut order = None;
        let mut offset = 0;
        let mut limit = usize::MAX;
        let mut i = 1;
        while i < tokens.len() {
            match tokens[i] {
                "WHERE" => {
                    let clause = tokens.get(i + 1..i + 4).unwrap_or_default().join(" ");
                    filter = Some(equality(&clause, &statement.args)?);
                    i += 4;
                }
                "ORDER" if tokens.get(i + 1) == Some(&"BY") => {
                    order = tokens.get(i + 2).map(|v| unqualified(v).to_string());
                    i += 3;
                }
                "OFFSET" => {
                    offset = usize_argument(tokens.get(i + 1), &statement.args)?;
                    i += 2;
                }
                "LIMIT" => {
                    limit = usize_argument(tokens.get(i + 1), &statement.args)?;
                    i += 2;
                }
                _ => i += 1,
            }
        }
        let tables = lock(&self.tables);
        let mut rows: Vec<&Columns> = tables
            .get(*table)
            .map(|v| {
                v.iter()
                    .filter(|row| filter.as_ref().is_none_or(|f| matches(row, f)))
                    .collect()
            })
            .unwrap_or_default();
        if selection.trim().eq_ignore_ascii_case("COUNT(*)") {
            let labels: Arc<[String]> = Arc::new(["count".to_string()]);
            let count = Value::Int64(Some(rows.len() as i64));
            return Ok(vec![RowLabeled::new(labels, Box::new([count]))]);
        }
        if let Some(order) = &order {
            rows.sort_by(|a, b| compare(&column(a, order), &column(b, order)));
        }
        let selected: Vec<&str> = selection.split(',').map(|v| unqualified(v.trim())).collect();
        let labels: Arc<[String]> = selected.iter().map(|v| v.to_string()).collect();
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                let values = selected.iter().map(|name| column(row, name)).collect();
                RowLabeled::new(labels.clone(), values)
            })
            .collect())
    }
}

impl Executor for MemoryExecutor {
    fn execute<'s>(&'s self, statement: Statement) -> BoxFuture<'s, Result<RowsAffected>> {
        async move { self.run_execute(statement) }.boxed()
    }

    fn query<'s>(&'s self, statement: Statement) -> BoxStream<'s, Result<RowLabeled>> {
        match self.run_query(statement) {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(error) => stream::once(async move { Err(error) }).boxed(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn split_once<'a>(text: &'a str, separator: &str) -> Result<(&'a str, &'a str)> {
    text.split_once(separator)
        .ok_or_else(|| Error::msg(format!("Expected `{separator}` in `{text}`")))
}

fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn argument<'a>(placeholder: &str, args: &'a [Value]) -> Result<&'a Value> {
    placeholder
        .trim()
        .strip_prefix('$')
        .and_then(|v| v.parse::<usize>().ok())
        .and_then(|v| args.get(v.checked_sub(1)?))
        .ok_or_else(|| Error::msg(format!("Invalid placeholder `{placeholder}`")))
}

fn usize_argument(placeholder: Option<&&str>, args: &[Value]) -> Result<usize> {
    let value = argument(placeholder.copied().unwrap_or_default(), args)?;
    Ok(u64::try_from_value(value.clone())? as usize)
}

/// Parses `column = $n`.
fn equality(clause: &str, args: &[Value]) -> Result<(String, Value)> {
    let (column, placeholder) = split_once(clause, "=")?;
    Ok((
        unqualified(column.trim()).to_string(),
        argument(placeholder, args)?.clone(),
    ))
}

fn matches(row: &Columns, (column, value): &(String, Value)) -> bool {
    row.get(column).is_some_and(|v| v == value)
}

fn column(row: &Columns, name: &str) -> Value {
    row.get(name).cloned().unwrap_or_default()
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Varchar(Some(a)), Value::Varchar(Some(b))) => a.cmp(b),
        _ => match (
            i64::try_from_value(a.clone()),
            i64::try_from_value(b.clone()),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}
