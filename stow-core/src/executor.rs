use crate::{
    Result, RowLabeled, RowsAffected, Statement,
    future::{BoxFuture, FutureExt},
    stream::{BoxStream, StreamExt},
};

/// Capability to run SQL: a connection, a pool or a transaction.
///
/// Methods take `&self` so a single executor can serve the concurrent related
/// fetches of one [`crate::Orm::fetch_entities`] call.
pub trait Executor: Send + Sync {
    /// Execute a statement that produces no rows.
    fn execute<'s>(&'s self, statement: Statement) -> BoxFuture<'s, Result<RowsAffected>>;

    /// Execute a query and stream its rows.
    fn query<'s>(&'s self, statement: Statement) -> BoxStream<'s, Result<RowLabeled>>;

    /// Execute a query and return its first row, if any.
    fn query_row<'s>(&'s self, statement: Statement) -> BoxFuture<'s, Result<Option<RowLabeled>>> {
        let mut rows = self.query(statement);
        async move { rows.next().await.transpose() }.boxed()
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute<'s>(&'s self, statement: Statement) -> BoxFuture<'s, Result<RowsAffected>> {
        (**self).execute(statement)
    }
    fn query<'s>(&'s self, statement: Statement) -> BoxStream<'s, Result<RowLabeled>> {
        (**self).query(statement)
    }
    fn query_row<'s>(&'s self, statement: Statement) -> BoxFuture<'s, Result<Option<RowLabeled>>> {
        (**self).query_row(statement)
    }
}
