mod as_value;
mod cache;
mod columns;
mod destinations;
mod entity;
mod error;
mod executor;
mod iter;
mod mapping;
mod metrics;
mod options;
mod orm;
mod persister;
pub mod pql;
mod query;
mod range;
mod record;
mod scanner;
mod tag;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cache::*;
pub use columns::*;
pub use destinations::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use iter::*;
pub use mapping::*;
pub use metrics::*;
pub use options::*;
pub use orm::*;
pub use persister::*;
pub use query::*;
pub use range::*;
pub use record::*;
pub use scanner::*;
pub use tag::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
