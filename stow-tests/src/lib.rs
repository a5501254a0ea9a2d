mod cascade;
mod concurrent;
mod crud;
mod entities;
mod fetch;
mod memory;

pub use cascade::cascade_options;
pub use concurrent::{concurrent_failure, concurrent_ordering};
pub use crud::{crud, missing_and_transient};
pub use entities::*;
pub use fetch::{fetch_many, fetch_one, iterate};
pub use memory::MemoryExecutor;

use log::LevelFilter;
use std::env;
use stow::{Executor, Orm};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against `executor`, sharing one [`Orm`].
pub async fn execute_tests<E: Executor>(executor: &E) {
    let orm = Orm::default();
    crud(&orm, executor).await;
    missing_and_transient(&orm, executor).await;
    fetch_one(&orm, executor).await;
    fetch_many(&orm, executor).await;
    iterate(&orm, executor).await;
    cascade_options(&orm, executor).await;
    concurrent_ordering(&orm, executor).await;
    concurrent_failure(&orm, executor).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
