//! CLI commands

use async_trait::async_trait;

use crate::context::Context;
use crate::Result;

pub mod create;
pub mod edit;
pub mod update;

/// A subcommand that runs against the shared [`Context`].
#[async_trait]
pub trait Command: Send + Sync {
    async fn run(&self, ctx: &Context) -> Result<()>;
}

/// Comma-separated list, `-` when empty.
pub(crate) fn join_or_dash<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let joined = items.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
