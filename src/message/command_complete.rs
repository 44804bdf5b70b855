//! `CommandComplete` (`spec.md` §3 `QueryResult.rowsAffected` / §4.3): the
//! tag closing out a successful command, e.g. `"INSERT 0 3"` or
//! `"SELECT 5"`.

use bytes::Bytes;

use crate::error::Error;
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

/// Commands whose tag's trailing number counts as `rowsAffected`; every
/// other command (e.g. `CREATE TABLE`, `BEGIN`) reports `0` (`spec.md` §3).
const COUNTED_COMMANDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "SELECT", "MOVE", "FETCH", "COPY",
];

#[derive(Debug, Clone)]
pub struct CommandComplete {
    pub tag: String,
}

impl CommandComplete {
    /// The last space-separated number in the tag, for commands in
    /// [`COUNTED_COMMANDS`]; `0` otherwise (`spec.md` §3).
    pub fn rows_affected(&self) -> u64 {
        let mut words = self.tag.split(' ');
        let Some(command) = words.next() else {
            return 0;
        };
        if !COUNTED_COMMANDS.contains(&command) {
            return 0;
        }
        words.last().and_then(|n| n.parse().ok()).unwrap_or(0)
    }
}

impl BackendMessage for CommandComplete {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::CommandComplete;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        Ok(CommandComplete {
            tag: buf.get_cstr()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: &str) -> CommandComplete {
        CommandComplete { tag: tag.to_string() }
    }

    #[test]
    fn insert_reports_last_number() {
        assert_eq!(tagged("INSERT 0 3").rows_affected(), 3);
    }

    #[test]
    fn select_reports_row_count() {
        assert_eq!(tagged("SELECT 5").rows_affected(), 5);
    }

    #[test]
    fn ddl_reports_zero() {
        assert_eq!(tagged("CREATE TABLE").rows_affected(), 0);
    }

    #[test]
    fn begin_reports_zero() {
        assert_eq!(tagged("BEGIN").rows_affected(), 0);
    }
}
