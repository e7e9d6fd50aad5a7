//! Connection lifetime and access mode per target

use crate::types::{DatabaseError, DatabaseTarget, EngineMode, LeasePolicy, Result};

/// Decide how connections to `target` are obtained.
///
/// Read-only local files get a fresh read-only connection per query so that
/// other processes can keep the file open. Read-only is rejected for every
/// other mode. Everything else shares one persistent read-write connection.
pub fn decide(target: &DatabaseTarget, read_only_flag: bool) -> Result<LeasePolicy> {
    match (target.engine_mode(), read_only_flag) {
        (EngineMode::LocalFile, true) => Ok(LeasePolicy::EPHEMERAL_READ_ONLY),
        (mode, true) => Err(DatabaseError::UnsupportedReadOnlyMode(mode)),
        (_, false) => Ok(LeasePolicy::PERSISTENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve, PathRequirement};
    use crate::types::{Credentials, Lifetime};

    fn target(raw: &str) -> DatabaseTarget {
        let creds = Credentials::new(Some("tok".into()), false);
        resolve(raw, &creds, PathRequirement::MayCreate).unwrap()
    }

    #[test]
    fn test_read_only_local_file_is_ephemeral() {
        let policy = decide(&target("data.duckdb"), true).unwrap();
        assert_eq!(policy.lifetime, Lifetime::Ephemeral);
        assert!(policy.read_only);
    }

    #[test]
    fn test_read_only_rejected_for_non_local() {
        for (raw, mode) in [(":memory:", EngineMode::InMemory), ("md:", EngineMode::Cloud)] {
            let err = decide(&target(raw), true).unwrap_err();
            assert!(matches!(err, DatabaseError::UnsupportedReadOnlyMode(m) if m == mode));
        }
    }

    #[test]
    fn test_read_write_is_persistent() {
        for raw in [":memory:", "md:my_db", "data.duckdb"] {
            assert_eq!(decide(&target(raw), false).unwrap(), LeasePolicy::PERSISTENT);
        }
    }
}
