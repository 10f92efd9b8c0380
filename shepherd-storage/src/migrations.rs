//! Schema definition and initialization for the State Store.
//!
//! Uses `PRAGMA user_version` as the schema-version sentinel: a store
//! opened by a build with a different expected version than it was created
//! with fails fatally rather than silently re-migrating, since there is no
//! migration history to replay yet.

use rusqlite::Connection;
use shepherd_core::errors::StorageError;

/// Bump when `SCHEMA_SQL` changes in an incompatible way.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS filesystems (
    id              INTEGER PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    driver_key      TEXT NOT NULL,
    options         TEXT NOT NULL DEFAULT '{}',
    max_concurrency INTEGER NOT NULL CHECK (max_concurrency >= 1)
) STRICT;

CREATE TABLE IF NOT EXISTS data_items (
    id            INTEGER PRIMARY KEY,
    filesystem_id INTEGER NOT NULL REFERENCES filesystems(id),
    address       TEXT NOT NULL,
    size          INTEGER CHECK (size IS NULL OR size >= 0),
    UNIQUE (filesystem_id, address)
) STRICT;

CREATE TABLE IF NOT EXISTS data_item_checksums (
    data_id   INTEGER NOT NULL REFERENCES data_items(id) ON DELETE CASCADE,
    algorithm TEXT NOT NULL,
    checksum  TEXT NOT NULL,
    PRIMARY KEY (data_id, algorithm)
) STRICT;

CREATE TABLE IF NOT EXISTS data_item_metadata (
    data_id INTEGER NOT NULL REFERENCES data_items(id) ON DELETE CASCADE,
    key     TEXT NOT NULL,
    value   TEXT NOT NULL,
    PRIMARY KEY (data_id, key)
) STRICT;

CREATE TABLE IF NOT EXISTS jobs (
    id              INTEGER PRIMARY KEY,
    client_ref      TEXT NOT NULL,
    max_attempts    INTEGER NOT NULL CHECK (max_attempts >= 1),
    prepare_start   INTEGER,
    prepare_finish  INTEGER,
    transfer_start  INTEGER,
    transfer_finish INTEGER,
    CHECK (prepare_finish IS NULL OR prepare_start IS NOT NULL),
    CHECK (transfer_finish IS NULL OR transfer_start IS NOT NULL)
) STRICT;

CREATE TABLE IF NOT EXISTS tasks (
    id                INTEGER PRIMARY KEY,
    job_id            INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    source_data_id    INTEGER NOT NULL REFERENCES data_items(id),
    target_data_id    INTEGER NOT NULL REFERENCES data_items(id),
    script            TEXT NOT NULL,
    dependency_task_id INTEGER REFERENCES tasks(id),
    CHECK (source_data_id != target_data_id),
    CHECK (dependency_task_id IS NULL OR dependency_task_id != id),
    UNIQUE (job_id, target_data_id),
    UNIQUE (job_id, source_data_id, target_data_id)
) STRICT;

CREATE TABLE IF NOT EXISTS attempts (
    id        INTEGER PRIMARY KEY,
    task_id   INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    start     INTEGER NOT NULL,
    finish    INTEGER,
    exit_code INTEGER,
    CHECK (finish IS NULL OR finish >= start),
    UNIQUE (task_id, start)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_attempts_task ON attempts(task_id);
CREATE INDEX IF NOT EXISTS idx_tasks_job ON tasks(job_id);
CREATE INDEX IF NOT EXISTS idx_tasks_dependency ON tasks(dependency_task_id);

-- For each task, labels its chronologically-latest attempt. Tasks with no
-- attempts surface as attempt=0, latest=1, succeeded=0.
DROP VIEW IF EXISTS task_status;
CREATE VIEW task_status AS
SELECT
    t.id AS task_id,
    t.job_id,
    COALESCE(a.id, 0) AS attempt,
    CASE WHEN a.id IS NULL THEN 1 ELSE (
        a.start = (SELECT MAX(a2.start) FROM attempts a2 WHERE a2.task_id = t.id)
    ) END AS latest,
    COALESCE(a.exit_code = 0, 0) AS succeeded,
    a.exit_code AS exit_code,
    a.start AS start,
    a.finish AS finish
FROM tasks t
LEFT JOIN attempts a ON a.task_id = t.id
WHERE a.id IS NULL
   OR a.start = (SELECT MAX(a2.start) FROM attempts a2 WHERE a2.task_id = t.id);

-- Per (job, source_fs, target_fs): mean bytes/sec over successful attempts
-- and mean failure rate over completed attempts.
DROP VIEW IF EXISTS job_throughput;
CREATE VIEW job_throughput AS
SELECT
    t.job_id,
    sfs.name AS source_fs,
    tfs.name AS target_fs,
    AVG(
        CASE WHEN a.exit_code = 0 AND a.finish IS NOT NULL AND a.finish > a.start
        THEN CAST(sd.size AS REAL) / (CAST(a.finish - a.start AS REAL) / 1000.0)
        END
    ) AS mean_bytes_per_sec,
    AVG(CASE WHEN a.finish IS NOT NULL THEN CASE WHEN a.exit_code != 0 THEN 1.0 ELSE 0.0 END END) AS mean_failure_rate
FROM tasks t
JOIN data_items sd ON sd.id = t.source_data_id
JOIN filesystems sfs ON sfs.id = sd.filesystem_id
JOIN data_items td ON td.id = t.target_data_id
JOIN filesystems tfs ON tfs.id = td.filesystem_id
JOIN attempts a ON a.task_id = t.id
GROUP BY t.job_id, sfs.name, tfs.name;

-- Per (job, source_fs, target_fs): counts of {pending, running, failed,
-- succeeded} over each task's latest attempt. `failed` means terminally
-- failed (attempts exhausted) — a retriable failure counts as `pending`,
-- since the job's transfer phase termination test relies on
-- `running = 0 ∧ pending = 0` implying every task is either succeeded or
-- terminally failed.
DROP VIEW IF EXISTS job_status;
CREATE VIEW job_status AS
SELECT
    t.job_id,
    sfs.name AS source_fs,
    tfs.name AS target_fs,
    SUM(CASE
        WHEN ts.succeeded THEN 0
        WHEN ts.attempt != 0 AND ts.exit_code IS NULL THEN 0
        WHEN ts.attempt != 0 AND ts.exit_code != 0
             AND (SELECT COUNT(*) FROM attempts a WHERE a.task_id = t.id) >= j.max_attempts THEN 0
        ELSE 1
    END) AS pending,
    SUM(CASE WHEN ts.attempt != 0 AND ts.exit_code IS NULL THEN 1 ELSE 0 END) AS running,
    SUM(CASE
        WHEN NOT ts.succeeded AND ts.attempt != 0 AND ts.exit_code != 0
             AND (SELECT COUNT(*) FROM attempts a WHERE a.task_id = t.id) >= j.max_attempts
        THEN 1 ELSE 0
    END) AS failed,
    SUM(CASE WHEN ts.succeeded THEN 1 ELSE 0 END) AS succeeded
FROM tasks t
JOIN jobs j ON j.id = t.job_id
JOIN task_status ts ON ts.task_id = t.id AND ts.latest = 1
JOIN data_items sd ON sd.id = t.source_data_id
JOIN filesystems sfs ON sfs.id = sd.filesystem_id
JOIN data_items td ON td.id = t.target_data_id
JOIN filesystems tfs ON tfs.id = td.filesystem_id
GROUP BY t.job_id, sfs.name, tfs.name;

-- Per (job, filesystem): running tasks using this filesystem as source or
-- target, and its configured cap. One row per (job, filesystem) pair that
-- appears in the job's tasks at all, even with zero current concurrency —
-- otherwise an idle filesystem would vanish from the join `todo` needs.
DROP VIEW IF EXISTS filesystem_status;
CREATE VIEW filesystem_status AS
SELECT
    jf.job_id,
    fs.id AS filesystem_id,
    fs.name AS filesystem_name,
    fs.max_concurrency,
    COALESCE(rc.concurrency, 0) AS concurrency
FROM (
    SELECT DISTINCT t.job_id AS job_id, sd.filesystem_id AS filesystem_id
    FROM tasks t JOIN data_items sd ON sd.id = t.source_data_id
    UNION
    SELECT DISTINCT t.job_id AS job_id, td.filesystem_id AS filesystem_id
    FROM tasks t JOIN data_items td ON td.id = t.target_data_id
) jf
JOIN filesystems fs ON fs.id = jf.filesystem_id
LEFT JOIN (
    SELECT t.job_id AS job_id, fs2.id AS filesystem_id, COUNT(*) AS concurrency
    FROM tasks t
    JOIN task_status ts ON ts.task_id = t.id AND ts.latest = 1 AND ts.attempt != 0 AND ts.exit_code IS NULL
    JOIN data_items sd2 ON sd2.id = t.source_data_id
    JOIN data_items td2 ON td2.id = t.target_data_id
    JOIN filesystems fs2 ON fs2.id = sd2.filesystem_id OR fs2.id = td2.filesystem_id
    GROUP BY t.job_id, fs2.id
) rc ON rc.job_id = jf.job_id AND rc.filesystem_id = jf.filesystem_id;

-- The scheduler's kernel: the 7-condition eligibility projection, with an
-- eta estimate ordered ascending with nulls last.
DROP VIEW IF EXISTS todo;
CREATE VIEW todo AS
SELECT
    t.id AS task_id,
    t.job_id,
    sd.size AS size,
    CASE
        WHEN jt.mean_bytes_per_sec IS NOT NULL AND jt.mean_failure_rate IS NOT NULL
             AND jt.mean_failure_rate < 1.0 AND sd.size IS NOT NULL
        THEN CAST(sd.size AS REAL) / (jt.mean_bytes_per_sec * (1.0 - jt.mean_failure_rate))
        ELSE NULL
    END AS eta
FROM tasks t
JOIN jobs j ON j.id = t.job_id
JOIN task_status ts ON ts.task_id = t.id AND ts.latest = 1
JOIN data_items sd ON sd.id = t.source_data_id
JOIN filesystems sfs ON sfs.id = sd.filesystem_id
JOIN data_items td ON td.id = t.target_data_id
JOIN filesystems tfs ON tfs.id = td.filesystem_id
JOIN filesystem_status sfstat ON sfstat.job_id = t.job_id AND sfstat.filesystem_id = sfs.id
JOIN filesystem_status tfstat ON tfstat.job_id = t.job_id AND tfstat.filesystem_id = tfs.id
LEFT JOIN job_throughput jt ON jt.job_id = t.job_id AND jt.source_fs = sfs.name AND jt.target_fs = tfs.name
LEFT JOIN tasks dep ON dep.id = t.dependency_task_id
LEFT JOIN task_status dep_ts ON dep_ts.task_id = dep.id AND dep_ts.latest = 1
WHERE j.transfer_finish IS NULL
  AND (ts.attempt = 0 OR ts.exit_code != 0)
  AND NOT ts.succeeded
  AND (SELECT COUNT(*) FROM attempts a WHERE a.task_id = t.id) < j.max_attempts
  AND (t.dependency_task_id IS NULL OR dep_ts.succeeded = 1)
  AND sfstat.concurrency < sfstat.max_concurrency
  AND tfstat.concurrency < tfstat.max_concurrency;
"#;

fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

/// Initializes the schema if `user_version` is 0 (a fresh store), or
/// verifies it otherwise. Re-running this on an already-initialised store
/// at the current version is a no-op (a schema idempotence law) —
/// `CREATE TABLE IF NOT EXISTS`/`DROP VIEW IF EXISTS` make the DDL itself
/// idempotent, and the version check short-circuits past it.
pub fn initialize_schema(conn: &Connection) -> Result<(), StorageError> {
    let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0)).map_err(sqe)?;

    if found == 0 {
        conn.execute_batch(SCHEMA_SQL).map_err(sqe)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION).map_err(sqe)?;
        return Ok(());
    }

    if found != SCHEMA_VERSION {
        return Err(StorageError::SchemaMismatch { found, expected: SCHEMA_VERSION });
    }

    conn.execute_batch(SCHEMA_SQL).map_err(sqe)
}

pub fn schema_version(conn: &Connection) -> Result<i64, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0)).map_err(sqe)
}
