use crate::stores::LocalStore;
use crate::time::unix_epoch_seconds_now;
use anyhow::{Context as _, anyhow};
use rusqlite::{Connection, OptionalExtension as _, params};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/migrations/0001_init.sql"
    )),
)];

/// Local key-value area backed by a SQLite file. All access goes through a
/// dedicated worker thread. The `*_text` methods block on the reply channel;
/// the [`LocalStore`] methods wait for it on the blocking pool instead.
#[derive(Clone)]
pub struct SqliteStore {
    tx: mpsc::Sender<DbCommand>,
}

enum DbCommand {
    Read {
        key: String,
        reply: mpsc::Sender<anyhow::Result<Option<String>>>,
    },
    Write {
        key: String,
        value: String,
        reply: mpsc::Sender<anyhow::Result<()>>,
    },
    Remove {
        key: String,
        reply: mpsc::Sender<anyhow::Result<()>>,
    },
}

impl SqliteStore {
    /// Never fails on an unusable database file: the open error is reported
    /// by every subsequent call instead.
    pub fn new(db_path: PathBuf) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<DbCommand>();

        std::thread::Builder::new()
            .name("webtab-sqlite".to_owned())
            .spawn(move || {
                let mut db = SqliteDatabase::open(&db_path);
                if let Err(err) = &db {
                    tracing::error!(
                        path = %db_path.display(),
                        error = %format!("{err:#}"),
                        "local store unavailable"
                    );
                }
                while let Ok(cmd) = rx.recv() {
                    match (&mut db, cmd) {
                        (Ok(db), DbCommand::Read { key, reply }) => {
                            let _ = reply.send(db.read(&key));
                        }
                        (Ok(db), DbCommand::Write { key, value, reply }) => {
                            let _ = reply.send(db.write(&key, &value));
                        }
                        (Ok(db), DbCommand::Remove { key, reply }) => {
                            let _ = reply.send(db.remove(&key));
                        }
                        (Err(err), cmd) => {
                            respond_db_open_error(err, cmd);
                        }
                    }
                }
            })
            .context("failed to spawn sqlite worker thread")?;

        Ok(Self { tx })
    }

    pub fn read_text(&self, key: impl Into<String>) -> anyhow::Result<Option<String>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Read {
                key: key.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    pub fn write_text(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> anyhow::Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Write {
                key: key.into(),
                value: value.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    pub fn remove_text(&self, key: impl Into<String>) -> anyhow::Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Remove {
                key: key.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }
}

impl LocalStore for SqliteStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let store = self.clone();
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || store.read_text(key))
            .await
            .context("failed to join sqlite read task")?
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let store = self.clone();
        let key = key.to_owned();
        let value = value.to_owned();
        tokio::task::spawn_blocking(move || store.write_text(key, value))
            .await
            .context("failed to join sqlite write task")?
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let store = self.clone();
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || store.remove_text(key))
            .await
            .context("failed to join sqlite remove task")?
    }
}

fn respond_db_open_error(err: &anyhow::Error, cmd: DbCommand) {
    let message = format!("{err:#}");
    match cmd {
        DbCommand::Read { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::Write { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::Remove { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
    }
}

struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut conn = Connection::open(db_path)
            .with_context(|| format!("failed to open sqlite db {}", db_path.display()))?;

        configure_connection(&mut conn).context("failed to configure sqlite connection")?;
        apply_migrations(&mut conn).context("failed to apply sqlite migrations")?;

        Ok(Self { conn })
    }

    fn read(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read local value {key}"))
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let now = unix_epoch_seconds_now();
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("failed to write local value {key}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove local value {key}"))?;
        Ok(())
    }
}

fn configure_connection(conn: &mut Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
    .context("failed to apply sqlite PRAGMAs")?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    let mut current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .context("failed to read user_version")? as u32;

    if current > LATEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "sqlite schema version is newer than this build: db={}, app={}",
            current,
            LATEST_SCHEMA_VERSION
        ));
    }

    if current == LATEST_SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch("BEGIN IMMEDIATE;")
        .context("failed to begin migration transaction")?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration v{version:04}"))?;
        conn.pragma_update(None, "user_version", *version as i64)
            .context("failed to update user_version")?;
        current = *version;
    }

    conn.execute_batch("COMMIT;")
        .context("failed to commit migration transaction")?;
    Ok(())
}
