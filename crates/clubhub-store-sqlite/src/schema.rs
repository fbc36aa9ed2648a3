//! SQL schema for the clubhub SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// Every content table carries the same counter columns so that the
/// engagement code can address them through `ContentKind::table()` alone.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS news (
    id             TEXT PRIMARY KEY,
    author_id      TEXT NOT NULL,
    title          TEXT NOT NULL,
    body           TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,
    like_count     INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    save_count     INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    share_count    INTEGER NOT NULL DEFAULT 0 CHECK (share_count >= 0),
    views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

CREATE TABLE IF NOT EXISTS events (
    id             TEXT PRIMARY KEY,
    author_id      TEXT NOT NULL,
    title          TEXT NOT NULL,
    body           TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,
    like_count     INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    save_count     INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    share_count    INTEGER NOT NULL DEFAULT 0 CHECK (share_count >= 0),
    views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

CREATE TABLE IF NOT EXISTS resources (
    id             TEXT PRIMARY KEY,
    author_id      TEXT NOT NULL,
    title          TEXT NOT NULL,
    body           TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,
    like_count     INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    save_count     INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    share_count    INTEGER NOT NULL DEFAULT 0 CHECK (share_count >= 0),
    views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

CREATE TABLE IF NOT EXISTS social_posts (
    id             TEXT PRIMARY KEY,
    author_id      TEXT NOT NULL,
    title          TEXT NOT NULL,
    body           TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,
    like_count     INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    save_count     INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    share_count    INTEGER NOT NULL DEFAULT 0 CHECK (share_count >= 0),
    views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

-- Comments are both a child of some content item and content themselves.
-- Rows are never deleted: status moves 'active' -> 'deleted' exactly once.
CREATE TABLE IF NOT EXISTS comments (
    id             TEXT PRIMARY KEY,
    content_type   TEXT NOT NULL,   -- ContentKind of the commented item
    content_id     TEXT NOT NULL,
    author_id      TEXT NOT NULL,
    content        TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'deleted')),
    parent_id      TEXT REFERENCES comments(id),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    deleted_at     TEXT,
    like_count     INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    save_count     INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    share_count    INTEGER NOT NULL DEFAULT 0 CHECK (share_count >= 0),
    views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

-- One row per (user, content). Created lazily on first interaction.
CREATE TABLE IF NOT EXISTS engagements (
    user_id         TEXT NOT NULL,
    content_type    TEXT NOT NULL,
    content_id      TEXT NOT NULL,
    liked           INTEGER NOT NULL DEFAULT 0,
    liked_at        TEXT,
    saved           INTEGER NOT NULL DEFAULT 0,
    saved_at        TEXT,
    shared          INTEGER NOT NULL DEFAULT 0,
    shared_at       TEXT,
    viewed          INTEGER NOT NULL DEFAULT 0,
    viewed_at       TEXT,
    downloaded      INTEGER NOT NULL DEFAULT 0,
    downloaded_at   TEXT,
    created_at      TEXT NOT NULL,
    last_engaged_at TEXT NOT NULL,
    PRIMARY KEY (user_id, content_type, content_id)
);

-- Sent to a comment's author when someone else replies to or likes it.
CREATE TABLE IF NOT EXISTS notifications (
    id            TEXT PRIMARY KEY,
    recipient_id  TEXT NOT NULL,
    actor_id      TEXT NOT NULL,
    kind          TEXT NOT NULL CHECK (kind IN ('comment_reply', 'comment_like')),
    comment_id    TEXT NOT NULL REFERENCES comments(id),
    content_type  TEXT NOT NULL,   -- thread target of the comment
    content_id    TEXT NOT NULL,
    read          INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comments_target_status_idx ON comments(content_type, content_id, status);
CREATE INDEX IF NOT EXISTS comments_parent_idx        ON comments(parent_id);
CREATE INDEX IF NOT EXISTS engagements_content_idx    ON engagements(content_type, content_id);
CREATE INDEX IF NOT EXISTS engagements_saved_idx      ON engagements(user_id, saved, saved_at);
CREATE INDEX IF NOT EXISTS notifications_recipient_idx ON notifications(recipient_id, read, created_at);

PRAGMA user_version = 1;
";
