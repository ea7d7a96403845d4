//! SQL schema for the Marquee SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- trimmed, lowercased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    firstname     TEXT NOT NULL,
    lastname      TEXT NOT NULL,
    phone         TEXT NOT NULL,
    address       TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- At most one subscription per user.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    plan            TEXT NOT NULL CHECK (plan IN ('basic', 'intermediary', 'complete')),
    value           REAL NOT NULL CHECK (value > 0),
    registered_at   TEXT NOT NULL,
    expires_at      TEXT NOT NULL
);

-- Names are unique per user ignoring (ASCII) case; colors match exactly.
CREATE TABLE IF NOT EXISTS profiles (
    profile_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    color      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, name COLLATE NOCASE),
    UNIQUE (user_id, color)
);

CREATE TABLE IF NOT EXISTS cards (
    card_id         TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    number          TEXT NOT NULL,
    expiration_date TEXT NOT NULL,   -- YYYY-MM-DD
    security_code   TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movies (
    movie_id   TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    api_id     TEXT NOT NULL,
    image_url  TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS favorites (
    favorites_id TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS favorite_movies (
    favorites_id TEXT NOT NULL REFERENCES favorites(favorites_id) ON DELETE CASCADE,
    movie_id     TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
    added_at     TEXT NOT NULL,
    PRIMARY KEY (favorites_id, movie_id)
);

CREATE INDEX IF NOT EXISTS profiles_user_idx ON profiles(user_id);
CREATE INDEX IF NOT EXISTS cards_user_idx    ON cards(user_id);

PRAGMA user_version = 1;
";
