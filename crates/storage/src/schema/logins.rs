//! `logins`: dms-gui users, seeded with the default `admin` account.

use super::SchemaContext;
use crate::registry::{Namespace, Patch};
use crate::version_store::VersionStore;

const NAME: &str = "logins";

const CREATE_TABLE: &str = "
CREATE TABLE logins (
    id        INTEGER PRIMARY KEY,
    email     TEXT NOT NULL UNIQUE,
    username  TEXT NOT NULL UNIQUE,
    salt      TEXT DEFAULT '',
    hash      TEXT DEFAULT '',
    isAdmin   BIT DEFAULT 0,
    isActive  BIT DEFAULT 1,
    isAccount BIT DEFAULT 0,
    roles     TEXT DEFAULT '[]'
);
";

// Salt and scrypt hash of the stock admin password.
const ADMIN_SALT: &str = "fdebebcdcec4e534757a49473759355b";
const ADMIN_HASH: &str = "a975c7c1bf9783aac8b87e55ad01fdc4302254d234c9794cd4227f8c86aae7306bbeacf2412188f46ab6406d1563455246405ef0ee5861ffe2440fe03b271e18";

fn seed_admin() -> String {
    format!(
        "INSERT OR IGNORE INTO logins (email, username, salt, hash, isAdmin, isActive, isAccount, roles) \
         VALUES ('admin@dms-gui.com', 'admin', '{ADMIN_SALT}', '{ADMIN_HASH}', 1, 1, 0, '[]');"
    )
}

fn move_password_to_salted_hash() -> [String; 3] {
    [
        "ALTER TABLE logins DROP COLUMN password;".to_owned(),
        "ALTER TABLE logins ADD salt TEXT DEFAULT ''".to_owned(),
        "ALTER TABLE logins ADD hash TEXT DEFAULT ''".to_owned(),
    ]
}

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    let create = format!(
        "{CREATE_TABLE}{}\n{}",
        seed_admin(),
        VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version)
    );

    // 1.1.1 repeats 1.0.14 for stores that skipped it, then restores the admin row.
    let mut relogin = move_password_to_salted_hash().to_vec();
    relogin.push(format!(
        "INSERT OR IGNORE INTO logins (email, username, salt, hash) \
         VALUES ('admin@dms-gui.com', 'admin', '{ADMIN_SALT}', '{ADMIN_HASH}')"
    ));

    Namespace::new(NAME, create)
        .patch(Patch::new("1.0.14", move_password_to_salted_hash()))
        .patch(Patch::new("1.1.1", relogin))
        .patch(Patch::new(
            "1.1.6",
            [
                "ALTER TABLE logins ADD isAdmin BIT DEFAULT 0",
                "ALTER TABLE logins ADD isActive BIT DEFAULT 1",
                "UPDATE logins SET isAdmin = 1 WHERE username = 'admin'",
            ],
        ))
        .patch(Patch::new("1.1.9", ["ALTER TABLE logins ADD roles TEXT DEFAULT '[]'"]))
}
