//! `accounts`: mailboxes mirrored from docker-mailserver, per container scope.

use super::{SchemaContext, sql_literal};
use crate::registry::{Namespace, Patch};
use crate::version_store::VersionStore;

const NAME: &str = "accounts";

const CREATE_TABLE: &str = "
CREATE TABLE accounts (
    id        INTEGER PRIMARY KEY,
    mailbox   TEXT NOT NULL,
    domain    TEXT DEFAULT '',
    salt      TEXT DEFAULT '',
    hash      TEXT DEFAULT '',
    storage   TEXT DEFAULT '{}',
    scope     TEXT NOT NULL,
    UNIQUE (mailbox, scope)
);
";

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    Namespace::new(
        NAME,
        format!("{CREATE_TABLE}{}", VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version)),
    )
    .patch(Patch::new(
        "1.1.3",
        [format!("ALTER TABLE accounts ADD scope TEXT DEFAULT {}", sql_literal(&ctx.container_name))],
    ))
}
