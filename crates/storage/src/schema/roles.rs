use super::SchemaContext;
use crate::registry::Namespace;
use crate::version_store::VersionStore;

const NAME: &str = "roles";

const CREATE_TABLE: &str = "
CREATE TABLE roles (
    id        INTEGER PRIMARY KEY,
    username  TEXT NOT NULL,
    mailbox   TEXT NOT NULL,
    scope     TEXT NOT NULL
);
";

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    Namespace::new(
        NAME,
        format!("{CREATE_TABLE}{}", VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version)),
    )
}
