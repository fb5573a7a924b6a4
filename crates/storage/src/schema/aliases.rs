use super::SchemaContext;
use crate::registry::Namespace;
use crate::version_store::VersionStore;

const NAME: &str = "aliases";

const CREATE_TABLE: &str = "
CREATE TABLE aliases (
    id          INTEGER PRIMARY KEY,
    source      TEXT NOT NULL,
    destination TEXT NOT NULL,
    regex       BIT DEFAULT 0,
    scope       TEXT NOT NULL,
    UNIQUE (source, scope)
);
";

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    Namespace::new(
        NAME,
        format!("{CREATE_TABLE}{}", VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version)),
    )
}
