//! `settings`: key/value rows per scope, and the home of every version row.

use dmsgui_core::constants::IS_MUTABLE;

use super::{SchemaContext, sql_literal};
use crate::registry::{Namespace, Patch};
use crate::version_store::VersionStore;

const NAME: &str = "settings";

const CREATE_TABLE: &str = "
CREATE TABLE settings (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    value     TEXT NOT NULL,
    scope     TEXT NOT NULL,
    isMutable BIT DEFAULT 0,
    UNIQUE (name, scope)
);
";

/// Container defaults the UI reads from the container's scope.
fn container_defaults(ctx: &SchemaContext, verb: &str) -> Vec<String> {
    let scope = sql_literal(&ctx.container_name);
    [
        ("containerName", &ctx.container_name),
        ("setupPath", &ctx.setup_script),
        ("env.DMS_CONFIG_PATH", &ctx.dms_config_path),
    ]
    .into_iter()
    .map(|(name, value)| {
        format!(
            "{verb} INTO settings (name, value, scope, isMutable) VALUES ({}, {}, {scope}, {IS_MUTABLE})",
            sql_literal(name),
            sql_literal(value),
        )
    })
    .collect()
}

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    let mut create = String::from(CREATE_TABLE);
    create.push_str(&VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version));
    for statement in container_defaults(ctx, "INSERT OR IGNORE") {
        create.push('\n');
        create.push_str(&statement);
        create.push(';');
    }

    Namespace::new(NAME, create)
        .patch(Patch::new(
            "1.0.17",
            [
                format!("ALTER TABLE settings ADD scope TEXT NOT NULL DEFAULT {}", sql_literal(&ctx.scope)),
                "ALTER TABLE settings ADD isMutable BIT DEFAULT 0".to_owned(),
            ],
        ))
        .patch(Patch::new("1.2.4", container_defaults(ctx, "REPLACE")))
}
