//! `domains`: mail domains and their DKIM key settings.

use super::{SchemaContext, sql_literal};
use crate::registry::{Namespace, Patch};
use crate::version_store::VersionStore;

const NAME: &str = "domains";

fn create_table(ctx: &SchemaContext) -> String {
    // `$domain` is left for the UI to substitute.
    let key_path = format!(
        "{}/rspamd/dkim/{}-{}-{}-$domain.private.txt",
        ctx.dms_config_path, ctx.dkim_keytype, ctx.dkim_keysize, ctx.dkim_selector
    );
    format!(
        "
CREATE TABLE domains (
    id        INTEGER PRIMARY KEY,
    domain    TEXT NOT NULL UNIQUE,
    dkim      TEXT DEFAULT {selector},
    keytype   TEXT DEFAULT {keytype},
    keysize   TEXT DEFAULT {keysize},
    path      TEXT DEFAULT {path},
    scope     TEXT NOT NULL
);
",
        selector = sql_literal(&ctx.dkim_selector),
        keytype = sql_literal(&ctx.dkim_keytype),
        keysize = sql_literal(&ctx.dkim_keysize),
        path = sql_literal(&key_path),
    )
}

pub(super) fn namespace(ctx: &SchemaContext) -> Namespace {
    let create = format!(
        "{}{}",
        create_table(ctx),
        VersionStore::seed_statement(NAME, &ctx.scope, &ctx.seed_version)
    );

    Namespace::new(NAME, create)
        .patch(Patch::new(
            "1.1.2",
            [
                format!("ALTER TABLE domains ADD keytype TEXT DEFAULT {}", sql_literal(&ctx.dkim_keytype)),
                format!("ALTER TABLE domains ADD keysize TEXT DEFAULT {}", sql_literal(&ctx.dkim_keysize)),
            ],
        ))
        .patch(Patch::new(
            "1.1.3",
            [format!("ALTER TABLE domains ADD scope TEXT DEFAULT {}", sql_literal(&ctx.container_name))],
        ))
}
