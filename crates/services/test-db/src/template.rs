//! Built-in defaults used when the calling repository provides no override.

use domain::ConnectionDescriptor;

/// Image definition used when the repository has no `database/Dockerfile`
pub const DOCKERFILE: &str = include_str!("../templates/Dockerfile");

const SETUP_SQL: &str = include_str!("../templates/setup.sql");

/// Render the default setup script for the descriptor's owner and database.
///
/// Role and database are only created when missing, so the script can target
/// an existing database such as the maintenance one.
pub fn render_setup_sql(descriptor: &ConnectionDescriptor) -> String {
    let password_clause = match descriptor.password() {
        Some(password) => format!("PASSWORD {}", quote_literal(password)),
        None => String::new(),
    };

    SETUP_SQL
        .replace("{PGUSER_LITERAL}", &escape_literal(descriptor.user()))
        .replace("{PGUSER}", &quote_ident(descriptor.user()))
        .replace("{PGDATABASE_LITERAL}", &escape_literal(descriptor.database()))
        .replace("{PGDATABASE}", &quote_ident(descriptor.database()))
        .replace("{PGPASSWORD_CLAUSE}", &password_clause)
}

/// Drop the descriptor's database, disconnecting any open sessions first.
pub fn render_drop_database_sql(descriptor: &ConnectionDescriptor) -> String {
    format!(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = {} AND pid <> pg_backend_pid();\n\
         DROP DATABASE IF EXISTS {};\n",
        quote_literal(descriptor.database()),
        quote_ident(descriptor.database()),
    )
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
