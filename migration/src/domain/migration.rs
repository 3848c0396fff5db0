use blog_common::{Role, password::hash_password};

use crate::domain::{
    persistence::{AdminAccount, Persistence},
    schema::blog_tables,
    tables::{Column, ForeignKeyConstraint, Index, Table},
};

pub trait MigrationStep {
    fn ctx(&self) -> &'static str;
    fn ddls(self) -> Vec<String>;
}

pub struct CreateTableStep {
    table_name: String,
    ddls: Vec<String>,
}

impl CreateTableStep {
    fn new(database_schema: &str, table: &Table) -> Self {
        let ddls = create_table_ddl(database_schema, table);
        Self {
            table_name: table.name.clone(),
            ddls,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl MigrationStep for CreateTableStep {
    fn ctx(&self) -> &'static str {
        "CREATE TABLE"
    }

    fn ddls(self) -> Vec<String> {
        self.ddls
    }
}

#[derive(Clone)]
pub struct Migration<P: Persistence> {
    persistence: P,
}

impl<P: Persistence> Migration<P> {
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub async fn apply(&self, steps: Vec<CreateTableStep>) -> Result<(), anyhow::Error> {
        for step in steps.iter() {
            tracing::info!("creating table {}", step.table_name());
        }
        self.persistence.apply_migration_steps(steps).await
    }

    pub async fn bootstrap_admin(&self, admin: &AdminAccount) -> Result<bool, anyhow::Error> {
        let password_hash = hash_password(&admin.password)?;
        tracing::debug!("bootstrapping {} account {}", Role::Admin, admin.email);
        self.persistence
            .insert_admin(&admin.email, &admin.pseudonym, &password_hash)
            .await
    }
}

/// Steps creating every blog table missing from the database
pub async fn migration_steps(persistence: &impl Persistence) -> Result<Vec<CreateTableStep>, anyhow::Error> {
    let actual_schema = persistence.load().await?;
    let database_schema = persistence.database_schema();

    let result = blog_tables()
        .iter()
        .filter(|table| !actual_schema.contains(&table.name))
        .map(|table| CreateTableStep::new(database_schema, table))
        .collect();

    Ok(result)
}

fn create_table_ddl(schema: &str, table: &Table) -> Vec<String> {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for column in table.columns.iter() {
        columns.push(column_ddl(column));
        if column.primary_key {
            pk_columns.push(&column.name as &str);
        }
    }

    let columns_sql = columns.join(",\n    ");
    let pk_columns_sql = pk_columns.join(",");

    let table_ddl = format!(
        "CREATE TABLE \"{}\".\"{}\" (\n    {},\n    PRIMARY KEY({})\n)",
        schema, table.name, columns_sql, pk_columns_sql
    );

    let mut ddls = vec![table_ddl];

    for fk in table.foreign_keys.iter() {
        ddls.push(create_fk_ddl(schema, fk));
    }

    for index in table.indexes.iter() {
        ddls.push(create_index_ddl(schema, index));
    }

    ddls
}

fn column_ddl(column: &Column) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default_value) = &column.default_value {
        sql.push_str(format!(" DEFAULT {}", default_value).as_str());
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

fn create_fk_ddl(schema: &str, fk: &ForeignKeyConstraint) -> String {
    format!(
        "ALTER TABLE \"{}\".\"{}\" ADD CONSTRAINT \"{}_{}_fkey\" FOREIGN KEY (\"{}\") REFERENCES \"{}\".\"{}\" (\"{}\") ON DELETE CASCADE",
        schema,
        fk.table_name,
        fk.table_name,
        fk.column_name,
        fk.column_name,
        schema,
        fk.referenced_table_name,
        fk.referenced_column_name
    )
}

fn create_index_ddl(schema: &str, index: &Index) -> String {
    let columns_sql = index
        .columns
        .iter()
        .map(|column| format!("\"{}\"", column))
        .collect::<Vec<_>>()
        .join(", ");
    let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
    format!(
        "CREATE {} \"{}_{}_idx\" ON \"{}\".\"{}\" ({})",
        kind,
        index.table_name,
        index.columns.join("_"),
        schema,
        index.table_name,
        columns_sql
    )
}
