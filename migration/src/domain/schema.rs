use blog_common::{
    ARTICLE_ID_FIELD_NAME, ARTICLES_TABLE, AUTHOR_ID_FIELD_NAME, COMMENTS_TABLE, ID_FIELD_NAME,
    PUBLICATION_DATE_FIELD_NAME, USERS_TABLE,
};

use crate::domain::tables::{Column, Table};

/// returns the blog tables, sorted conform dependency order
pub fn blog_tables() -> Vec<Table> {
    vec![users_table(), articles_table(), comments_table()]
}

fn users_table() -> Table {
    Table::new(
        USERS_TABLE,
        vec![
            Column::primary_key(ID_FIELD_NAME, "BIGSERIAL"),
            Column::new("email", "VARCHAR(180)", true, true, None),
            Column::required("password", "VARCHAR(255)"),
            Column::new("pseudonym", "VARCHAR(50)", true, true, None),
            Column::new("role", "VARCHAR(20)", true, false, Some("'user'")),
            Column::optional("photo", "VARCHAR(255)"),
            Column::new("registration_date", "TIMESTAMPTZ", true, false, Some("now()")),
        ],
    )
}

fn articles_table() -> Table {
    Table::new(
        ARTICLES_TABLE,
        vec![
            Column::primary_key(ID_FIELD_NAME, "BIGSERIAL"),
            Column::required("title", "VARCHAR(150)"),
            Column::required("content", "TEXT"),
            Column::required("slug", "VARCHAR(255)"),
            Column::required(PUBLICATION_DATE_FIELD_NAME, "TIMESTAMPTZ"),
            Column::required(AUTHOR_ID_FIELD_NAME, "BIGINT"),
        ],
    )
    .references(AUTHOR_ID_FIELD_NAME, USERS_TABLE)
    .index(vec!["slug"], true)
    .index(vec![PUBLICATION_DATE_FIELD_NAME], false)
}

fn comments_table() -> Table {
    Table::new(
        COMMENTS_TABLE,
        vec![
            Column::primary_key(ID_FIELD_NAME, "BIGSERIAL"),
            Column::required("content", "TEXT"),
            Column::required(PUBLICATION_DATE_FIELD_NAME, "TIMESTAMPTZ"),
            Column::required(AUTHOR_ID_FIELD_NAME, "BIGINT"),
            Column::required(ARTICLE_ID_FIELD_NAME, "BIGINT"),
        ],
    )
    .references(AUTHOR_ID_FIELD_NAME, USERS_TABLE)
    .references(ARTICLE_ID_FIELD_NAME, ARTICLES_TABLE)
    .index(vec![ARTICLE_ID_FIELD_NAME], false)
}
