mod schema_def;

pub use schema_def::{Column, ForeignKey, ForeignKeyOnChange, Schema, SqlType, Table};
