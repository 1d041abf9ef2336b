use bytes::BytesMut;
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type as PgType};

use crate::database::sql_value::SqlValue;

type ToSqlResult = Result<IsNull, Box<dyn std::error::Error + Sync + Send>>;

#[derive(thiserror::Error, Debug)]
#[error("Cannot bind a {value} value to a parameter of type {ty}")]
pub struct WrongParameterType {
    value: &'static str,
    ty: PgType,
}

fn wrong_type(value: &'static str, ty: &PgType) -> ToSqlResult {
    Err(Box::new(WrongParameterType { value, ty: ty.clone() }))
}

fn is_text_type(ty: &PgType) -> bool {
    <&str as ToSql>::accepts(ty)
}

fn int_to_sql(value: i64, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
    if *ty == PgType::INT2 {
        i16::try_from(value)?.to_sql(ty, out)
    } else if *ty == PgType::INT4 {
        i32::try_from(value)?.to_sql(ty, out)
    } else if *ty == PgType::INT8 {
        value.to_sql(ty, out)
    } else if *ty == PgType::FLOAT4 {
        (value as f32).to_sql(ty, out)
    } else if *ty == PgType::FLOAT8 {
        (value as f64).to_sql(ty, out)
    } else if *ty == PgType::NUMERIC {
        Decimal::from(value).to_sql(ty, out)
    } else if *ty == PgType::BOOL {
        (value != 0).to_sql(ty, out)
    } else if is_text_type(ty) {
        value.to_string().to_sql(ty, out)
    } else {
        wrong_type("integer", ty)
    }
}

fn float_to_sql(value: f64, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
    if *ty == PgType::FLOAT4 {
        (value as f32).to_sql(ty, out)
    } else if *ty == PgType::FLOAT8 {
        value.to_sql(ty, out)
    } else if *ty == PgType::NUMERIC {
        Decimal::try_from(value)?.to_sql(ty, out)
    } else if is_text_type(ty) {
        value.to_string().to_sql(ty, out)
    } else {
        wrong_type("float", ty)
    }
}

// Values are narrowed to the parameter type the server inferred for the placeholder.
// Text, bytes and bools are never reinterpreted as another type's binary encoding.
impl ToSql for SqlValue {
    fn to_sql(&self, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(value) if *ty == PgType::BOOL => value.to_sql(ty, out),
            SqlValue::Bool(_) => wrong_type("bool", ty),
            SqlValue::Int(value) => int_to_sql(*value, ty, out),
            SqlValue::Float(value) => float_to_sql(*value, ty, out),
            SqlValue::Text(value) if is_text_type(ty) => value.to_sql(ty, out),
            SqlValue::Text(_) => wrong_type("text", ty),
            SqlValue::Bytes(value) if *ty == PgType::BYTEA => value.to_sql(ty, out),
            SqlValue::Bytes(_) => wrong_type("bytes", ty),
        }
    }

    fn accepts(_ty: &PgType) -> bool {
        true // checked per value in to_sql
    }

    to_sql_checked!();
}
