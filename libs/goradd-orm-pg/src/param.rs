// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Conversion between [`Value`] and the Postgres binary protocol.
//!
//! Postgres infers the type of each parameter from the statement, so a value is encoded as
//! whatever type the server asks for. In particular ids travel as strings and are sent as
//! integers when compared with integer columns.

use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use goradd_orm::{DatabaseError, SQL_DATE_TIME_FORMAT, Value};
use tokio_postgres::{
    Row,
    types::{FromSql, IsNull, ToSql, Type, private::BytesMut, to_sql_checked},
};

type BoxError = Box<dyn Error + Sync + Send>;

#[derive(Debug)]
pub(crate) struct PgParam<'a>(pub &'a Value);

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    DatabaseError::Validation(format!("cannot send a {} value as {ty}", value.kind())).into()
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Int(v), ty)),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 if v.fract() == 0.0 => int_to_sql(v as i64, ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Float(v), ty)),
    }
}

fn time_to_sql(v: NaiveDateTime, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::TIMESTAMP => v.to_sql(ty, out),
        Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
        Type::DATE => v.date().to_sql(ty, out),
        Type::TIME => v.time().to_sql(ty, out),
        _ if is_text(ty) => v.format(SQL_DATE_TIME_FORMAT).to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Time(v), ty)),
    }
}

fn string_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => int_to_sql(v.trim().parse()?, ty, out),
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(v.trim().parse()?, ty, out),
        Type::BOOL => match v.trim().to_lowercase().as_str() {
            "1" | "t" | "true" => true.to_sql(ty, out),
            "0" | "f" | "false" => false.to_sql(ty, out),
            _ => Err(mismatch(&Value::from(v), ty)),
        },
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => {
            time_to_sql(NaiveDateTime::parse_from_str(v, SQL_DATE_TIME_FORMAT)?, ty, out)
        }
        Type::BYTEA => v.as_bytes().to_sql(ty, out),
        _ if is_text(ty) => v.to_sql(ty, out),
        _ => Err(mismatch(&Value::from(v), ty)),
    }
}

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::String(v) => string_to_sql(v, ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::Uint(v) => int_to_sql(i64::try_from(*v)?, ty, out),
            Value::Float(v) => float_to_sql(*v, ty, out),
            Value::Float32(v) => float_to_sql(*v as f64, ty, out),
            Value::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => int_to_sql(*v as i64, ty, out),
            },
            Value::Time(v) => time_to_sql(*v, ty, out),
            Value::Bytes(v) => match *ty {
                Type::BYTEA => v.as_slice().to_sql(ty, out),
                _ if is_text(ty) => std::str::from_utf8(v)?.to_sql(ty, out),
                _ => Err(mismatch(self.0, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn get<'a, T>(row: &'a Row, index: usize) -> Result<Value, DatabaseError>
where
    T: FromSql<'a> + Into<Value>,
{
    row.try_get::<_, Option<T>>(index)
        .map(Value::from)
        .map_err(DatabaseError::delegate)
}

/// Read a cell in the shape closest to its Postgres type. Columns of other types (`numeric`,
/// `json` and so on) have to be cast in the query.
pub(crate) fn column_value(row: &Row, index: usize) -> Result<Value, DatabaseError> {
    let column = &row.columns()[index];
    let ty = column.type_();

    match *ty {
        Type::BOOL => get::<bool>(row, index),
        Type::INT2 => get::<i16>(row, index),
        Type::INT4 => get::<i32>(row, index),
        Type::INT8 => get::<i64>(row, index),
        Type::OID => get::<u32>(row, index),
        Type::FLOAT4 => get::<f32>(row, index),
        Type::FLOAT8 => get::<f64>(row, index),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index),
        Type::BYTEA => get::<Vec<u8>>(row, index),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map(|v| Value::from(v.map(|v| v.naive_utc())))
            .map_err(DatabaseError::delegate),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(index)
            .map(|v| Value::from(v.map(|v| v.and_time(NaiveTime::MIN))))
            .map_err(DatabaseError::delegate),
        _ if is_text(ty) => get::<String>(row, index),
        _ => Err(DatabaseError::Validation(format!(
            "column {} has unsupported type {ty}",
            column.name()
        ))),
    }
}
