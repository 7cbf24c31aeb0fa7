//! `skip_serializing_if` predicates for omitting zero values.

pub(crate) fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

pub(crate) fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}
