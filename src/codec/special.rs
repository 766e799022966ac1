//! NaN and the infinities, which JSON numbers cannot carry.

use crate::datum::{Datum, Fields};
use crate::error::FieldError;
use crate::types::TypePath;

pub const MODULE: &str = "heraldry::codec";
pub const NAME: &str = "SpecialFloat";

const NAN: &str = "nan";
const POS_INF: &str = "+inf";
const NEG_INF: &str = "-inf";

pub fn path() -> TypePath {
    TypePath::new(MODULE, NAME)
}

/// Wire label for a non-finite float; `None` when the float is finite.
pub(crate) fn label(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        Some(NAN)
    } else if x == f64::INFINITY {
        Some(POS_INF)
    } else if x == f64::NEG_INFINITY {
        Some(NEG_INF)
    } else {
        None
    }
}

pub(crate) fn parse(label: &str) -> Option<f64> {
    match label {
        NAN => Some(f64::NAN),
        POS_INF => Some(f64::INFINITY),
        NEG_INF => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

pub(crate) fn from_fields(mut fields: Fields) -> Result<Datum, FieldError> {
    let x: String = fields.take("x")?;
    fields.finish()?;
    parse(&x)
        .map(Datum::Float)
        .ok_or_else(|| FieldError::invalid("x", format!("{x:?} is not nan, +inf or -inf")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_non_finite_values_only() {
        assert_eq!(label(f64::NAN), Some("nan"));
        assert_eq!(label(f64::INFINITY), Some("+inf"));
        assert_eq!(label(f64::NEG_INFINITY), Some("-inf"));
        assert_eq!(label(-0.0), None);
        assert_eq!(label(f64::MAX), None);
    }

    #[test]
    fn from_fields_rejects_unknown_labels() {
        let nan = from_fields(Fields::new().with("x", "nan")).unwrap();
        assert!(nan.nan_eq(&Datum::Float(f64::NAN)));
        assert!(matches!(
            from_fields(Fields::new().with("x", "inf")),
            Err(FieldError::Invalid { field, .. }) if field == "x"
        ));
    }
}
