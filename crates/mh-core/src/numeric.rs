use crate::CoreError;

/// Floating point type used by the host arrays.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Like [`ensure_finite`], additionally rejecting zero and negative values.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidArg { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(1e-6, "dt").is_ok());
        assert_eq!(
            ensure_positive(0.0, "dt"),
            Err(CoreError::InvalidArg { what: "dt" })
        );
        assert!(ensure_positive(Real::INFINITY, "dt").is_err());
    }
}
