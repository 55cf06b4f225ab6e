//! Unit tests for volley_errors component

use volley_errors::{VolleyError, VolleyResult};

#[cfg(test)]
mod retryability_tests {
    use super::*;

    #[test]
    fn timeout_is_retryable() {
        let err = VolleyError::Timeout {
            response: None,
            network_time_ms: Some(2500),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_failure_is_retryable() {
        let err = VolleyError::AuthFailure {
            status: 401,
            response: None,
            network_time_ms: None,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn redirect_is_retryable() {
        let err = VolleyError::Redirect {
            response: None,
            network_time_ms: None,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn no_connection_is_not_retryable() {
        let err = VolleyError::NoConnection {
            response: None,
            network_time_ms: None,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_error_is_not_retryable() {
        let err = VolleyError::ServerError {
            status: 503,
            response: None,
            network_time_ms: None,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn parse_error_is_not_retryable() {
        let err = VolleyError::ParseError {
            message: "bad json".into(),
            response: None,
            network_time_ms: None,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_url_is_not_retryable() {
        assert!(!VolleyError::MalformedUrl("not a url".into()).is_retryable());
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn auth_failure_display_includes_status() {
        let err = VolleyError::AuthFailure {
            status: 403,
            response: None,
            network_time_ms: None,
        };
        assert!(format!("{}", err).contains("403"));
    }

    #[test]
    fn server_error_display_includes_status() {
        let err = VolleyError::ServerError {
            status: 500,
            response: None,
            network_time_ms: None,
        };
        assert!(format!("{}", err).contains("500"));
    }

    #[test]
    fn cache_error_display_includes_message() {
        let err = VolleyError::CacheError("disk full".into());
        assert!(format!("{}", err).contains("disk full"));
    }
}

#[cfg(test)]
mod trait_tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn implements_error_trait() {
        let err = VolleyError::MalformedUrl("x".into());
        let _: &dyn Error = &err;
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VolleyError>();
    }
}

#[cfg(test)]
mod result_type_tests {
    use super::*;

    #[test]
    fn ok_and_err_both_construct() {
        let ok: VolleyResult<i32> = Ok(1);
        assert!(ok.is_ok());

        let err: VolleyResult<i32> = Err(VolleyError::NoConnection {
            response: None,
            network_time_ms: None,
        });
        assert!(err.is_err());
    }
}
