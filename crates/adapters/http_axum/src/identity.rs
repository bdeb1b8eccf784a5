//! Operator extraction from request headers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use stovepanel_app::ports::IdentityContext;
use stovepanel_domain::operator::Operator;

/// Header set by the authenticating proxy.
pub const OPERATOR_HEADER: &str = "x-operator";

/// The operator behind the current request.
#[derive(Debug, Clone)]
pub struct Caller(pub Operator);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operator = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map_or_else(Operator::anonymous, Operator::new);
        Ok(Self(operator))
    }
}

impl IdentityContext for Caller {
    fn operator(&self) -> Operator {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Operator {
        let (mut parts, ()) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn should_read_operator_from_header() {
        let request = Request::builder()
            .header(OPERATOR_HEADER, "alice")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_str(), "alice");
    }

    #[tokio::test]
    async fn should_fall_back_to_anonymous() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, Operator::anonymous());

        let blank = Request::builder()
            .header(OPERATOR_HEADER, "   ")
            .body(())
            .unwrap();
        assert_eq!(extract(blank).await, Operator::anonymous());
    }
}
