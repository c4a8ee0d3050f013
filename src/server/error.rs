use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::Error;

/// API错误类型
pub struct AppError(pub anyhow::Error);

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            Some(
                Error::ImageDecode { .. }
                | Error::DimensionMismatch { .. }
                | Error::InvalidName(_)
                | Error::InvalidArgument(_),
            ) => StatusCode::BAD_REQUEST,
            Some(Error::ArticleNotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::EmptyDataset) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {:#}", self.0);
        }
        (status, format!("Something went wrong: {}", self.0)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        assert_eq!(AppError::from(Error::EmptyDataset).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::from(Error::DimensionMismatch { expected: 2, actual: 3 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
