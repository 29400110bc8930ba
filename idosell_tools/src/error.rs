use osync_common::TemplateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdosellApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("IdoSell reported an error for order {order}. {message}")]
    OrderFault { order: String, message: String },
    #[error("Order {0} does not exist in IdoSell")]
    OrderNotFound(String),
    #[error("Product {0} does not exist in IdoSell")]
    ProductNotFound(String),
    #[error("{0}")]
    Template(#[from] TemplateError),
}
