//! Error reporting shared by every ledger operation
//!
//! | Range | Area        |
//! |-------|-------------|
//! | 0xxx  | general     |
//! | 1xxx  | auth        |
//! | 3xxx  | member      |
//! | 4xxx  | event       |
//! | 5xxx  | participant |
//! | 6xxx  | transfer    |
//! | 9xxx  | system      |
//!
//! ```
//! use shared::error::{ApiResponse, AppError};
//!
//! let err = AppError::duplicate_cni("ab123").with_detail("row", 4);
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(3002));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
