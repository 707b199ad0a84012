use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

/// Failures reported by a [`crate::TagStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("tag id is required")]
	MissingId,
	#[error("organization tag already exists <id='{0}'>")]
	AlreadyExists(String),
	#[error("organization tag not found <id='{0}'>")]
	NotFound(String),
	#[error("organization tag has children <id='{0}'>")]
	HasChildren(String),
	#[error("database error: {0}")]
	Database(#[from] DbErr),
}

/// Errors surfaced by the directory service and the resolver.
#[derive(Debug, Error)]
pub enum TagError {
	#[error("invalid input: {0}")]
	InvalidInput(String),
	#[error("organization tag not found <id='{0}'>")]
	NotFound(String),
	#[error("organization tag already exists <id='{0}'>")]
	AlreadyExists(String),
	#[error("organization tag has children <id='{0}'>")]
	HasChildren(String),
	#[error("organization tag <id='{0}'> is not held by the principal")]
	NotHeld(String),
	#[error("internal error: {0}")]
	Internal(#[source] DbErr),
}

impl TagError {
	/// HTTP status a transport layer should answer with for this error.
	pub const fn status_code(&self) -> u16 {
		match self {
			Self::InvalidInput(_) => 400,
			Self::NotHeld(_) => 403,
			Self::NotFound(_) => 404,
			Self::AlreadyExists(_) | Self::HasChildren(_) => 409,
			Self::Internal(_) => 500,
		}
	}

	/// Stable outward message that does not leak ids or database details.
	pub const fn public_message(&self) -> &'static str {
		match self {
			Self::InvalidInput(_) => "Invalid request parameters",
			Self::NotHeld(_) => "Organization tag does not belong to user",
			Self::NotFound(_) => "Organization tag not found",
			Self::AlreadyExists(_) => "Organization tag already exists",
			Self::HasChildren(_) => "Organization tag has child nodes",
			Self::Internal(_) => "Internal server error",
		}
	}
}

impl From<StoreError> for TagError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::MissingId => Self::InvalidInput("tag id is required".to_string()),
			StoreError::AlreadyExists(id) => Self::AlreadyExists(id),
			StoreError::NotFound(id) => Self::NotFound(id),
			StoreError::HasChildren(id) => Self::HasChildren(id),
			StoreError::Database(e) => {
				error!(?e, "Organization tag store failed");
				Self::Internal(e)
			}
		}
	}
}
