use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Every error a handler can surface. The wire shape is always
/// `{"error": <code>, "message": <text>}` so the client's uniform
/// error handling can read either field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Unknown email/username or wrong password.")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    UserExists,

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Bill not found")]
    BillNotFound,

    #[error("Could not extract amount from transcript.")]
    AmountNotFound,

    #[error("Tesseract executable not found. Install it or add it to PATH, then restart the server.")]
    TesseractMissing,

    #[error("Failed to read image: {0}")]
    OcrFailed(String),

    #[error("PDF bills are not supported; upload an image of the bill instead.")]
    PdfUnsupported,

    #[error("AI assistance is not configured. Set OLLAMA_BASE_URL and enable LEDGERLY_AI.")]
    AiNotConfigured,

    #[error("{0}")]
    SqlRejected(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Request-validation failures, each carrying the error code the
/// original API used.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Username is required")]
    UsernameRequired,
    #[error("A valid email is required")]
    EmailInvalid,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Email or username is required")]
    IdentifierRequired,
    #[error("Password is invalid")]
    PasswordInvalid,
    #[error("entry_type must be 'income' or 'expense'")]
    EntryTypeInvalid,
    #[error("Amount must be a positive number")]
    AmountInvalid,
    #[error("Transcript is required")]
    TranscriptRequired,
    #[error("Question is required")]
    QuestionRequired,
    #[error("GSTIN must be 15 alphanumeric characters")]
    GstinInvalid,
    #[error("Unknown business type")]
    BusinessTypeInvalid,
    #[error("No file was uploaded")]
    NoFile,
    #[error("Uploaded file has no name")]
    EmptyFilename,
    #[error("Only image files (PNG, JPG, etc.) are allowed.")]
    InvalidFileType,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl ApiError {
    /// Stable machine-readable code mirrored from the original endpoints.
    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::UserExists => "user_exists",
            ApiError::Validation(v) => v.code(),
            ApiError::BillNotFound => "not_found",
            ApiError::AmountNotFound => "amount_not_found",
            ApiError::TesseractMissing => "tesseract_missing",
            ApiError::OcrFailed(_) => "ocr_failed",
            ApiError::PdfUnsupported => "pdf_unsupported",
            ApiError::AiNotConfigured => "ai_not_configured",
            ApiError::SqlRejected(_) => "validation_failed",
            ApiError::Db(_) => "database_error",
            ApiError::Io(_) => "io_error",
            ApiError::Json(_) => "json_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ValidationError {
    fn code(&self) -> &'static str {
        match self {
            ValidationError::UsernameRequired => "username_required",
            ValidationError::EmailInvalid => "email_invalid",
            ValidationError::PasswordTooShort => "password_too_short",
            ValidationError::IdentifierRequired => "identifier_required",
            ValidationError::PasswordInvalid => "password_invalid",
            ValidationError::EntryTypeInvalid => "entry_type_invalid",
            ValidationError::AmountInvalid => "amount_invalid",
            ValidationError::TranscriptRequired => "transcript_required",
            ValidationError::QuestionRequired => "question_required",
            ValidationError::GstinInvalid => "gstin_invalid",
            ValidationError::BusinessTypeInvalid => "business_type_invalid",
            ValidationError::NoFile => "no_file",
            ValidationError::EmptyFilename => "empty_filename",
            ValidationError::InvalidFileType => "invalid_file_type",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserExists => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BillNotFound => StatusCode::NOT_FOUND,
            ApiError::AmountNotFound => StatusCode::BAD_REQUEST,
            ApiError::AiNotConfigured => StatusCode::BAD_REQUEST,
            ApiError::SqlRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::TesseractMissing
            | ApiError::OcrFailed(_)
            | ApiError::PdfUnsupported
            | ApiError::Db(_)
            | ApiError::Io(_)
            | ApiError::Json(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
