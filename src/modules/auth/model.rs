pub use campusdesk_models::auth::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
};
