//! Admin login

use hadir_config::AuthConfig;
use hadir_ipc::LoginForm;
use tracing::{info, warn};

use crate::error::AppError;
use crate::export::escape_html;

/// Accept the form only if it matches one configured pair exactly
pub fn authenticate(auth: &AuthConfig, form: &LoginForm) -> Result<(), AppError> {
    if auth.accepts(&form.username, &form.password) {
        info!("Admin signed in: {}", form.username);
        Ok(())
    } else {
        warn!("Rejected sign-in for {:?}", form.username);
        Err(AppError::InvalidCredentials)
    }
}

/// Minimal sign-in page posting back to `/login`
pub fn login_page(error: Option<&str>) -> String {
    let error = error
        .map(|message| format!("<p class=\"error\">{}</p>\n", escape_html(message)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>
<html lang=\"id\">
<head><meta charset=\"utf-8\"><title>Login Admin</title></head>
<body>
<h1>Login Admin</h1>
{error}<form method=\"post\" action=\"/login\">
<label>Username <input name=\"username\" autocomplete=\"username\" required></label>
<label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\" required></label>
<button type=\"submit\">Masuk</button>
</form>
</body>
</html>
"
    )
}
