//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! mdq login admin
//! mdq whoami
//! mdq logout
//! ```
//!
//! # Environment Variables
//!
//! - `ESTIMATOR_SESSION_FILE` - Where the signed-in identity is kept

use std::io::Write;

use md_estimator::Estimator;

use super::CliError;

/// Sign in and remember the identity.
pub fn login(estimator: &Estimator, username: &str, out: &mut impl Write) -> Result<(), CliError> {
    let user = estimator.login(username)?;
    writeln!(out, "Welcome back, {} ({})", user.name, user.role)?;
    Ok(())
}

/// Forget the identity.
pub async fn logout(estimator: &Estimator, out: &mut impl Write) -> Result<(), CliError> {
    let previous = estimator.restore_session();
    estimator.logout().await?;
    match previous {
        Some(user) => writeln!(out, "Signed out {}", user.username)?,
        None => writeln!(out, "Not signed in")?,
    }
    Ok(())
}

/// Show the signed-in user.
pub fn whoami(estimator: &Estimator, out: &mut impl Write) -> Result<(), CliError> {
    let user = super::require_user(estimator)?;
    writeln!(out, "{} ({}, {})", user.name, user.username, user.role)?;
    Ok(())
}
