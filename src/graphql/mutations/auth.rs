//! GraphQL authentication mutations
//!
//! `login` needs no authentication. Its error details never include the
//! submitted password.

use super::prelude::*;

#[derive(Default)]
pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Exchange a username and the shared password for a signed token
    async fn login(&self, ctx: &Context<'_>, username: String, password: String) -> Result<Token> {
        let auth_service = ctx.data_unchecked::<Arc<AuthService>>();

        match auth_service.login(&username, &password).await {
            Ok(result) => {
                tracing::info!(
                    user_id = %result.user.id,
                    username = %result.user.username,
                    "User logged in successfully"
                );
                Ok(Token {
                    value: result.token,
                })
            }
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Login failed");
                Err(ApiError::from_auth(e, json!({ "username": username })).extend())
            }
        }
    }
}
