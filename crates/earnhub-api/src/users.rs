// User endpoints: login, registration, profile lookup, admin listings.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::models::{
    CreateAdminRequest, LoginData, RegisterData, RegisterRequest, UserData, UserDto, UsersData,
};
use crate::session::{Session, SessionEnd};

impl ApiClient {
    /// Authenticate with email + password.
    ///
    /// On success the session context is populated with the returned token
    /// (and the profile, when the backend includes it).
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), Error> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let data: LoginData = match self.post("login", &body, Auth::Anonymous).await {
            Ok(data) => data,
            Err(Error::Api { message, .. }) => return Err(Error::Authentication { message }),
            Err(Error::SessionExpired) => {
                return Err(Error::Authentication {
                    message: "invalid email or password".into(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut session = Session::from_token(SecretString::from(data.token))?;
        if let Some(user) = data.user {
            session = session.with_profile(user);
        }
        self.session().create(session);
        debug!("login successful");
        Ok(())
    }

    /// Create an account. Logs the new user in when the backend returns a
    /// token alongside the profile.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserDto, Error> {
        let data: RegisterData = self
            .post("v1/user/register", request, Auth::Anonymous)
            .await?;

        if let Some(token) = data.token {
            let session =
                Session::from_token(SecretString::from(token))?.with_profile(data.user.clone());
            self.session().create(session);
        }
        Ok(data.user)
    }

    /// End the local session. The backend keeps no server-side session
    /// state for bearer tokens, so this never touches the network.
    pub fn logout(&self) -> bool {
        self.session().destroy(SessionEnd::LoggedOut)
    }

    /// Fetch one user's profile.
    pub async fn user_by_id(&self, user_id: &str) -> Result<UserDto, Error> {
        let data: UserData = self.get(&format!("v1/user/{user_id}/user-by-id")).await?;
        Ok(data.user)
    }

    /// Fetch the logged-in user's profile and refresh the session cache.
    pub async fn refresh_profile(&self) -> Result<UserDto, Error> {
        let user_id = self.session().user_id().ok_or(Error::NotAuthenticated)?;
        let user = self.user_by_id(&user_id).await?;
        self.session().update_profile(user.clone());
        Ok(user)
    }

    /// List users (admin).
    pub async fn list_users(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<UsersData, Error> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            params.push(("search", term.to_owned()));
        }
        self.get_with_params("v1/user/get-all-users", &params).await
    }

    /// Create an admin account (admin).
    pub async fn create_admin(&self, request: &CreateAdminRequest) -> Result<UserDto, Error> {
        let data: UserData = self
            .post("v1/user/create-admin", request, Auth::Required)
            .await?;
        Ok(data.user)
    }
}
