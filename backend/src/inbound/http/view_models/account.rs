//! Login, registration and account page models.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Recipe, User};
use crate::inbound::http::form::FormData;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 5;

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn password_error(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("You must specify a password.")
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some("The password must be at least 5 characters.")
    } else {
        None
    }
}

/// `/login` form.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LoginViewModel {
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub error: Option<String>,
}

impl LoginViewModel {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            email: normalize_email(form.value("email")),
            password: form.value("password").trim().to_owned(),
            error: None,
        }
    }

    pub fn validate(&mut self) {
        self.error = if self.email.is_empty() {
            Some("Please enter an email address.".to_owned())
        } else if self.password.is_empty() {
            Some("Please enter a password.".to_owned())
        } else {
            None
        };
    }
}

/// `/register` form.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RegisterViewModel {
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub error: Option<String>,
}

impl RegisterViewModel {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            name: form.value("name").trim().to_owned(),
            email: normalize_email(form.value("email")),
            password: form.value("password").trim().to_owned(),
            error: None,
        }
    }

    pub fn validate(&mut self) {
        self.error = if self.name.is_empty() {
            Some("You must specify a name.".to_owned())
        } else if self.email.is_empty() {
            Some("You must specify an email address.".to_owned())
        } else {
            password_error(&self.password).map(str::to_owned)
        };
    }
}

/// `POST /account/password` form.
#[derive(Debug, Clone, Default)]
pub struct PasswordViewModel {
    pub password: String,
    pub error: Option<String>,
}

impl PasswordViewModel {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            password: form.value("password").trim().to_owned(),
            error: None,
        }
    }

    pub fn validate(&mut self) {
        self.error = password_error(&self.password).map(str::to_owned);
    }
}

/// `/account` page: the signed-in user and the recipes they own.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountViewModel {
    pub user: User,
    pub recipes: Vec<Recipe>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(pairs.iter().copied())
    }

    #[rstest]
    fn login_normalises_email_and_password() {
        let vm = LoginViewModel::from_form(&form(&[
            ("email", "  Ada@Example.COM "),
            ("password", " secret "),
        ]));
        assert_eq!(vm.email, "ada@example.com");
        assert_eq!(vm.password, "secret");
    }

    #[rstest]
    #[case(&[], Some("Please enter an email address."))]
    #[case(&[("email", "a@b.c")], Some("Please enter a password."))]
    #[case(&[("email", "a@b.c"), ("password", "x")], None)]
    fn login_reports_the_first_missing_field(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: Option<&str>,
    ) {
        let mut vm = LoginViewModel::from_form(&form(pairs));
        vm.validate();
        assert_eq!(vm.error.as_deref(), expected);
    }

    #[rstest]
    #[case(&[("email", "a@b.c"), ("password", "secret")], Some("You must specify a name."))]
    #[case(&[("name", "Ada"), ("password", "secret")], Some("You must specify an email address."))]
    #[case(&[("name", "Ada"), ("email", "a@b.c")], Some("You must specify a password."))]
    #[case(
        &[("name", "Ada"), ("email", "a@b.c"), ("password", " abcd ")],
        Some("The password must be at least 5 characters.")
    )]
    #[case(&[("name", "Ada"), ("email", "a@b.c"), ("password", "abcde")], None)]
    fn registration_rules_apply_in_order(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: Option<&str>,
    ) {
        let mut vm = RegisterViewModel::from_form(&form(pairs));
        vm.validate();
        assert_eq!(vm.error.as_deref(), expected);
    }

    #[rstest]
    fn password_change_shares_registration_rules() {
        let mut vm = PasswordViewModel::from_form(&form(&[("password", "1234")]));
        vm.validate();
        assert_eq!(
            vm.error.as_deref(),
            Some("The password must be at least 5 characters.")
        );
    }

    #[rstest]
    fn passwords_are_never_serialised() {
        let vm = LoginViewModel::from_form(&form(&[("email", "a@b.c"), ("password", "hunter2")]));
        let json = serde_json::to_value(&vm).expect("serialise");
        assert!(json.get("password").is_none());
    }
}
